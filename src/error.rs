use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("Not enough stock for {title}. Available: {available}")]
    InsufficientStock {
        book_id: Uuid,
        title: String,
        available: i32,
    },

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{what} not found"))
    }

    /// Stable machine-readable classification sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Forbidden(_) => "forbidden",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::InvalidState(_) => "invalid_state",
            AppError::InsufficientStock { .. } => "insufficient_stock",
            AppError::OrmError(_) | AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidState(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InsufficientStock { .. } => StatusCode::CONFLICT,
            AppError::OrmError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Payload of every error envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorData {
    pub error: String,
    #[schema(value_type = String)]
    pub code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::OrmError(err) => tracing::error!(error = %err, "storage failure"),
            AppError::Internal(err) => tracing::error!(error = %err, "internal failure"),
            _ => {}
        }

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
                code: self.code(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_names_book_and_availability() {
        let err = AppError::InsufficientStock {
            book_id: Uuid::nil(),
            title: "Dune".into(),
            available: 1,
        };
        assert_eq!(err.to_string(), "Not enough stock for Dune. Available: 1");
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "insufficient_stock");
    }

    #[test]
    fn empty_cart_is_a_client_error() {
        let err = AppError::InvalidState("Cart is empty".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::not_found("Order").to_string(), "Order not found");
    }
}
