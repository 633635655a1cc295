use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::reviews::{AddReviewRequest, BookReviews},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Review,
    response::ApiResponse,
    services::review_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{book_id}", get(get_reviews_by_book).post(add_review))
}

#[utoipa::path(
    post,
    path = "/api/reviews/{book_id}",
    params(
        ("book_id" = Uuid, Path, description = "Book ID")
    ),
    request_body = AddReviewRequest,
    responses(
        (status = 201, description = "Review added", body = ApiResponse<Review>),
        (status = 400, description = "Rating outside 1..=5"),
        (status = 403, description = "Seller of the book or admin"),
        (status = 404, description = "Book not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn add_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(book_id): Path<Uuid>,
    Json(payload): Json<AddReviewRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Review>>)> {
    let resp = review_service::add_review(&state, &user, book_id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/reviews/{book_id}",
    params(
        ("book_id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Reviews newest first with the average rating", body = ApiResponse<BookReviews>),
        (status = 404, description = "Book not found or no reviews yet"),
    ),
    tag = "Reviews"
)]
pub async fn get_reviews_by_book(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BookReviews>>> {
    let resp = review_service::get_reviews_by_book(&state, book_id).await?;
    Ok(Json(resp))
}
