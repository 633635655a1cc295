use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::books::{BookList, CreateBookRequest, UpdateBookRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Book,
    response::{Ack, ApiResponse},
    routes::params::BookQuery,
    services::book_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{id}",
            get(get_book).patch(update_book).delete(delete_book),
        )
}

#[utoipa::path(
    get,
    path = "/api/books",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 10"),
        ("category" = Option<Uuid>, Query, description = "Category or subcategory id"),
        ("min_price" = Option<i64>, Query, description = "Lowest price"),
        ("max_price" = Option<i64>, Query, description = "Highest price"),
        ("condition" = Option<String>, Query, description = "good, very_good, new, excellent, old"),
        ("search" = Option<String>, Query, description = "Title contains, case-insensitive"),
    ),
    responses(
        (status = 200, description = "List books, newest first", body = ApiResponse<BookList>)
    ),
    tag = "Books"
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<ApiResponse<BookList>>> {
    let resp = book_service::list_books(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/books/{id}",
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Get book", body = ApiResponse<Book>),
        (status = 404, description = "Book not found or out of stock"),
    ),
    tag = "Books"
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Book>>> {
    let resp = book_service::get_book(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book listed", body = ApiResponse<Book>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Only sellers can list books"),
    ),
    security(("bearer_auth" = [])),
    tag = "Books"
)]
pub async fn create_book(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateBookRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Book>>)> {
    let resp = book_service::create_book(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/books/{id}",
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "Book updated", body = ApiResponse<Book>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Book not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Books"
)]
pub async fn update_book(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBookRequest>,
) -> AppResult<Json<ApiResponse<Book>>> {
    let resp = book_service::update_book(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book deleted", body = ApiResponse<Ack>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Book not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Books"
)]
pub async fn delete_book(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Ack>>> {
    let resp = book_service::delete_book(&state, &user, id).await?;
    Ok(Json(resp))
}
