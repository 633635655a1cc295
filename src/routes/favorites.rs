use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::favorites::{FavoriteBookList, FavoriteCheck, FavoriteToggled, ToggleFavoriteRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::Pagination,
    services::favorite_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_favorites))
        .route("/toggle", post(toggle_favorite))
        .route("/check/{book_id}", get(check_favorite))
}

#[utoipa::path(
    get,
    path = "/api/favorites",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 10")
    ),
    responses(
        (status = 200, description = "Favorite books of the caller", body = ApiResponse<FavoriteBookList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<FavoriteBookList>>> {
    let resp = favorite_service::list_favorites(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/favorites/toggle",
    request_body = ToggleFavoriteRequest,
    responses(
        (status = 200, description = "Favorite added or removed", body = ApiResponse<FavoriteToggled>),
        (status = 404, description = "Book not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ToggleFavoriteRequest>,
) -> AppResult<Json<ApiResponse<FavoriteToggled>>> {
    let resp = favorite_service::toggle_favorite(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/favorites/check/{book_id}",
    params(
        ("book_id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Whether the book is a favorite", body = ApiResponse<FavoriteCheck>)
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn check_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(book_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<FavoriteCheck>>> {
    let resp = favorite_service::check_favorite(&state, &user, book_id).await?;
    Ok(Json(resp))
}
