use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod books;
pub mod cart;
pub mod categories;
pub mod doc;
pub mod favorites;
pub mod health;
pub mod orders;
pub mod params;
pub mod reviews;
pub mod users;

// State is bound once at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/books", books::router())
        .nest("/categories", categories::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/reviews", reviews::router())
        .nest("/favorites", favorites::router())
        .nest("/admin", admin::router())
}
