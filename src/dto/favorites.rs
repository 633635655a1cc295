use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Book;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ToggleFavoriteRequest {
    pub book_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoriteToggled {
    pub is_favorite: bool,
    pub favorites_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoriteCheck {
    pub is_favorite: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct FavoriteBookList {
    #[schema(value_type = Vec<Book>)]
    pub items: Vec<Book>,
}
