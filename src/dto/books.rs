use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Book, BookCondition};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookRequest {
    pub title: String,
    pub description: Option<String>,
    pub author: String,
    pub published_year: i32,
    pub price: i64,
    pub quantity: i32,
    pub images: Option<String>,
    pub condition: Option<BookCondition>,
    pub category_id: Uuid,
    pub sub_category_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub published_year: Option<i32>,
    pub price: Option<i64>,
    pub quantity: Option<i32>,
    pub images: Option<String>,
    pub condition: Option<BookCondition>,
    pub category_id: Option<Uuid>,
    pub sub_category_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct BookList {
    #[schema(value_type = Vec<Book>)]
    pub items: Vec<Book>,
}
