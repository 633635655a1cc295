use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::BookCondition;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub book_id: Uuid,
    /// Defaults to 1.
    pub quantity: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    /// Zero or negative removes the entry.
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartCount {
    pub cart_count: i64,
}

/// One cart entry joined with the live book.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub book_id: Uuid,
    pub title: String,
    pub author: String,
    /// Current book price.
    pub price: i64,
    /// Price captured when the book was first added.
    pub cart_price: i64,
    pub images: Option<String>,
    pub condition: BookCondition,
    pub seller_id: Uuid,
    pub quantity: i32,
    pub total_price: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total_items: i64,
    pub total_price: i64,
}
