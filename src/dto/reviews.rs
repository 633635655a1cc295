use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddReviewRequest {
    /// Whole stars, 1 to 5.
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewWithAuthor {
    pub id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub user_id: Uuid,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookReviews {
    pub items: Vec<ReviewWithAuthor>,
    /// Mean rating, one decimal only when the tenths digit is non-zero ("4.5", "4").
    pub average_rating: String,
}
