use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub use crate::entity::enums::{BookCondition, OrderStatus, PaymentMethod, PaymentStatus, Role};

use crate::error::{AppError, AppResult};

use crate::entity::{
    books::Model as BookModel, categories::Model as CategoryModel,
    order_items::Model as OrderItemModel, orders::Model as OrderModel,
    reviews::Model as ReviewModel, users::Model as UserModel,
};

/// Flat shipping fee added to every order, in currency units.
pub const SHIPPING_COST: i64 = 30;

/// Highest listing price a book may carry, in currency units.
pub const MAX_PRICE: i64 = 1_000_000_000;

/// `price * quantity`, rejecting amounts that do not fit in an `i64`.
pub fn line_total(price: i64, quantity: i32) -> AppResult<i64> {
    price
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| AppError::Validation("amount is too large".into()))
}

pub fn add_amount(total: i64, amount: i64) -> AppResult<i64> {
    total
        .checked_add(amount)
        .ok_or_else(|| AppError::Validation("amount is too large".into()))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub last_review_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            phone: model.phone,
            role: model.role,
            last_review_id: model.last_review_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Public contact card of a buyer or seller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub phone: String,
}

impl From<&UserModel> for UserSummary {
    fn from(model: &UserModel) -> Self {
        Self {
            id: model.id,
            username: model.username.clone(),
            phone: model.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub author: String,
    pub published_year: i32,
    pub price: i64,
    pub quantity: i32,
    pub images: Option<String>,
    pub condition: BookCondition,
    pub category_id: Uuid,
    pub sub_category_id: Option<Uuid>,
    pub is_sold_out: bool,
    pub sold_count: i32,
    pub seller_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BookModel> for Book {
    fn from(model: BookModel) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            author: model.author,
            published_year: model.published_year,
            price: model.price,
            quantity: model.quantity,
            images: model.images,
            condition: model.condition,
            category_id: model.category_id,
            sub_category_id: model.sub_category_id,
            is_sold_out: model.is_sold_out,
            sold_count: model.sold_count,
            seller_id: model.seller_id,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookSummary {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub price: i64,
    pub images: Option<String>,
}

impl From<&BookModel> for BookSummary {
    fn from(model: &BookModel) -> Self {
        Self {
            id: model.id,
            title: model.title.clone(),
            author: model.author.clone(),
            price: model.price,
            images: model.images.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<CategoryModel> for Category {
    fn from(model: CategoryModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            parent_id: model.parent_id,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShippingAddress {
    pub fullname: String,
    pub phone: String,
    pub address: String,
    pub city: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub total_amount: i64,
    pub shipping_cost: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub shipping_address: ShippingAddress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderModel> for Order {
    fn from(model: OrderModel) -> Self {
        Self {
            id: model.id,
            order_number: model.order_number,
            customer_id: model.customer_id,
            total_amount: model.total_amount,
            shipping_cost: model.shipping_cost,
            status: model.status,
            payment_status: model.payment_status,
            payment_method: model.payment_method,
            shipping_address: ShippingAddress {
                fullname: model.shipping_fullname,
                phone: model.shipping_phone,
                address: model.shipping_address,
                city: model.shipping_city,
            },
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub book_id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub price: i64,
    pub quantity: i32,
    pub subtotal: i64,
}

impl From<OrderItemModel> for OrderItem {
    fn from(model: OrderItemModel) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            book_id: model.book_id,
            seller_id: model.seller_id,
            title: model.title,
            price: model.price,
            quantity: model.quantity,
            subtotal: model.subtotal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewModel> for Review {
    fn from(model: ReviewModel) -> Self {
        Self {
            id: model.id,
            book_id: model.book_id,
            user_id: model.user_id,
            rating: model.rating,
            comment: model.comment,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
