use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{BookSummary, Order, OrderItem, UserSummary};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ShippingAddressInput {
    pub fullname: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub shipping_address: Option<ShippingAddressInput>,
    /// One of `cash`, `card`, `online`, `wallet`.
    pub payment_method: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

/// Order line with its book and seller resolved. `book` is `None` once the book
/// has left the catalog.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineDetail {
    #[serde(flatten)]
    pub item: OrderItem,
    pub book: Option<BookSummary>,
    pub seller: Option<UserSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetail {
    pub order: Order,
    pub customer: Option<UserSummary>,
    pub items: Vec<OrderLineDetail>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedOrder {
    pub order_number: String,
    pub order: OrderDetail,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderDetail>,
}
