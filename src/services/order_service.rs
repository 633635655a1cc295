use std::collections::HashMap;

use chrono::Utc;
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{
        CreateOrderRequest, CreatedOrder, OrderDetail, OrderLineDetail, OrderList,
        ShippingAddressInput,
    },
    entity::{
        books::{Column as BookCol, Entity as Books, Model as BookModel},
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        users::{Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_seller},
    models::{
        BookSummary, OrderStatus, PaymentMethod, PaymentStatus, SHIPPING_COST, ShippingAddress,
        UserSummary, add_amount, line_total,
    },
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

/// How many fresh order numbers are tried before checkout gives up.
pub const MAX_ORDER_NUMBER_ATTEMPTS: usize = 5;

/// A cart entry after its stock has been taken, priced at the live book price.
struct SettledLine {
    book_id: Uuid,
    seller_id: Uuid,
    title: String,
    price: i64,
    quantity: i32,
    subtotal: i64,
}

/// Converts the caller's cart into an order.
///
/// Every line is re-priced from the live catalog and its stock taken with a
/// conditional decrement inside one transaction. Any failure drops the
/// transaction, so no decrement from an earlier line survives a rejected order.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<CreatedOrder>> {
    let shipping = validate_shipping_address(payload.shipping_address.as_ref())?;
    let payment_method = parse_payment_method(payload.payment_method.as_deref())?;

    let txn = state.orm.begin().await?;

    let cart = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .all(&txn)
        .await?;
    if cart.is_empty() {
        return Err(AppError::InvalidState("Cart is empty".into()));
    }

    Users::find_by_id(user.user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let mut lines = Vec::with_capacity(cart.len());
    let mut items_total: i64 = 0;
    for entry in &cart {
        let book = Books::find_by_id(entry.book_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found in cart".into()))?;

        let subtotal = line_total(book.price, entry.quantity)?;
        items_total = add_amount(items_total, subtotal)?;

        take_stock(&txn, &book, entry.quantity).await?;
        lines.push(SettledLine {
            book_id: book.id,
            seller_id: book.seller_id,
            title: book.title,
            price: book.price,
            quantity: entry.quantity,
            subtotal,
        });
    }

    let total_amount = add_amount(items_total, SHIPPING_COST)?;
    let order_number = allocate_order_number(&txn).await?;
    let now = Utc::now();

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        order_number: Set(order_number),
        customer_id: Set(user.user_id),
        total_amount: Set(total_amount),
        shipping_cost: Set(SHIPPING_COST),
        status: Set(OrderStatus::Pending),
        payment_status: Set(PaymentStatus::Pending),
        payment_method: Set(payment_method),
        shipping_fullname: Set(shipping.fullname),
        shipping_phone: Set(shipping.phone),
        shipping_address: Set(shipping.address),
        shipping_city: Set(shipping.city),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    for line in lines {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            book_id: Set(line.book_id),
            seller_id: Set(line.seller_id),
            title: Set(line.title),
            price: Set(line.price),
            quantity: Set(line.quantity),
            subtotal: Set(line.subtotal),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
    }

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        total_amount = order.total_amount,
        lines = cart.len(),
        "order created"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "order_number": order.order_number }),
    )
    .await;

    let order_number = order.order_number.clone();
    let detail = load_order_details(&state.orm, vec![order])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("Order"))?;

    Ok(ApiResponse::ok(
        "Order created successfully",
        CreatedOrder {
            order_number,
            order: detail,
        },
    ))
}

/// Atomically takes `quantity` copies of `book` out of stock.
///
/// The check and the decrement are one conditional UPDATE, so two concurrent
/// checkouts can never drive the quantity below zero.
async fn take_stock(txn: &DatabaseTransaction, book: &BookModel, quantity: i32) -> AppResult<()> {
    let now = Utc::now().fixed_offset();
    let result = Books::update_many()
        .col_expr(BookCol::Quantity, Expr::col(BookCol::Quantity).sub(quantity))
        .col_expr(BookCol::IsSoldOut, Expr::col(BookCol::Quantity).eq(quantity))
        .col_expr(BookCol::SoldCount, Expr::col(BookCol::SoldCount).add(quantity))
        .col_expr(BookCol::UpdatedAt, Expr::value(now))
        .filter(BookCol::Id.eq(book.id))
        .filter(BookCol::Quantity.gte(quantity))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        let available = Books::find_by_id(book.id)
            .one(txn)
            .await?
            .map(|b| b.quantity)
            .unwrap_or(0);
        tracing::warn!(
            book_id = %book.id,
            requested = quantity,
            available,
            "checkout rejected: insufficient stock"
        );
        return Err(AppError::InsufficientStock {
            book_id: book.id,
            title: book.title.clone(),
            available,
        });
    }

    Ok(())
}

async fn allocate_order_number(txn: &DatabaseTransaction) -> AppResult<String> {
    for _ in 0..MAX_ORDER_NUMBER_ATTEMPTS {
        let candidate =
            generate_order_number(Utc::now().timestamp_millis(), &mut rand::thread_rng());
        let taken = Orders::find()
            .filter(OrderCol::OrderNumber.eq(candidate.as_str()))
            .count(txn)
            .await?;
        if taken == 0 {
            return Ok(candidate);
        }
        tracing::debug!(order_number = %candidate, "order number collision, retrying");
    }
    Err(AppError::Internal(anyhow::anyhow!(
        "could not allocate a unique order number"
    )))
}

/// `ORD-<last 8 digits of the millisecond clock>-<3 random digits>`.
pub fn generate_order_number<R: Rng>(now_millis: i64, rng: &mut R) -> String {
    let millis = now_millis.to_string();
    let tail = &millis[millis.len().saturating_sub(8)..];
    format!("ORD-{tail}-{:03}", rng.gen_range(0..1000))
}

pub fn validate_shipping_address(
    input: Option<&ShippingAddressInput>,
) -> AppResult<ShippingAddress> {
    let invalid = || AppError::Validation("Invalid shipping address".into());
    let input = input.ok_or_else(invalid)?;
    let required = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(invalid)
    };

    Ok(ShippingAddress {
        fullname: required(&input.fullname)?,
        phone: required(&input.phone)?,
        address: required(&input.address)?,
        city: required(&input.city)?,
    })
}

pub fn parse_payment_method(raw: Option<&str>) -> AppResult<PaymentMethod> {
    let raw = raw
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation("Payment method is required".into()))?;
    raw.parse()
        .map_err(|_| AppError::Validation(format!("Invalid payment method: {raw}")))
}

pub fn parse_order_status(raw: &str) -> AppResult<OrderStatus> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("Invalid order status: {raw}")))
}

pub async fn get_my_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = Condition::all().add(OrderCol::CustomerId.eq(user.user_id));
    list_orders_where(state, condition, query).await
}

/// Orders that contain at least one line sold by the caller.
pub async fn get_my_sales(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_seller(user)?;
    let order_ids: Vec<Uuid> = OrderItems::find()
        .select_only()
        .column(OrderItemCol::OrderId)
        .filter(OrderItemCol::SellerId.eq(user.user_id))
        .distinct()
        .into_tuple()
        .all(&state.orm)
        .await?;

    let condition = Condition::all().add(OrderCol::Id.is_in(order_ids));
    list_orders_where(state, condition, query).await
}

pub(crate) async fn list_orders_where(
    state: &AppState,
    mut condition: Condition,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(parse_order_status(status)?));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = load_order_details(&state.orm, orders).await?;
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Visible to the customer, to any seller with a line in the order, and to admins.
pub async fn get_order_by_id(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    let detail = load_order_details(&state.orm, vec![order])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("Order"))?;

    let is_customer = detail.order.customer_id == user.user_id;
    let is_seller = detail
        .items
        .iter()
        .any(|line| line.item.seller_id == user.user_id);
    if !(is_customer || is_seller || user.is_admin()) {
        return Err(AppError::Forbidden("You cannot view this order".into()));
    }

    Ok(ApiResponse::ok("OK", detail))
}

/// Resolves lines, books, sellers and customers for a batch of orders, keeping
/// the order of `orders`.
pub(crate) async fn load_order_details<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<OrderDetail>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?;

    let book_ids: Vec<Uuid> = items.iter().map(|i| i.book_id).collect();
    let mut user_ids: Vec<Uuid> = items
        .iter()
        .map(|i| i.seller_id)
        .chain(orders.iter().map(|o| o.customer_id))
        .collect();
    user_ids.sort();
    user_ids.dedup();

    let books: HashMap<Uuid, BookModel> = Books::find()
        .filter(BookCol::Id.is_in(book_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|b| (b.id, b))
        .collect();
    let users: HashMap<Uuid, UserModel> = Users::find()
        .filter(UserCol::Id.is_in(user_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let mut lines_by_order: HashMap<Uuid, Vec<OrderLineDetail>> = HashMap::new();
    for item in items {
        let line = OrderLineDetail {
            book: books.get(&item.book_id).map(BookSummary::from),
            seller: users.get(&item.seller_id).map(UserSummary::from),
            item: item.into(),
        };
        lines_by_order
            .entry(line.item.order_id)
            .or_default()
            .push(line);
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderDetail {
            customer: users.get(&order.customer_id).map(UserSummary::from),
            items: lines_by_order.remove(&order.id).unwrap_or_default(),
            order: order.into(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn address() -> ShippingAddressInput {
        ShippingAddressInput {
            fullname: Some("Mona Adel".into()),
            phone: Some("01012345678".into()),
            address: Some("12 Nile St".into()),
            city: Some("Cairo".into()),
        }
    }

    #[test]
    fn order_number_uses_last_eight_clock_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        let number = generate_order_number(1_718_000_123_456, &mut rng);
        assert!(number.starts_with("ORD-00123456-"), "{number}");
        let suffix = &number["ORD-00123456-".len()..];
        assert_eq!(suffix.len(), 3);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn shipping_address_requires_every_field() {
        let ok = validate_shipping_address(Some(&address())).expect("valid address");
        assert_eq!(ok.city, "Cairo");

        let mut missing_city = address();
        missing_city.city = Some("   ".into());
        assert!(matches!(
            validate_shipping_address(Some(&missing_city)),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            validate_shipping_address(None),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn payment_method_must_be_present_and_known() {
        assert_eq!(parse_payment_method(Some("card")).ok(), Some(PaymentMethod::Card));
        assert!(matches!(parse_payment_method(None), Err(AppError::Validation(_))));
        assert!(matches!(
            parse_payment_method(Some("cheque")),
            Err(AppError::Validation(_))
        ));
    }
}
