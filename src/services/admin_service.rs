use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{books::BookList, orders::OrderList, users::UserList},
    entity::{
        books::{Column as BookCol, Entity as Books},
        cart_items::{Column as CartCol, Entity as CartItems},
        favorites::{Column as FavCol, Entity as Favorites},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{Column as OrderCol, Entity as Orders},
        reviews::{Column as ReviewCol, Entity as Reviews},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Book, Role, User},
    response::{Ack, ApiResponse, Meta},
    routes::params::{OrderListQuery, Pagination},
    services::{book_service::remove_book, order_service::list_orders_where},
    state::AppState,
};

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Users::find()
        .filter(UserCol::Role.ne(Role::Admin))
        .order_by_desc(UserCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

/// Removes a non-admin account with everything it owns. Lines the user sold
/// inside other customers' orders are removed as well.
pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Ack>> {
    ensure_admin(user)?;

    let target = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    if target.role == Role::Admin {
        return Err(AppError::Forbidden("Admin accounts cannot be deleted".into()));
    }

    let txn = state.orm.begin().await?;

    let book_ids: Vec<Uuid> = Books::find()
        .select_only()
        .column(BookCol::Id)
        .filter(BookCol::SellerId.eq(id))
        .into_tuple()
        .all(&txn)
        .await?;
    let order_ids: Vec<Uuid> = Orders::find()
        .select_only()
        .column(OrderCol::Id)
        .filter(OrderCol::CustomerId.eq(id))
        .into_tuple()
        .all(&txn)
        .await?;

    CartItems::delete_many()
        .filter(
            Condition::any()
                .add(CartCol::UserId.eq(id))
                .add(CartCol::BookId.is_in(book_ids.clone())),
        )
        .exec(&txn)
        .await?;
    Favorites::delete_many()
        .filter(
            Condition::any()
                .add(FavCol::UserId.eq(id))
                .add(FavCol::BookId.is_in(book_ids.clone())),
        )
        .exec(&txn)
        .await?;
    Reviews::delete_many()
        .filter(
            Condition::any()
                .add(ReviewCol::UserId.eq(id))
                .add(ReviewCol::BookId.is_in(book_ids.clone())),
        )
        .exec(&txn)
        .await?;
    let removed_lines = OrderItems::delete_many()
        .filter(
            Condition::any()
                .add(OrderItemCol::SellerId.eq(id))
                .add(OrderItemCol::OrderId.is_in(order_ids.clone())),
        )
        .exec(&txn)
        .await?
        .rows_affected;
    Orders::delete_many()
        .filter(OrderCol::Id.is_in(order_ids))
        .exec(&txn)
        .await?;
    Books::delete_many()
        .filter(BookCol::Id.is_in(book_ids))
        .exec(&txn)
        .await?;
    Users::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(user_id = %id, removed_lines, "user deleted by admin");
    audit::record(
        &state.orm,
        user.user_id,
        "user_delete",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(ApiResponse::ok("User deleted", Ack {}))
}

pub async fn list_books(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<BookList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Books::find()
        .filter(BookCol::Quantity.gt(0))
        .order_by_desc(BookCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Book::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Books", BookList { items }, Some(meta)))
}

pub async fn delete_book(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Ack>> {
    ensure_admin(user)?;
    Books::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Book"))?;

    let txn = state.orm.begin().await?;
    remove_book(&txn, id).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "book_delete",
        "books",
        serde_json::json!({ "book_id": id, "by_admin": true }),
    )
    .await;

    Ok(ApiResponse::ok("Book deleted", Ack {}))
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    list_orders_where(state, Condition::all(), query).await
}
