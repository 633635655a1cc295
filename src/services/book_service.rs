use chrono::{Datelike, Utc};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::books::{BookList, CreateBookRequest, UpdateBookRequest},
    entity::{
        books::{ActiveModel, Column, Entity as Books, Model as BookModel},
        cart_items::{Column as CartCol, Entity as CartItems},
        categories::Entity as Categories,
        favorites::{Column as FavCol, Entity as Favorites},
        reviews::{Column as ReviewCol, Entity as Reviews},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_seller},
    models::{Book, BookCondition, MAX_PRICE},
    response::{Ack, ApiResponse, Meta},
    routes::params::BookQuery,
    state::AppState,
};

const MAX_TITLE_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 2000;
const MIN_PUBLISHED_YEAR: i32 = 1000;

pub async fn list_books(state: &AppState, query: BookQuery) -> AppResult<ApiResponse<BookList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(category) = query.category {
        condition = condition.add(
            Condition::any()
                .add(Column::CategoryId.eq(category))
                .add(Column::SubCategoryId.eq(category)),
        );
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }
    if let Some(book_condition) = query.condition {
        condition = condition.add(Column::Condition.eq(book_condition));
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        condition = condition.add(Expr::expr(Func::lower(Expr::col(Column::Title))).like(pattern));
    }

    let finder = Books::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt);

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

/// Out-of-stock books are reported as missing.
pub async fn get_book(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Book>> {
    let book = Books::find_by_id(id)
        .one(&state.orm)
        .await?
        .filter(|b| b.quantity > 0)
        .ok_or_else(|| AppError::NotFound("Book not found or unavailable".into()))?;
    Ok(ApiResponse::success("Book", book.into(), None))
}

pub async fn create_book(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBookRequest,
) -> AppResult<ApiResponse<Book>> {
    ensure_seller(user)?;
    validate_title(&payload.title)?;
    validate_description(payload.description.as_deref())?;
    validate_author(&payload.author)?;
    validate_published_year(payload.published_year)?;
    validate_price(payload.price)?;
    validate_quantity(payload.quantity)?;
    ensure_category(state, payload.category_id).await?;
    if let Some(sub) = payload.sub_category_id {
        ensure_category(state, sub).await?;
    }

    let now = Utc::now();
    let book = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        author: Set(payload.author.trim().to_string()),
        published_year: Set(payload.published_year),
        price: Set(payload.price),
        quantity: Set(payload.quantity),
        images: Set(payload.images),
        condition: Set(payload.condition.unwrap_or(BookCondition::Good)),
        category_id: Set(payload.category_id),
        sub_category_id: Set(payload.sub_category_id),
        is_sold_out: Set(payload.quantity == 0),
        sold_count: Set(0),
        seller_id: Set(user.user_id),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(book_id = %book.id, seller_id = %user.user_id, "book listed");
    audit::record(
        &state.orm,
        user.user_id,
        "book_create",
        "books",
        serde_json::json!({ "book_id": book.id }),
    )
    .await;

    Ok(ApiResponse::ok("Book added successfully", book.into()))
}

/// Seller edit of their own listing. A quantity change re-derives `is_sold_out`.
pub async fn update_book(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBookRequest,
) -> AppResult<ApiResponse<Book>> {
    ensure_seller(user)?;
    let existing = owned_book(state, user, id).await?;

    let mut active: ActiveModel = existing.into();
    if let Some(title) = payload.title {
        validate_title(&title)?;
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        validate_description(Some(&description))?;
        active.description = Set(Some(description));
    }
    if let Some(author) = payload.author {
        validate_author(&author)?;
        active.author = Set(author.trim().to_string());
    }
    if let Some(year) = payload.published_year {
        validate_published_year(year)?;
        active.published_year = Set(year);
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
        active.price = Set(price);
    }
    if let Some(quantity) = payload.quantity {
        validate_quantity(quantity)?;
        active.quantity = Set(quantity);
        active.is_sold_out = Set(quantity == 0);
    }
    if let Some(images) = payload.images {
        active.images = Set(Some(images));
    }
    if let Some(book_condition) = payload.condition {
        active.condition = Set(book_condition);
    }
    if let Some(category_id) = payload.category_id {
        ensure_category(state, category_id).await?;
        active.category_id = Set(category_id);
    }
    if let Some(sub_category_id) = payload.sub_category_id {
        ensure_category(state, sub_category_id).await?;
        active.sub_category_id = Set(Some(sub_category_id));
    }
    active.updated_at = Set(Utc::now().into());

    let book = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        user.user_id,
        "book_update",
        "books",
        serde_json::json!({ "book_id": book.id }),
    )
    .await;

    Ok(ApiResponse::ok("Book updated successfully", book.into()))
}

pub async fn delete_book(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Ack>> {
    ensure_seller(user)?;
    let book = owned_book(state, user, id).await?;
    let txn = state.orm.begin().await?;
    remove_book(&txn, book.id).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "book_delete",
        "books",
        serde_json::json!({ "book_id": id }),
    )
    .await;

    Ok(ApiResponse::ok("Book deleted successfully", Ack {}))
}

/// Deletes a book with its cart entries, favorites and reviews. Order lines
/// are left alone; they carry their own title snapshot.
pub(crate) async fn remove_book<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<()> {
    CartItems::delete_many()
        .filter(CartCol::BookId.eq(id))
        .exec(conn)
        .await?;
    Favorites::delete_many()
        .filter(FavCol::BookId.eq(id))
        .exec(conn)
        .await?;
    Reviews::delete_many()
        .filter(ReviewCol::BookId.eq(id))
        .exec(conn)
        .await?;
    Books::delete_by_id(id).exec(conn).await?;
    Ok(())
}

async fn owned_book(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<BookModel> {
    let book = Books::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Book"))?;
    if book.seller_id != user.user_id {
        return Err(AppError::Forbidden("You can only manage your own books".into()));
    }
    Ok(book)
}

async fn ensure_category(state: &AppState, id: Uuid) -> AppResult<()> {
    Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::Validation(format!("Category {id} does not exist")))
}

fn validate_title(title: &str) -> AppResult<()> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::Validation(format!(
            "title must be 1 to {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> AppResult<()> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(AppError::Validation(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        ))),
        _ => Ok(()),
    }
}

fn validate_author(author: &str) -> AppResult<()> {
    if author.trim().is_empty() {
        return Err(AppError::Validation("author is required".into()));
    }
    Ok(())
}

fn validate_published_year(year: i32) -> AppResult<()> {
    let max = Utc::now().year() + 5;
    if !(MIN_PUBLISHED_YEAR..=max).contains(&year) {
        return Err(AppError::Validation(format!(
            "published_year must be between {MIN_PUBLISHED_YEAR} and {max}"
        )));
    }
    Ok(())
}

fn validate_price(price: i64) -> AppResult<()> {
    if price <= 0 {
        return Err(AppError::Validation("price must be greater than 0".into()));
    }
    if price > MAX_PRICE {
        return Err(AppError::Validation(format!("price cannot exceed {MAX_PRICE}")));
    }
    Ok(())
}

fn validate_quantity(quantity: i32) -> AppResult<()> {
    if quantity < 0 {
        return Err(AppError::Validation("quantity cannot be negative".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_price_and_negative_stock() {
        assert!(validate_price(0).is_err());
        assert!(validate_price(1).is_ok());
        assert!(validate_price(MAX_PRICE).is_ok());
        assert!(validate_price(MAX_PRICE + 1).is_err());
        assert!(validate_price(i64::MAX / 2 + 1).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(0).is_ok());
    }

    #[test]
    fn published_year_window() {
        assert!(validate_published_year(999).is_err());
        assert!(validate_published_year(1999).is_ok());
        assert!(validate_published_year(Utc::now().year() + 6).is_err());
    }

    #[test]
    fn title_length_is_bounded() {
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"a".repeat(101)).is_err());
        assert!(validate_title("Dune").is_ok());
    }
}
