use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::cart::{AddToCartRequest, CartCount, CartLine, CartView, UpdateCartItemRequest},
    entity::{
        books::{Column as BookCol, Entity as Books, Model as BookModel},
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Role, add_amount, line_total},
    response::{Ack, ApiResponse, Meta},
    state::AppState,
};

/// Adds `quantity` copies (default 1) of a book to the caller's cart.
///
/// A repeat add grows the existing entry and keeps the price captured on the
/// first add. Returns the number of copies now in the cart.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartCount>> {
    let quantity = payload.quantity.unwrap_or(1);
    if quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let book = Books::find_by_id(payload.book_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not available".into()))?;

    let buyer = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    if buyer.id == book.seller_id {
        return Err(AppError::Forbidden(
            "You cannot add your own book to the cart".into(),
        ));
    }
    if buyer.role == Role::Admin {
        return Err(AppError::Forbidden(
            "Admins cannot add books to the cart".into(),
        ));
    }

    let existing = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::BookId.eq(book.id))
        .one(&state.orm)
        .await?;

    match existing {
        Some(entry) => {
            CartItems::update_many()
                .col_expr(CartCol::Quantity, Expr::col(CartCol::Quantity).add(quantity))
                .filter(CartCol::Id.eq(entry.id))
                .exec(&state.orm)
                .await?;
        }
        None => {
            CartActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                book_id: Set(book.id),
                quantity: Set(quantity),
                price: Set(book.price),
                seller_id: Set(book.seller_id),
                created_at: Set(Utc::now().into()),
            }
            .insert(&state.orm)
            .await?;
        }
    }

    let cart_count = cart_count(state, user.user_id).await?;
    tracing::debug!(user_id = %user.user_id, book_id = %book.id, quantity, cart_count, "added to cart");
    audit::record(
        &state.orm,
        user.user_id,
        "cart_update",
        "cart_items",
        serde_json::json!({ "book_id": book.id, "quantity": quantity }),
    )
    .await;

    Ok(ApiResponse::ok("Added to cart", CartCount { cart_count }))
}

/// Overwrites the quantity of an entry; zero or less removes it.
///
/// Stock is not consulted here, only at checkout.
pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    book_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<Ack>> {
    let entry = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::BookId.eq(book_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found in cart".into()))?;

    if payload.quantity <= 0 {
        CartItems::delete_by_id(entry.id).exec(&state.orm).await?;
    } else {
        let mut active: CartActive = entry.into();
        active.quantity = Set(payload.quantity);
        active.update(&state.orm).await?;
    }

    tracing::debug!(user_id = %user.user_id, %book_id, quantity = payload.quantity, "cart entry updated");
    audit::record(
        &state.orm,
        user.user_id,
        "cart_update",
        "cart_items",
        serde_json::json!({ "book_id": book_id, "quantity": payload.quantity }),
    )
    .await;

    Ok(ApiResponse::ok("Cart updated", Ack {}))
}

/// Drops the entry for `book_id`; a missing entry is not an error.
pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    book_id: Uuid,
) -> AppResult<ApiResponse<Ack>> {
    let result = CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::BookId.eq(book_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected > 0 {
        audit::record(
            &state.orm,
            user.user_id,
            "cart_remove",
            "cart_items",
            serde_json::json!({ "book_id": book_id }),
        )
        .await;
    }

    Ok(ApiResponse::ok("Removed from cart", Ack {}))
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let entries = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let book_ids: Vec<Uuid> = entries.iter().map(|e| e.book_id).collect();
    let books: HashMap<Uuid, BookModel> = if book_ids.is_empty() {
        HashMap::new()
    } else {
        Books::find()
            .filter(BookCol::Id.is_in(book_ids))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect()
    };

    let total_items = entries.iter().map(|e| i64::from(e.quantity)).sum();
    let mut items = Vec::with_capacity(entries.len());
    let mut total_price: i64 = 0;
    for entry in entries {
        let Some(book) = books.get(&entry.book_id) else {
            tracing::warn!(
                user_id = %user.user_id,
                book_id = %entry.book_id,
                "cart entry points at a missing book"
            );
            continue;
        };
        let line_price = line_total(book.price, entry.quantity)?;
        total_price = add_amount(total_price, line_price)?;
        items.push(CartLine {
            book_id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            price: book.price,
            cart_price: entry.price,
            images: book.images.clone(),
            condition: book.condition,
            seller_id: book.seller_id,
            quantity: entry.quantity,
            total_price: line_price,
        });
    }

    let meta = Meta::count(items.len());

    Ok(ApiResponse::success(
        "OK",
        CartView {
            items,
            total_items,
            total_price,
        },
        Some(meta),
    ))
}

async fn cart_count(state: &AppState, user_id: Uuid) -> AppResult<i64> {
    let entries = CartItems::find()
        .filter(CartCol::UserId.eq(user_id))
        .all(&state.orm)
        .await?;
    Ok(entries.iter().map(|e| i64::from(e.quantity)).sum())
}
