use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::favorites::{FavoriteBookList, FavoriteCheck, FavoriteToggled, ToggleFavoriteRequest},
    entity::{
        books::{Entity as Books, Relation as BookRelation},
        favorites::{ActiveModel as FavoriteActive, Column as FavCol, Entity as Favorites},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Book,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_favorites(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<FavoriteBookList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Books::find()
        .join(JoinType::InnerJoin, BookRelation::Favorites.def())
        .filter(FavCol::UserId.eq(user.user_id))
        .order_by_desc(FavCol::CreatedAt);

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
    Ok(ApiResponse::success("OK", FavoriteBookList { items }, Some(meta)))
}

/// Adds the book to favorites, or removes it when it is already there.
pub async fn toggle_favorite(
    state: &AppState,
    user: &AuthUser,
    payload: ToggleFavoriteRequest,
) -> AppResult<ApiResponse<FavoriteToggled>> {
    Books::find_by_id(payload.book_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Book"))?;

    let existing = Favorites::find()
        .filter(FavCol::UserId.eq(user.user_id))
        .filter(FavCol::BookId.eq(payload.book_id))
        .one(&state.orm)
        .await?;

    let (is_favorite, action, message) = match existing {
        Some(fav) => {
            Favorites::delete_by_id(fav.id).exec(&state.orm).await?;
            (false, "favorite_remove", "Removed from favorites")
        }
        None => {
            FavoriteActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                book_id: Set(payload.book_id),
                created_at: Set(Utc::now().into()),
            }
            .insert(&state.orm)
            .await?;
            (true, "favorite_add", "Added to favorites")
        }
    };

    let favorites_count = Favorites::find()
        .filter(FavCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await? as i64;

    audit::record(
        &state.orm,
        user.user_id,
        action,
        "favorites",
        serde_json::json!({ "book_id": payload.book_id }),
    )
    .await;

    Ok(ApiResponse::ok(
        message,
        FavoriteToggled {
            is_favorite,
            favorites_count,
        },
    ))
}

pub async fn check_favorite(
    state: &AppState,
    user: &AuthUser,
    book_id: Uuid,
) -> AppResult<ApiResponse<FavoriteCheck>> {
    let count = Favorites::find()
        .filter(FavCol::UserId.eq(user.user_id))
        .filter(FavCol::BookId.eq(book_id))
        .count(&state.orm)
        .await?;
    Ok(ApiResponse::ok(
        "OK",
        FavoriteCheck {
            is_favorite: count > 0,
        },
    ))
}
