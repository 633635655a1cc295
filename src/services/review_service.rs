use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::reviews::{AddReviewRequest, BookReviews, ReviewWithAuthor},
    entity::{
        books::Entity as Books,
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Review, Role},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn add_review(
    state: &AppState,
    user: &AuthUser,
    book_id: Uuid,
    payload: AddReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::Validation("rating must be between 1 and 5".into()));
    }

    let book = Books::find_by_id(book_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Book"))?;
    let reviewer = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    if !may_review(reviewer.id, reviewer.role, book.seller_id) {
        return Err(AppError::Forbidden("You cannot review your own book".into()));
    }

    let txn = state.orm.begin().await?;
    let review = ReviewActive {
        id: Set(Uuid::new_v4()),
        book_id: Set(book.id),
        user_id: Set(reviewer.id),
        rating: Set(payload.rating),
        comment: Set(payload.comment),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;

    let mut reviewer: UserActive = reviewer.into();
    reviewer.last_review_id = Set(Some(review.id));
    reviewer.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        user.user_id,
        "review_create",
        "reviews",
        serde_json::json!({ "book_id": book.id, "review_id": review.id }),
    )
    .await;

    Ok(ApiResponse::ok("Review added successfully", review.into()))
}

pub async fn get_reviews_by_book(
    state: &AppState,
    book_id: Uuid,
) -> AppResult<ApiResponse<BookReviews>> {
    Books::find_by_id(book_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Book"))?;

    let reviews = Reviews::find()
        .filter(ReviewCol::BookId.eq(book_id))
        .order_by_desc(ReviewCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let ratings: Vec<i32> = reviews.iter().map(|r| r.rating).collect();
    let average = average_rating(&ratings)
        .ok_or_else(|| AppError::NotFound("No reviews found for this book".into()))?;

    let author_ids: Vec<Uuid> = reviews.iter().map(|r| r.user_id).collect();
    let usernames: HashMap<Uuid, String> = Users::find()
        .filter(UserCol::Id.is_in(author_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    let items: Vec<ReviewWithAuthor> = reviews
        .into_iter()
        .map(|r| ReviewWithAuthor {
            username: usernames.get(&r.user_id).cloned(),
            id: r.id,
            rating: r.rating,
            comment: r.comment,
            user_id: r.user_id,
            created_at: r.created_at.with_timezone(&Utc),
        })
        .collect();

    let meta = Meta::count(items.len());
    Ok(ApiResponse::success(
        "OK",
        BookReviews {
            items,
            average_rating: format_average_rating(average),
        },
        Some(meta),
    ))
}

/// Sellers may not review their own books and admins may not review at all.
pub fn may_review(reviewer_id: Uuid, reviewer_role: Role, seller_id: Uuid) -> bool {
    reviewer_id != seller_id && reviewer_role != Role::Admin
}

pub fn average_rating(ratings: &[i32]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    Some(sum as f64 / ratings.len() as f64)
}

/// Renders an average with one decimal when its tenths digit is non-zero and
/// with none otherwise, dropping a trailing `.0`.
pub fn format_average_rating(average: f64) -> String {
    let tenths = ((average * 10.0).floor() as i64).rem_euclid(10);
    let digits = if tenths > 0 { 1 } else { 0 };
    let fixed = to_fixed(average, digits);
    match fixed.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => fixed,
    }
}

/// Rounds the exact binary value to `digits` decimals, ties away from zero.
fn to_fixed(value: f64, digits: usize) -> String {
    // Formatting is exact at this width for the magnitudes ratings reach.
    let exact = format!("{value:.60}");
    let is_tie = exact.split_once('.').is_some_and(|(_, fraction)| {
        let rest = &fraction[digits..];
        rest.starts_with('5') && rest[1..].bytes().all(|b| b == b'0')
    });
    if is_tie {
        let scale = 10f64.powi(digits as i32);
        let up = ((value * scale).floor() + 1.0) / scale;
        format!("{up:.digits$}")
    } else {
        format!("{value:.digits$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_keep_a_decimal_only_when_tenths_are_set() {
        assert_eq!(format_average_rating(4.5), "4.5");
        assert_eq!(format_average_rating(4.0), "4");
        assert_eq!(format_average_rating(4.05), "4");
        assert_eq!(format_average_rating(4.25), "4.3");
        assert_eq!(format_average_rating(10.0 / 3.0), "3.3");
    }

    #[test]
    fn rounds_the_stored_value_not_a_scaled_copy() {
        // 23 / 20 is stored as 1.14999..., 2.15 as 2.14999...
        assert_eq!(format_average_rating(23.0 / 20.0), "1.1");
        assert_eq!(format_average_rating(2.15), "2.1");
    }

    #[test]
    fn exact_ties_round_up() {
        assert_eq!(format_average_rating(4.25), "4.3");
        assert_eq!(format_average_rating(4.75), "4.8");
        assert_eq!(format_average_rating(1.25), "1.3");
    }

    #[test]
    fn rounding_up_to_a_whole_number_drops_the_decimal() {
        assert_eq!(format_average_rating(4.96), "5");
    }

    #[test]
    fn average_of_ratings() {
        assert_eq!(average_rating(&[4, 5]), Some(4.5));
        assert_eq!(average_rating(&[]), None);
    }

    #[test]
    fn sellers_and_admins_cannot_review() {
        let seller = Uuid::new_v4();
        let buyer = Uuid::new_v4();
        assert!(!may_review(seller, Role::Seller, seller));
        assert!(!may_review(seller, Role::User, seller));
        assert!(!may_review(buyer, Role::Admin, seller));
        assert!(may_review(buyer, Role::User, seller));
        assert!(may_review(buyer, Role::Seller, seller));
    }
}
