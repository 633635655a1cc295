mod common;

use book_market_api::{
    dto::reviews::AddReviewRequest,
    entity::users::Entity as Users,
    error::AppError,
    models::Role,
    services::review_service,
};
use common::{create_book, create_category, create_user, setup_state};
use sea_orm::EntityTrait;

fn rating(value: i32) -> AddReviewRequest {
    AddReviewRequest {
        rating: value,
        comment: Some("Read it twice".into()),
    }
}

#[tokio::test]
async fn average_is_reported_with_one_decimal_only_when_needed() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let seller = create_user(&state, "seller", Role::Seller).await?;
    let alice = create_user(&state, "alice", Role::User).await?;
    let bob = create_user(&state, "bob", Role::User).await?;
    let category = create_category(&state, "Fiction").await?;
    let mixed = create_book(&state, &seller, category, "Dune", 100, 5).await?;
    let even = create_book(&state, &seller, category, "Emma", 40, 5).await?;

    review_service::add_review(&state, &alice, mixed, rating(4)).await?;
    review_service::add_review(&state, &bob, mixed, rating(5)).await?;
    review_service::add_review(&state, &alice, even, rating(4)).await?;
    review_service::add_review(&state, &bob, even, rating(4)).await?;

    let mixed_reviews = review_service::get_reviews_by_book(&state, mixed)
        .await?
        .data
        .unwrap();
    assert_eq!(mixed_reviews.average_rating, "4.5");
    assert_eq!(mixed_reviews.items.len(), 2);
    assert!(
        mixed_reviews
            .items
            .iter()
            .all(|r| r.username.is_some())
    );

    let even_reviews = review_service::get_reviews_by_book(&state, even)
        .await?
        .data
        .unwrap();
    assert_eq!(even_reviews.average_rating, "4");
    Ok(())
}

#[tokio::test]
async fn review_records_the_latest_review_on_the_author() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let seller = create_user(&state, "seller", Role::Seller).await?;
    let alice = create_user(&state, "alice", Role::User).await?;
    let category = create_category(&state, "Fiction").await?;
    let book = create_book(&state, &seller, category, "Dune", 100, 5).await?;

    let review = review_service::add_review(&state, &alice, book, rating(5))
        .await?
        .data
        .unwrap();

    let author = Users::find_by_id(alice.user_id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert_eq!(author.last_review_id, Some(review.id));
    Ok(())
}

#[tokio::test]
async fn sellers_and_admins_are_turned_away() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let seller = create_user(&state, "seller", Role::Seller).await?;
    let other_seller = create_user(&state, "other", Role::Seller).await?;
    let admin = create_user(&state, "admin", Role::Admin).await?;
    let category = create_category(&state, "Fiction").await?;
    let book = create_book(&state, &seller, category, "Dune", 100, 5).await?;

    let own = review_service::add_review(&state, &seller, book, rating(5)).await;
    assert!(matches!(own, Err(AppError::Forbidden(_))));

    let by_admin = review_service::add_review(&state, &admin, book, rating(5)).await;
    assert!(matches!(by_admin, Err(AppError::Forbidden(_))));

    // Another seller reviewing someone else's book is fine.
    review_service::add_review(&state, &other_seller, book, rating(3)).await?;
    Ok(())
}

#[tokio::test]
async fn out_of_range_rating_and_missing_reviews() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let seller = create_user(&state, "seller", Role::Seller).await?;
    let alice = create_user(&state, "alice", Role::User).await?;
    let category = create_category(&state, "Fiction").await?;
    let book = create_book(&state, &seller, category, "Dune", 100, 5).await?;

    for bad in [0, 6] {
        let err = review_service::add_review(&state, &alice, book, rating(bad)).await;
        assert!(matches!(err, Err(AppError::Validation(_))));
    }

    let none = review_service::get_reviews_by_book(&state, book).await;
    match none {
        Err(AppError::NotFound(message)) => {
            assert_eq!(message, "No reviews found for this book")
        }
        other => panic!("unexpected result: {other:?}"),
    }
    Ok(())
}
