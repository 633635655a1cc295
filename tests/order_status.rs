mod common;

use book_market_api::{
    dto::{
        cart::AddToCartRequest,
        orders::{CreateOrderRequest, ShippingAddressInput, UpdateOrderStatusRequest},
    },
    entity::orders::{ActiveModel as OrderActive, Entity as Orders},
    error::AppError,
    middleware::auth::AuthUser,
    models::{OrderStatus, PaymentStatus, Role},
    services::{cart_service, order_service, order_status_service},
    state::AppState,
};
use chrono::{Duration, Utc};
use common::{create_book, create_category, create_user, setup_state};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

struct Fixture {
    state: AppState,
    seller: AuthUser,
    buyer: AuthUser,
    order_id: Uuid,
}

async fn placed_order() -> anyhow::Result<Fixture> {
    let state = setup_state().await?;
    let seller = create_user(&state, "seller", Role::Seller).await?;
    let buyer = create_user(&state, "buyer", Role::User).await?;
    let category = create_category(&state, "Fiction").await?;
    let book = create_book(&state, &seller, category, "Dune", 100, 5).await?;

    cart_service::add_to_cart(
        &state,
        &buyer,
        AddToCartRequest {
            book_id: book,
            quantity: Some(1),
        },
    )
    .await?;
    let created = order_service::create_order(
        &state,
        &buyer,
        CreateOrderRequest {
            shipping_address: Some(ShippingAddressInput {
                fullname: Some("Mona Adel".into()),
                phone: Some("01012345678".into()),
                address: Some("12 Nile St".into()),
                city: Some("Cairo".into()),
            }),
            payment_method: Some("card".into()),
        },
    )
    .await?
    .data
    .unwrap();

    Ok(Fixture {
        state,
        seller,
        buyer,
        order_id: created.order.order.id,
    })
}

fn status(value: &str) -> UpdateOrderStatusRequest {
    UpdateOrderStatusRequest {
        status: value.to_string(),
    }
}

#[tokio::test]
async fn payment_status_follows_every_status_write() -> anyhow::Result<()> {
    let fx = placed_order().await?;

    let cases = [
        ("delivered", OrderStatus::Delivered, PaymentStatus::Paid),
        ("processing", OrderStatus::Processing, PaymentStatus::Pending),
        ("cancelled", OrderStatus::Cancelled, PaymentStatus::Refunded),
        ("confirmed", OrderStatus::Confirmed, PaymentStatus::Pending),
        ("delivered", OrderStatus::Delivered, PaymentStatus::Paid),
        ("shipped", OrderStatus::Shipped, PaymentStatus::Pending),
    ];
    for (raw, expected_status, expected_payment) in cases {
        let resp = order_status_service::update_order_status(
            &fx.state,
            &fx.seller,
            fx.order_id,
            status(raw),
        )
        .await?;
        assert_eq!(resp.message, "Status updated");
        let order = resp.data.unwrap();
        assert_eq!(order.status, expected_status);
        assert_eq!(order.payment_status, expected_payment, "after {raw}");
    }
    Ok(())
}

#[tokio::test]
async fn status_write_refreshes_updated_at() -> anyhow::Result<()> {
    let fx = placed_order().await?;
    let old = Utc::now() - Duration::days(3);

    let model = Orders::find_by_id(fx.order_id)
        .one(&fx.state.orm)
        .await?
        .unwrap();
    let mut active: OrderActive = model.into();
    active.updated_at = Set(old.into());
    active.update(&fx.state.orm).await?;

    let order = order_status_service::update_order_status(
        &fx.state,
        &fx.seller,
        fx.order_id,
        status("shipped"),
    )
    .await?
    .data
    .unwrap();
    assert!(order.updated_at > old);
    Ok(())
}

#[tokio::test]
async fn only_involved_sellers_and_admins_may_update() -> anyhow::Result<()> {
    let fx = placed_order().await?;
    let stranger_seller = create_user(&fx.state, "stranger", Role::Seller).await?;
    let admin = create_user(&fx.state, "admin", Role::Admin).await?;

    let by_buyer = order_status_service::update_order_status(
        &fx.state,
        &fx.buyer,
        fx.order_id,
        status("cancelled"),
    )
    .await;
    assert!(matches!(by_buyer, Err(AppError::Forbidden(_))));

    let by_stranger = order_status_service::update_order_status(
        &fx.state,
        &stranger_seller,
        fx.order_id,
        status("cancelled"),
    )
    .await;
    assert!(matches!(by_stranger, Err(AppError::Forbidden(_))));

    let by_admin = order_status_service::update_order_status(
        &fx.state,
        &admin,
        fx.order_id,
        status("cancelled"),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(by_admin.payment_status, PaymentStatus::Refunded);
    Ok(())
}

#[tokio::test]
async fn unknown_status_or_order_is_rejected() -> anyhow::Result<()> {
    let fx = placed_order().await?;

    let bad = order_status_service::update_order_status(
        &fx.state,
        &fx.seller,
        fx.order_id,
        status("lost"),
    )
    .await;
    assert!(matches!(bad, Err(AppError::Validation(_))));

    let missing = order_status_service::update_order_status(
        &fx.state,
        &fx.seller,
        Uuid::new_v4(),
        status("shipped"),
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    Ok(())
}
