use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::UpdateOrderStatusRequest,
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Entity as Orders},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_seller_or_admin},
    models::Order,
    response::ApiResponse,
    services::order_service::parse_order_status,
    state::AppState,
};

/// Writes a new status and the payment status it implies.
///
/// Any status may follow any other. Admins may update every order; sellers only
/// orders holding at least one of their lines.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_seller_or_admin(user)?;
    let status = parse_order_status(&payload.status)?;

    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    if !user.is_admin() {
        let own_lines = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(existing.id))
            .filter(OrderItemCol::SellerId.eq(user.user_id))
            .count(&state.orm)
            .await?;
        if own_lines == 0 {
            return Err(AppError::Forbidden(
                "You can only update orders containing your books".into(),
            ));
        }
    }

    let previous = existing.status;
    let mut active: OrderActive = existing.into();
    active.status = Set(status);
    active.payment_status = Set(status.payment_status());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    tracing::info!(
        order_id = %order.id,
        from = ?previous,
        to = ?order.status,
        payment_status = ?order.payment_status,
        "order status updated"
    );
    audit::record(
        &state.orm,
        user.user_id,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status }),
    )
    .await;

    Ok(ApiResponse::ok("Status updated", order.into()))
}
