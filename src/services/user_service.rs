use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use crate::{
    dto::auth::UpdateProfileRequest,
    entity::users::{ActiveModel as UserActive, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    state::AppState,
};

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let me = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(ApiResponse::ok("OK", me.into()))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let me = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    let mut active: UserActive = me.into();
    if let Some(username) = payload.username {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::Validation("username cannot be empty".into()));
        }
        active.username = Set(username.to_string());
    }
    if let Some(phone) = payload.phone {
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(AppError::Validation("phone cannot be empty".into()));
        }
        active.phone = Set(phone.to_string());
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::ok("Profile updated", updated.into()))
}
