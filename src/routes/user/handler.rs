use std::sync::Arc;

use axum::{Extension, Json};

use crate::{
    error::AppError,
    models::{Tier, UserProfileUpdate},
    session::DeviceSession,
    utils::{ApiResponse, success_to_api_response},
};

use super::model::ProfileResponse;

pub async fn get_profile(
    Extension(session): Extension<Arc<DeviceSession>>,
) -> Json<ApiResponse<ProfileResponse>> {
    let profile = session.rewards.profile().await;
    success_to_api_response(ProfileResponse::from(profile))
}

// 编辑资料，存储失败时返回错误供客户端重试
pub async fn update_profile(
    Extension(session): Extension<Arc<DeviceSession>>,
    Json(update): Json<UserProfileUpdate>,
) -> Result<Json<ApiResponse<ProfileResponse>>, AppError> {
    update.validate()?;

    let profile = session.rewards.update(update).await.map_err(|e| {
        tracing::error!(device_id = %session.device_id, "更新用户资料错误: {:?}", e);
        AppError::from(e)
    })?;

    Ok(success_to_api_response(ProfileResponse::from(profile)))
}

pub async fn clear_profile(
    Extension(session): Extension<Arc<DeviceSession>>,
) -> Result<Json<ApiResponse<ProfileResponse>>, AppError> {
    session.rewards.clear().await?;
    tracing::info!(device_id = %session.device_id, "user data cleared");

    let profile = session.rewards.profile().await;
    Ok(success_to_api_response(ProfileResponse::from(profile)))
}

pub async fn list_tiers() -> Json<ApiResponse<Vec<Tier>>> {
    success_to_api_response(Tier::all())
}
