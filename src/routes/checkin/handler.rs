use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::Path,
};

use crate::{
    error::AppError,
    session::DeviceSession,
    utils::{ApiResponse, success_to_api_response},
};

use super::model::{ActiveCheckIn, ResetResponse, ScanRequest, ScanResponse};

type SessionExt = Extension<Arc<DeviceSession>>;

// 扫码打卡
pub async fn scan(
    Extension(session): SessionExt,
    Json(request): Json<ScanRequest>,
) -> Json<ApiResponse<ScanResponse>> {
    let device = request.device();
    let outcome = session
        .flow
        .handle_scan(&request.payload, &device, &device)
        .await;

    success_to_api_response(ScanResponse::from(outcome))
}

// 离开扫码页面后复位状态机
pub async fn reset_flow(Extension(session): SessionExt) -> Json<ApiResponse<ResetResponse>> {
    let reset = session.flow.reset();
    success_to_api_response(ResetResponse { reset })
}

// 当前有效的打卡记录
pub async fn list_checkins(Extension(session): SessionExt) -> Json<ApiResponse<Vec<ActiveCheckIn>>> {
    let expiry = session.flow.policy().expiry;
    let active = session
        .check_ins
        .active()
        .await
        .into_iter()
        .map(|check_in| ActiveCheckIn {
            expires_at: check_in.expires_at(expiry),
            check_in,
        })
        .collect();

    success_to_api_response(active)
}

pub async fn get_checkin(
    Extension(session): SessionExt,
    Path(restaurant_id): Path<String>,
) -> Result<Json<ApiResponse<ActiveCheckIn>>, AppError> {
    let expiry = session.flow.policy().expiry;
    let check_in = session
        .check_ins
        .get(&restaurant_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("active check-in for {}", restaurant_id)))?;

    Ok(success_to_api_response(ActiveCheckIn {
        expires_at: check_in.expires_at(expiry),
        check_in,
    }))
}

pub async fn clear_checkins(Extension(session): SessionExt) -> Result<Json<ApiResponse<()>>, AppError> {
    session.check_ins.clear().await?;
    tracing::info!(device_id = %session.device_id, "check-ins cleared");
    Ok(success_to_api_response(()))
}
