use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{AppState, error::AppError};

pub const DEVICE_ID_HEADER: &str = "x-device-id";

const MAX_DEVICE_ID_LEN: usize = 128;

fn is_valid_device_id(device_id: &str) -> bool {
    !device_id.is_empty()
        && device_id.len() <= MAX_DEVICE_ID_LEN
        && device_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// 根据请求头解析设备会话，注入到请求扩展中
pub async fn device_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let device_id = req
        .headers()
        .get(DEVICE_ID_HEADER)
        .and_then(|header| header.to_str().ok())
        .map(|header| header.trim().to_string())
        .ok_or(AppError::MissingDevice)?;

    if !is_valid_device_id(&device_id) {
        return Err(AppError::Validation(
            "设备ID格式无效，只允许使用字母、数字、连字符和下划线".to_string(),
        ));
    }

    let session = state.sessions.session(&device_id).await;
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}
