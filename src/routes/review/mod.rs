use std::sync::Arc;

use axum::{Extension, Json};

use crate::{
    error::AppError,
    models::{Review, ReviewDraft},
    session::DeviceSession,
    utils::{ApiResponse, success_to_api_response},
};

// 提交点评
pub async fn submit_review(
    Extension(session): Extension<Arc<DeviceSession>>,
    Json(draft): Json<ReviewDraft>,
) -> Result<Json<ApiResponse<Review>>, AppError> {
    let review = session.submit_review(draft).await?;
    Ok(success_to_api_response(review))
}
