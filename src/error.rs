use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::catalog::CatalogError;
use crate::models::ProfileValidationError;
use crate::session::ReviewError;
use crate::storage::StorageError;
use crate::utils::{error_codes, error_to_api_response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("missing x-device-id header")]
    MissingDevice,

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    CheckInRequired(String),

    #[error("storage unavailable: {0}")]
    Storage(#[from] StorageError),

    #[error("restaurant catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),
}

impl From<ProfileValidationError> for AppError {
    fn from(err: ProfileValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::CheckInRequired => AppError::CheckInRequired(err.to_string()),
            ReviewError::InvalidRating(_) => AppError::Validation(err.to_string()),
            ReviewError::Storage(e) => AppError::Storage(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::MissingDevice => (StatusCode::UNAUTHORIZED, error_codes::AUTH_FAILED),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, error_codes::VALIDATION_ERROR),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, error_codes::NOT_FOUND),
            AppError::CheckInRequired(_) => (StatusCode::FORBIDDEN, error_codes::CHECKIN_REQUIRED),
            AppError::Storage(_) | AppError::Catalog(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                error_codes::STORAGE_ERROR,
            ),
        };

        (status, error_to_api_response::<()>(code, self.to_string())).into_response()
    }
}
