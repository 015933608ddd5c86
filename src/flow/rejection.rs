use super::device::PermissionStatus;

/// 打卡被拒绝的原因，均可由用户重试
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("scanned code does not match a known restaurant")]
    InvalidCode,

    #[error("location permission has not been granted")]
    PermissionDenied { status: PermissionStatus },

    #[error("current location is unavailable")]
    LocationUnavailable,

    #[error("too far from the restaurant ({distance_meters:.0} m)")]
    TooFar { distance_meters: f64 },

    #[error("failed to record the check-in")]
    PersistenceFailed,
}

impl Rejection {
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::InvalidCode => "invalid_code",
            Rejection::PermissionDenied { .. } => "permission_denied",
            Rejection::LocationUnavailable => "location_unavailable",
            Rejection::TooFar { .. } => "too_far",
            Rejection::PersistenceFailed => "persistence_failed",
        }
    }

    pub fn detail(&self) -> Option<String> {
        match self {
            Rejection::TooFar { .. } | Rejection::PermissionDenied { .. } => Some(self.to_string()),
            _ => None,
        }
    }

    pub fn distance_meters(&self) -> Option<f64> {
        match self {
            Rejection::TooFar { distance_meters } => Some(*distance_meters),
            _ => None,
        }
    }

    /// 调用方应提示用户授予定位权限
    pub fn should_prompt_permission(&self) -> bool {
        matches!(self, Rejection::PermissionDenied { .. })
    }
}
