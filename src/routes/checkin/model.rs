use serde::{Deserialize, Serialize};

use crate::common::MapLocation;
use crate::flow::{PermissionStatus, Rejection, ReportedDevice, ScanOutcome};
use crate::models::{CheckIn, Restaurant};

// 扫码请求，定位权限与坐标由客户端上报
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub payload: String,
    #[serde(default)]
    pub permission: PermissionStatus,
    pub location: Option<MapLocation>,
}

impl ScanRequest {
    pub fn device(&self) -> ReportedDevice {
        ReportedDevice::new(self.permission, self.location)
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ScanResponse {
    Verified {
        restaurant: Restaurant,
        points_earned: u64,
        check_in: CheckIn,
    },
    Rejected {
        reason: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        distance_meters: Option<f64>,
        prompt_permission: bool,
    },
    Ignored,
}

impl From<ScanOutcome> for ScanResponse {
    fn from(outcome: ScanOutcome) -> Self {
        match outcome {
            ScanOutcome::Verified {
                restaurant,
                points_earned,
                check_in,
            } => ScanResponse::Verified {
                restaurant,
                points_earned,
                check_in,
            },
            ScanOutcome::Rejected(rejection) => rejection.into(),
            ScanOutcome::Ignored => ScanResponse::Ignored,
        }
    }
}

impl From<Rejection> for ScanResponse {
    fn from(rejection: Rejection) -> Self {
        ScanResponse::Rejected {
            reason: rejection.reason(),
            detail: rejection.detail(),
            distance_meters: rejection.distance_meters(),
            prompt_permission: rejection.should_prompt_permission(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCheckIn {
    #[serde(flatten)]
    pub check_in: CheckIn,
    pub expires_at: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub reset: bool,
}
