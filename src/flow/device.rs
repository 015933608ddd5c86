//! 设备侧协作者：定位与定位权限

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::common::MapLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    #[default]
    Undetermined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("current location is unavailable")]
pub struct LocationUnavailable;

#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// 可能因硬件或系统权限往返而挂起
    async fn current_position(&self) -> Result<MapLocation, LocationUnavailable>;
}

#[async_trait]
pub trait PermissionProvider: Send + Sync {
    async fn status(&self) -> PermissionStatus;

    async fn request(&self) -> PermissionStatus;
}

/// 由客户端随请求上报的设备状态
///
/// 服务端无法弹出授权提示，`request` 原样返回上报的状态。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportedDevice {
    pub permission: PermissionStatus,
    pub position: Option<MapLocation>,
}

impl ReportedDevice {
    pub fn new(permission: PermissionStatus, position: Option<MapLocation>) -> Self {
        Self {
            permission,
            position,
        }
    }
}

#[async_trait]
impl LocationProvider for ReportedDevice {
    async fn current_position(&self) -> Result<MapLocation, LocationUnavailable> {
        self.position.ok_or(LocationUnavailable)
    }
}

#[async_trait]
impl PermissionProvider for ReportedDevice {
    async fn status(&self) -> PermissionStatus {
        self.permission
    }

    async fn request(&self) -> PermissionStatus {
        self.permission
    }
}
