use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::MapLocation;

/// 一次经过位置校验的到店打卡
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    pub restaurant_id: String,
    /// 创建时间（Unix 毫秒）
    pub timestamp: i64,
    /// 校验时设备所在位置
    pub location: MapLocation,
}

impl CheckIn {
    pub fn new(restaurant_id: impl Into<String>, timestamp: i64, location: MapLocation) -> Self {
        Self {
            restaurant_id: restaurant_id.into(),
            timestamp,
            location,
        }
    }

    /// `now - timestamp < expiry` 时有效
    pub fn is_active(&self, now_millis: i64, expiry: Duration) -> bool {
        now_millis.saturating_sub(self.timestamp) < expiry.as_millis() as i64
    }

    pub fn expires_at(&self, expiry: Duration) -> i64 {
        self.timestamp.saturating_add(expiry.as_millis() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 3600);

    #[test]
    fn active_strictly_inside_window() {
        let check_in = CheckIn::new("1", 1_000, MapLocation::new(0.0, 0.0));
        assert!(check_in.is_active(1_000, DAY));
        assert!(check_in.is_active(1_000 + DAY.as_millis() as i64 - 1, DAY));
        assert!(!check_in.is_active(1_000 + DAY.as_millis() as i64, DAY));
    }

    #[test]
    fn persisted_field_names() {
        let check_in = CheckIn::new("7", 42, MapLocation::new(34.0, -118.0));
        let json = serde_json::to_value(&check_in).unwrap();
        assert_eq!(json["restaurantId"], "7");
        assert_eq!(json["timestamp"], 42);
        assert_eq!(json["location"]["latitude"], 34.0);
    }
}
