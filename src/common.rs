use serde::{Deserialize, Serialize};

use crate::utils::geo;

// 公共数据结构
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct MapLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl MapLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// 到另一坐标的球面距离（米）
    pub fn distance_to(&self, other: &MapLocation) -> f64 {
        geo::distance_meters(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }

    pub fn distance_label_to(&self, other: &MapLocation) -> String {
        geo::distance_label(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}
