use serde::{Deserialize, Serialize};

use crate::common::MapLocation;

/// 餐厅目录中的一条记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cuisine: String,
    /// 街区名称
    #[serde(default, rename = "location")]
    pub neighborhood: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub price_range: String,
    #[serde(default)]
    pub is_partner: bool,
}

impl Restaurant {
    pub fn location(&self) -> MapLocation {
        MapLocation::new(self.latitude, self.longitude)
    }
}

/// 附近餐厅，附带与查询点的距离
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyRestaurant {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub distance_meters: f64,
    pub distance: String,
}

impl NearbyRestaurant {
    pub fn from_origin(restaurant: Restaurant, origin: &MapLocation) -> Self {
        let location = restaurant.location();
        Self {
            distance_meters: origin.distance_to(&location),
            distance: origin.distance_label_to(&location),
            restaurant,
        }
    }
}
