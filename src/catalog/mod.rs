//! 餐厅目录
//!
//! 扫码结果通过目录解析为餐厅，附近餐厅列表也由目录提供。

use async_trait::async_trait;

use crate::common::MapLocation;
use crate::models::{NearbyRestaurant, Restaurant};

pub mod memory;
pub mod postgres;

pub use memory::MemoryCatalog;
pub use postgres::PgRestaurantCatalog;

/// 单次附近查询的默认条数
pub const DEFAULT_NEARBY_LIMIT: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// 餐厅查询，后端故障以 `CatalogError` 返回，由调用方决定如何降级
#[async_trait]
pub trait RestaurantCatalog: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Restaurant>, CatalogError>;

    /// 半径内的餐厅，按距离升序
    async fn nearby(
        &self,
        origin: MapLocation,
        radius_meters: f64,
        limit: usize,
    ) -> Result<Vec<NearbyRestaurant>, CatalogError>;
}

/// 计算距离、按半径过滤并排序
pub(crate) fn rank_nearby<I>(
    restaurants: I,
    origin: &MapLocation,
    radius_meters: f64,
    limit: usize,
) -> Vec<NearbyRestaurant>
where
    I: IntoIterator<Item = Restaurant>,
{
    let mut nearby: Vec<NearbyRestaurant> = restaurants
        .into_iter()
        .map(|restaurant| NearbyRestaurant::from_origin(restaurant, origin))
        .filter(|candidate| candidate.distance_meters <= radius_meters)
        .collect();
    nearby.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
    nearby.truncate(limit);
    nearby
}
