use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use super::{CatalogError, RestaurantCatalog, rank_nearby};
use crate::common::MapLocation;
use crate::models::{NearbyRestaurant, Restaurant};

/// 内存中的餐厅目录
#[derive(Debug, Default, Clone)]
pub struct MemoryCatalog {
    restaurants: Vec<Restaurant>,
    index: HashMap<String, usize>,
}

impl MemoryCatalog {
    pub fn new(restaurants: Vec<Restaurant>) -> Self {
        let index = restaurants
            .iter()
            .enumerate()
            .map(|(position, restaurant)| (restaurant.id.clone(), position))
            .collect();
        Self { restaurants, index }
    }

    /// 从 JSON 数组文件加载
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let restaurants: Vec<Restaurant> = serde_json::from_str(&contents)?;
        tracing::info!(
            path = %path.as_ref().display(),
            count = restaurants.len(),
            "loaded restaurant catalog"
        );
        Ok(Self::new(restaurants))
    }

    pub fn len(&self) -> usize {
        self.restaurants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.restaurants.is_empty()
    }
}

#[async_trait]
impl RestaurantCatalog for MemoryCatalog {
    async fn find_by_id(&self, id: &str) -> Result<Option<Restaurant>, CatalogError> {
        Ok(self
            .index
            .get(id)
            .and_then(|position| self.restaurants.get(*position))
            .cloned())
    }

    async fn nearby(
        &self,
        origin: MapLocation,
        radius_meters: f64,
        limit: usize,
    ) -> Result<Vec<NearbyRestaurant>, CatalogError> {
        Ok(rank_nearby(
            self.restaurants.iter().cloned(),
            &origin,
            radius_meters,
            limit,
        ))
    }
}
