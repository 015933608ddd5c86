// 餐厅目录的 Postgres 实现

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use super::{CatalogError, RestaurantCatalog, rank_nearby};
use crate::common::MapLocation;
use crate::models::{NearbyRestaurant, Restaurant};

/// 1度纬度约111km
const METERS_PER_DEGREE: f64 = 111_000.0;

#[derive(Debug, FromRow)]
struct RestaurantRow {
    id: String,
    name: String,
    cuisine: String,
    neighborhood: String,
    latitude: f64,
    longitude: f64,
    rating: f64,
    review_count: i32,
    image: String,
    price_range: String,
    is_partner: bool,
}

impl From<RestaurantRow> for Restaurant {
    fn from(row: RestaurantRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            cuisine: row.cuisine,
            neighborhood: row.neighborhood,
            latitude: row.latitude,
            longitude: row.longitude,
            rating: row.rating,
            review_count: row.review_count.max(0) as u32,
            image: row.image,
            price_range: row.price_range,
            is_partner: row.is_partner,
        }
    }
}

pub struct PgRestaurantCatalog {
    pool: PgPool,
}

impl PgRestaurantCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 创建 restaurants 表
    pub async fn init(&self) -> Result<(), CatalogError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS restaurants (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                cuisine TEXT NOT NULL DEFAULT '',
                neighborhood TEXT NOT NULL DEFAULT '',
                latitude DOUBLE PRECISION NOT NULL,
                longitude DOUBLE PRECISION NOT NULL,
                rating DOUBLE PRECISION NOT NULL DEFAULT 0,
                review_count INTEGER NOT NULL DEFAULT 0,
                image TEXT NOT NULL DEFAULT '',
                price_range TEXT NOT NULL DEFAULT '',
                is_partner BOOLEAN NOT NULL DEFAULT FALSE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS restaurants_lat_lon_idx ON restaurants (latitude, longitude)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl RestaurantCatalog for PgRestaurantCatalog {
    async fn find_by_id(&self, id: &str) -> Result<Option<Restaurant>, CatalogError> {
        let result = sqlx::query_as::<_, RestaurantRow>(
            r#"
            SELECT id, name, cuisine, neighborhood, latitude, longitude,
                   rating, review_count, image, price_range, is_partner
            FROM restaurants
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row.map(Restaurant::from)),
            Err(e) => {
                tracing::error!(restaurant_id = %id, "查询餐厅错误: {:?}", e);
                Err(e.into())
            }
        }
    }

    async fn nearby(
        &self,
        origin: MapLocation,
        radius_meters: f64,
        limit: usize,
    ) -> Result<Vec<NearbyRestaurant>, CatalogError> {
        // 先按经纬度范围粗筛，再用球面距离精确过滤
        let lat_range = radius_meters / METERS_PER_DEGREE;
        let lon_range =
            radius_meters / (METERS_PER_DEGREE * origin.latitude.to_radians().cos().abs().max(1e-6));

        let result = sqlx::query_as::<_, RestaurantRow>(
            r#"
            SELECT id, name, cuisine, neighborhood, latitude, longitude,
                   rating, review_count, image, price_range, is_partner
            FROM restaurants
            WHERE latitude BETWEEN ($1 - $3::float8) AND ($1 + $3::float8)
              AND longitude BETWEEN ($2 - $4::float8) AND ($2 + $4::float8)
            "#,
        )
        .bind(origin.latitude)
        .bind(origin.longitude)
        .bind(lat_range)
        .bind(lon_range)
        .fetch_all(&self.pool)
        .await;

        match result {
            Ok(rows) => Ok(rank_nearby(
                rows.into_iter().map(Restaurant::from),
                &origin,
                radius_meters,
                limit,
            )),
            Err(e) => {
                tracing::error!("查找附近餐厅错误: {:?}", e);
                Err(e.into())
            }
        }
    }
}
