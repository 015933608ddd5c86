use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::{
    AppState,
    catalog::DEFAULT_NEARBY_LIMIT,
    common::MapLocation,
    error::AppError,
    models::{NearbyRestaurant, Restaurant},
    utils::{ApiResponse, success_to_api_response},
};

/// 单次附近查询最多返回的条数
const MAX_NEARBY_LIMIT: usize = 50;

// 地理位置查询参数
#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    latitude: Option<f64>,
    longitude: Option<f64>,
    radius: Option<f64>,
    limit: Option<usize>,
}

// 获取附近餐厅
pub async fn find_nearby(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<ApiResponse<Vec<NearbyRestaurant>>>, AppError> {
    let latitude = query
        .latitude
        .ok_or_else(|| AppError::Validation("缺少latitude参数".into()))?;
    let longitude = query
        .longitude
        .ok_or_else(|| AppError::Validation("缺少longitude参数".into()))?;

    let radius = query
        .radius
        .unwrap_or(state.config.max_search_radius)
        .min(state.config.max_search_radius)
        .max(0.0);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_NEARBY_LIMIT)
        .min(MAX_NEARBY_LIMIT);

    let restaurants = state
        .catalog
        .nearby(MapLocation::new(latitude, longitude), radius, limit)
        .await?;
    tracing::debug!(count = restaurants.len(), "found nearby restaurants");

    Ok(success_to_api_response(restaurants))
}

pub async fn find_restaurant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Restaurant>>, AppError> {
    state
        .catalog
        .find_by_id(&id)
        .await?
        .map(success_to_api_response)
        .ok_or_else(|| AppError::NotFound(format!("restaurant {}", id)))
}
