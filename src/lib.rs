use axum::Router;
use config::Config;
use std::sync::Arc;

use catalog::RestaurantCatalog;
use session::SessionRegistry;

pub mod catalog;
pub mod checkin;
pub mod common;
pub mod config;
pub mod error;
pub mod flow;
pub mod middleware;
pub mod models;
pub mod session;
pub mod storage;
pub mod user;
pub mod utils;

pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<dyn RestaurantCatalog>,
    pub sessions: Arc<SessionRegistry>,
}

/// 构建挂载在 `api_base_uri` 下的路由
pub fn build_router(state: AppState) -> Router {
    let api = routes::api_routes(state.clone());

    // 根路径不能 nest
    let base = state.config.api_base_uri.trim_end_matches('/');
    let router = if base.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(base, api)
    };

    router
        .layer(axum::middleware::from_fn(middleware::log_errors))
        .with_state(state)
}
