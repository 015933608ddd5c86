use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{AppState, middleware::device_session};

pub mod checkin;
pub mod restaurant;
pub mod review;
pub mod user;

/// 所有接口路由，需要设备会话的路由挂载设备中间件
pub fn api_routes(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/tiers", get(user::list_tiers))
        .route("/restaurants/nearby", get(restaurant::find_nearby))
        .route("/restaurants/{id}", get(restaurant::find_restaurant));

    let device_routes = Router::new()
        .route("/checkins/scan", post(checkin::scan))
        .route("/checkins/reset", post(checkin::reset_flow))
        .route(
            "/checkins",
            get(checkin::list_checkins).delete(checkin::clear_checkins),
        )
        .route("/checkins/active/{restaurant_id}", get(checkin::get_checkin))
        .route(
            "/users/me",
            get(user::get_profile)
                .put(user::update_profile)
                .delete(user::clear_profile),
        )
        .route("/reviews", post(review::submit_review))
        .layer(middleware::from_fn_with_state(state, device_session));

    Router::new().merge(public_routes).merge(device_routes)
}
