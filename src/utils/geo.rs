/// 地球半径（米）
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// 地球半径（英里），用于距离标签
pub const EARTH_RADIUS_MILES: f64 = 3_959.0;

const FEET_PER_MILE: f64 = 5_280.0;

/// 使用Haversine公式计算两个坐标之间的球面距离，结果单位与 `radius` 相同
///
/// 不校验经纬度范围，超出 ±90 / ±180 的输入由调用方负责。
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64, radius: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    radius * c
}

/// 两点之间的距离（米）
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine(lat1, lon1, lat2, lon2, EARTH_RADIUS_METERS)
}

/// 面向用户的距离标签，不足0.1英里时以英尺显示
pub fn distance_label(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> String {
    let miles = haversine(lat1, lon1, lat2, lon2, EARTH_RADIUS_MILES);
    if miles < 0.1 {
        format!("{} ft", (miles * FEET_PER_MILE).round() as i64)
    } else {
        format!("{:.1} mi", miles)
    }
}
