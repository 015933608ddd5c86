use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub redis_url: String,
    pub database_url: Option<String>,
    pub restaurant_catalog_path: Option<String>,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub checkin_radius_meters: f64,
    pub checkin_expiration_secs: u64,
    pub checkin_reward_points: u64,
    pub max_search_radius: f64,
    pub session_idle_secs: u64,
}

/// 打卡校验策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckInPolicy {
    /// 设备与餐厅之间允许的最大距离（米）
    pub radius_meters: f64,
    /// 打卡有效期
    pub expiry: Duration,
    /// 每次成功打卡奖励的积分
    pub reward_points: u64,
}

impl Default for CheckInPolicy {
    fn default() -> Self {
        Self {
            radius_meters: 200.0,
            expiry: Duration::from_secs(24 * 3600),
            reward_points: 100,
        }
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// 解析距离类配置，只接受有限的非负数
fn parse_distance(value: Option<String>) -> Option<f64> {
    let raw = value?;
    match raw.trim().parse::<f64>() {
        Ok(meters) if meters.is_finite() && meters >= 0.0 => Some(meters),
        _ => {
            tracing::warn!(value = %raw, "ignoring invalid distance setting");
            None
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        let defaults = CheckInPolicy::default();

        let checkin_expiration = optional_var("CHECKIN_EXPIRATION")
            .and_then(|v| v.trim_end_matches('h').parse::<u64>().ok())
            .unwrap_or(defaults.expiry.as_secs() / 3600);

        Ok(Config {
            redis_url: env::var("REDIS_URL")?,
            database_url: optional_var("DATABASE_URL"),
            restaurant_catalog_path: optional_var("RESTAURANT_CATALOG_PATH"),
            server_host: env::var("SERVER_HOST")?,
            server_port: env::var("SERVER_PORT")?.parse().unwrap_or(3000),
            api_base_uri: optional_var("API_BASE_URI").unwrap_or_else(|| "/api".into()),
            checkin_radius_meters: parse_distance(optional_var("CHECKIN_RADIUS_METERS"))
                .unwrap_or(defaults.radius_meters),
            checkin_expiration_secs: checkin_expiration * 3600,
            checkin_reward_points: optional_var("CHECKIN_REWARD_POINTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.reward_points),
            max_search_radius: parse_distance(optional_var("MAX_SEARCH_RADIUS"))
                .unwrap_or(5000.0),
            session_idle_secs: optional_var("SESSION_IDLE_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(30 * 60),
        })
    }

    pub fn checkin_expiration(&self) -> Duration {
        Duration::from_secs(self.checkin_expiration_secs)
    }

    pub fn session_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    pub fn checkin_policy(&self) -> CheckInPolicy {
        CheckInPolicy {
            radius_meters: self.checkin_radius_meters,
            expiry: self.checkin_expiration(),
            reward_points: self.checkin_reward_points,
        }
    }
}
