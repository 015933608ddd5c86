/// 打卡记录键前缀
const CHECKINS_PREFIX: &str = "checkins:";

/// 用户资料键前缀
const USER_PROFILE_PREFIX: &str = "user:profile:";

/// 生成设备打卡记录键
pub fn checkins_key(owner_id: &str) -> String {
    format!("{}{}", CHECKINS_PREFIX, owner_id)
}

/// 生成设备用户资料键
pub fn user_profile_key(owner_id: &str) -> String {
    format!("{}{}", USER_PROFILE_PREFIX, owner_id)
}
