use chrono::DateTime;
use serde::{Deserialize, Serialize};

use super::tier::TierLevel;

pub const DEFAULT_AVATAR: &str = "https://i.pravatar.cc/150?img=68";

/// 当前用户的会员资料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub avatar: String,
    /// 由积分推导，写入前总是重新计算
    pub tier: TierLevel,
    pub points: u64,
    pub total_checkins: u64,
    pub total_reviews: u64,
    pub member_since: String,
    #[serde(default)]
    pub friend_ids: Vec<String>,
}

impl UserProfile {
    /// 首次加载时的默认资料
    pub fn with_defaults(id: impl Into<String>, now_millis: i64) -> Self {
        let member_since = DateTime::from_timestamp_millis(now_millis)
            .map(|created| created.format("%B %Y").to_string())
            .unwrap_or_default();

        Self {
            id: id.into(),
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            avatar: DEFAULT_AVATAR.to_string(),
            tier: TierLevel::Foodie,
            points: 0,
            total_checkins: 0,
            total_reviews: 0,
            member_since,
            friend_ids: Vec::new(),
        }
    }

    pub fn current_tier(&self) -> TierLevel {
        TierLevel::for_points(self.points)
    }

    /// 让持久化的等级与积分保持一致
    pub(crate) fn sync_tier(&mut self) {
        self.tier = self.current_tier();
    }

    pub(crate) fn apply(&mut self, update: UserProfileUpdate) {
        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(email) = update.email {
            self.email = email.trim().to_string();
        }
        if let Some(phone) = update.phone {
            self.phone = phone.trim().to_string();
        }
        if let Some(avatar) = update.avatar {
            self.avatar = avatar.trim().to_string();
        }
        if let Some(friend_ids) = update.friend_ids {
            self.friend_ids = friend_ids;
        }
    }
}

/// 可由用户编辑的字段，积分与计数不在其中
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub friend_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileValidationError {
    #[error("Please enter your name")]
    MissingName,
    #[error("Please enter your email")]
    MissingEmail,
    #[error("Please enter a valid email address")]
    InvalidEmail,
}

impl UserProfileUpdate {
    /// 资料编辑页的校验规则：姓名、邮箱必填，邮箱形如 local@domain.tld
    pub fn validate(&self) -> Result<(), ProfileValidationError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ProfileValidationError::MissingName);
            }
        }
        if let Some(email) = &self.email {
            let email = email.trim();
            if email.is_empty() {
                return Err(ProfileValidationError::MissingEmail);
            }
            if !looks_like_email(email) {
                return Err(ProfileValidationError::InvalidEmail);
            }
        }
        Ok(())
    }
}

fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_start_at_foodie_with_zero_counters() {
        // 2024-01-15T00:00:00Z
        let profile = UserProfile::with_defaults("device-1", 1_705_276_800_000);
        assert_eq!(profile.id, "device-1");
        assert_eq!(profile.tier, TierLevel::Foodie);
        assert_eq!(profile.points, 0);
        assert_eq!(profile.member_since, "January 2024");
        assert_eq!(profile.avatar, DEFAULT_AVATAR);
    }

    #[test]
    fn email_shapes() {
        assert!(looks_like_email("a@b.co"));
        assert!(looks_like_email("first.last@mail.example.com"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.co"));
        assert!(!looks_like_email("a@.co"));
        assert!(!looks_like_email("a b@c.co"));
        assert!(!looks_like_email("a@b@c.co"));
    }

    #[test]
    fn validate_rejects_blank_name() {
        let update = UserProfileUpdate {
            name: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(update.validate(), Err(ProfileValidationError::MissingName));
    }

    #[test]
    fn apply_trims_and_leaves_counters() {
        let mut profile = UserProfile::with_defaults("d", 0);
        profile.points = 300;
        profile.apply(UserProfileUpdate {
            name: Some("  Ana ".into()),
            phone: Some("555".into()),
            ..Default::default()
        });
        assert_eq!(profile.name, "Ana");
        assert_eq!(profile.phone, "555");
        assert_eq!(profile.points, 300);
    }

    #[test]
    fn persisted_field_names() {
        let json = serde_json::to_value(UserProfile::with_defaults("d", 0)).unwrap();
        assert!(json.get("totalCheckins").is_some());
        assert!(json.get("memberSince").is_some());
        assert!(json.get("friendIds").is_some());
        assert_eq!(json["tier"], "foodie");
    }
}
