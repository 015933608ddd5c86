use serde::Serialize;

use crate::models::{Tier, UserProfile};

/// 等级摘要，每次请求时由积分重新计算
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierSummary {
    pub current: Tier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Tier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_to_next: Option<u64>,
    pub progress: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub tier_summary: TierSummary,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        let level = profile.current_tier();
        let next = level.next();
        let tier_summary = TierSummary {
            current: level.tier(),
            next: next.map(|n| n.tier()),
            points_to_next: next.map(|n| n.min_points().saturating_sub(profile.points)),
            progress: level.progress(profile.points),
        };
        Self {
            profile,
            tier_summary,
        }
    }
}
