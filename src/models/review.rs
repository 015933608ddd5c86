use serde::{Deserialize, Serialize};

/// 评分上限（8星制）
pub const MAX_RATING: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewVisibility {
    #[default]
    Public,
    Friends,
    Private,
}

/// 待提交的点评
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDraft {
    pub restaurant_id: String,
    pub rating: u8,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub visibility: ReviewVisibility,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub restaurant_id: String,
    pub rating: u8,
    pub text: String,
    pub visibility: ReviewVisibility,
    pub created_at: i64,
}
