use serde::{Deserialize, Serialize};

/// 会员等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierLevel {
    Foodie,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Elite,
    Legend,
}

/// 等级定义
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    pub id: TierLevel,
    pub name: &'static str,
    pub min_points: u64,
    pub benefits: &'static [&'static str],
}

impl TierLevel {
    /// 按门槛升序排列
    pub const ALL: [TierLevel; 8] = [
        TierLevel::Foodie,
        TierLevel::Bronze,
        TierLevel::Silver,
        TierLevel::Gold,
        TierLevel::Platinum,
        TierLevel::Diamond,
        TierLevel::Elite,
        TierLevel::Legend,
    ];

    pub fn min_points(self) -> u64 {
        match self {
            TierLevel::Foodie => 0,
            TierLevel::Bronze => 150,
            TierLevel::Silver => 300,
            TierLevel::Gold => 450,
            TierLevel::Platinum => 600,
            TierLevel::Diamond => 750,
            TierLevel::Elite => 900,
            TierLevel::Legend => 1050,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TierLevel::Foodie => "Foodie",
            TierLevel::Bronze => "Bronze",
            TierLevel::Silver => "Silver",
            TierLevel::Gold => "Gold",
            TierLevel::Platinum => "Platinum",
            TierLevel::Diamond => "Diamond",
            TierLevel::Elite => "Elite",
            TierLevel::Legend => "Legend",
        }
    }

    pub fn benefits(self) -> &'static [&'static str] {
        match self {
            TierLevel::Foodie => &["Earn points on every visit", "Share reviews"],
            TierLevel::Bronze => &["5% off at partner restaurants", "Priority reservations"],
            TierLevel::Silver => &["10% off at partner restaurants", "Free appetizer monthly"],
            TierLevel::Gold => &[
                "15% off at partner restaurants",
                "Free dessert weekly",
                "VIP events access",
            ],
            TierLevel::Platinum => &[
                "20% off at all restaurants",
                "Complimentary drinks",
                "Chef table access",
            ],
            TierLevel::Diamond => &[
                "25% off everywhere",
                "Free meal monthly",
                "Private dining events",
            ],
            TierLevel::Elite => &[
                "30% off everywhere",
                "Concierge service",
                "Exclusive menu items",
            ],
            TierLevel::Legend => &[
                "40% off everywhere",
                "Personal chef consultations",
                "Lifetime VIP status",
            ],
        }
    }

    /// 不超过当前积分的最高门槛所对应的等级
    pub fn for_points(points: u64) -> TierLevel {
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|level| points >= level.min_points())
            .unwrap_or(TierLevel::Foodie)
    }

    pub fn next(self) -> Option<TierLevel> {
        let index = Self::ALL.iter().position(|level| *level == self)?;
        Self::ALL.get(index + 1).copied()
    }

    /// 距下一等级的进度（0-100），最高等级恒为100
    pub fn progress(self, points: u64) -> f64 {
        match self.next() {
            Some(next) => {
                let span = (next.min_points() - self.min_points()) as f64;
                let earned = points.saturating_sub(self.min_points()) as f64;
                (earned / span * 100.0).clamp(0.0, 100.0)
            }
            None => 100.0,
        }
    }

    pub fn tier(self) -> Tier {
        Tier {
            id: self,
            name: self.name(),
            min_points: self.min_points(),
            benefits: self.benefits(),
        }
    }
}

impl Tier {
    pub fn all() -> Vec<Tier> {
        TierLevel::ALL.iter().map(|level| level.tier()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_pick_highest_reached() {
        assert_eq!(TierLevel::for_points(0), TierLevel::Foodie);
        assert_eq!(TierLevel::for_points(149), TierLevel::Foodie);
        assert_eq!(TierLevel::for_points(150), TierLevel::Bronze);
        assert_eq!(TierLevel::for_points(687), TierLevel::Platinum);
        assert_eq!(TierLevel::for_points(1050), TierLevel::Legend);
        assert_eq!(TierLevel::for_points(u64::MAX), TierLevel::Legend);
    }

    #[test]
    fn thresholds_are_monotonic() {
        let mins: Vec<u64> = TierLevel::ALL.iter().map(|l| l.min_points()).collect();
        assert!(mins.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn next_tier_and_progress() {
        assert_eq!(TierLevel::Gold.next(), Some(TierLevel::Platinum));
        assert_eq!(TierLevel::Legend.next(), None);

        // 金牌 450 -> 铂金 600
        assert_eq!(TierLevel::Gold.progress(525), 50.0);
        assert_eq!(TierLevel::Legend.progress(5000), 100.0);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TierLevel::Platinum).unwrap(),
            "\"platinum\""
        );
    }
}
