use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use crate::models::{UserProfile, UserProfileUpdate};
use crate::storage::{KeyValueStorage, Staged, StorageError, keys};
use crate::utils::Clock;

/// 单个设备的会员资料
///
/// 积分与计数只增不减，唯一的例外是 `clear` 恢复默认值。
pub struct UserRewardsStore {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
    owner_id: String,
    key: String,
    profile: Mutex<UserProfile>,
    ready: AtomicBool,
}

impl UserRewardsStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, clock: Arc<dyn Clock>, owner_id: &str) -> Self {
        let defaults = UserProfile::with_defaults(owner_id, clock.now_millis());
        Self {
            storage,
            clock,
            owner_id: owner_id.to_string(),
            key: keys::user_profile_key(owner_id),
            profile: Mutex::new(defaults),
            ready: AtomicBool::new(false),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// 从存储恢复资料，缺失或损坏时使用默认值
    pub async fn load(&self) {
        let mut profile = self.profile.lock().await;

        let loaded = match self.storage.get_item(&self.key).await {
            Ok(Some(json)) => match serde_json::from_str::<UserProfile>(&json) {
                Ok(stored) => Some(stored),
                Err(e) => {
                    tracing::warn!(key = %self.key, "failed to parse user data: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key = %self.key, "failed to load user data: {}", e);
                None
            }
        };

        *profile = loaded.unwrap_or_else(|| self.defaults());
        profile.sync_tier();
        self.ready.store(true, Ordering::Release);
    }

    pub async fn profile(&self) -> UserProfile {
        self.profile.lock().await.clone()
    }

    /// 合并可编辑字段并写回，写入失败时返回错误
    pub async fn update(&self, update: UserProfileUpdate) -> Result<UserProfile, StorageError> {
        self.mutate(|profile| profile.apply(update)).await
    }

    /// 增加积分，同时打卡次数加一
    pub async fn add_points(&self, amount: u64) -> Result<UserProfile, StorageError> {
        self.mutate(|profile| award(profile, amount)).await
    }

    /// 准备入账积分，持久化由调用方完成
    pub(crate) async fn stage_points(
        &self,
        amount: u64,
    ) -> Result<Staged<'_, UserProfile>, StorageError> {
        self.stage(|profile| award(profile, amount)).await
    }

    pub async fn add_review(&self) -> Result<UserProfile, StorageError> {
        self.mutate(|profile| {
            profile.total_reviews = profile.total_reviews.saturating_add(1);
        })
        .await
    }

    /// 恢复默认资料并删除持久化记录
    pub async fn clear(&self) -> Result<(), StorageError> {
        let mut profile = self.profile.lock().await;
        self.storage.remove_item(&self.key).await?;
        *profile = self.defaults();
        Ok(())
    }

    fn defaults(&self) -> UserProfile {
        UserProfile::with_defaults(self.owner_id.as_str(), self.clock.now_millis())
    }

    async fn stage<F>(&self, change: F) -> Result<Staged<'_, UserProfile>, StorageError>
    where
        F: FnOnce(&mut UserProfile),
    {
        let profile = self.profile.lock().await;

        let mut updated = profile.clone();
        change(&mut updated);
        updated.sync_tier();

        let json = serde_json::to_string(&updated)?;
        Ok(Staged::new(profile, updated, &self.key, json))
    }

    async fn mutate<F>(&self, change: F) -> Result<UserProfile, StorageError>
    where
        F: FnOnce(&mut UserProfile),
    {
        let staged = self.stage(change).await?;
        let (key, json) = staged.entry();
        self.storage.set_item(&key, json).await?;

        let updated = staged.commit();
        tracing::debug!(
            user_id = %updated.id,
            points = updated.points,
            tier = ?updated.tier,
            "user data updated"
        );
        Ok(updated)
    }
}

fn award(profile: &mut UserProfile, amount: u64) {
    profile.points = profile.points.saturating_add(amount);
    profile.total_checkins = profile.total_checkins.saturating_add(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TierLevel;
    use crate::storage::MemoryStorage;
    use crate::utils::ManualClock;

    fn fixture() -> (Arc<MemoryStorage>, UserRewardsStore) {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(1_760_000_000_000));
        let store = UserRewardsStore::new(storage.clone(), clock, "device-1");
        (storage, store)
    }

    #[tokio::test]
    async fn add_points_counts_one_checkin() {
        let (_, store) = fixture();
        store.load().await;
        store.add_review().await.unwrap();

        let before = store.profile().await;
        let after = store.add_points(100).await.unwrap();

        assert_eq!(after.points, before.points + 100);
        assert_eq!(after.total_checkins, before.total_checkins + 1);
        assert_eq!(after.total_reviews, before.total_reviews);
    }

    #[tokio::test]
    async fn tier_follows_points() {
        let (_, store) = fixture();
        store.load().await;
        store.add_points(100).await.unwrap();
        let profile = store.add_points(100).await.unwrap();

        assert_eq!(profile.points, 200);
        assert_eq!(profile.tier, TierLevel::Bronze);
    }

    #[tokio::test]
    async fn load_restores_persisted_profile() {
        let (storage, store) = fixture();
        store.load().await;
        store.add_points(450).await.unwrap();

        let clock = Arc::new(ManualClock::new(0));
        let reloaded = UserRewardsStore::new(storage.clone(), clock, "device-1");
        reloaded.load().await;

        let profile = reloaded.profile().await;
        assert_eq!(profile.points, 450);
        assert_eq!(profile.total_checkins, 1);
        assert_eq!(profile.tier, TierLevel::Gold);
    }

    #[tokio::test]
    async fn stored_tier_is_rederived_on_load() {
        let (storage, store) = fixture();
        let mut tampered = UserProfile::with_defaults("device-1", 0);
        tampered.points = 10;
        tampered.tier = TierLevel::Legend;
        storage
            .insert_raw(
                &keys::user_profile_key("device-1"),
                serde_json::to_string(&tampered).unwrap(),
            )
            .await;

        store.load().await;

        assert_eq!(store.profile().await.tier, TierLevel::Foodie);
    }

    #[tokio::test]
    async fn corrupt_record_falls_back_to_defaults() {
        let (storage, store) = fixture();
        storage
            .insert_raw(&keys::user_profile_key("device-1"), "[]")
            .await;

        store.load().await;

        let profile = store.profile().await;
        assert!(store.is_ready());
        assert_eq!(profile.id, "device-1");
        assert_eq!(profile.points, 0);
    }

    #[tokio::test]
    async fn read_failure_falls_back_to_defaults() {
        let (storage, store) = fixture();
        let mut saved = UserProfile::with_defaults("device-1", 0);
        saved.points = 600;
        storage
            .insert_raw(
                &keys::user_profile_key("device-1"),
                serde_json::to_string(&saved).unwrap(),
            )
            .await;
        storage.set_fail_on_get(true).await;

        store.load().await;

        assert!(store.is_ready());
        assert_eq!(store.profile().await.points, 0);
    }

    #[tokio::test]
    async fn update_merges_and_persists() {
        let (storage, store) = fixture();
        store.load().await;
        store.add_points(100).await.unwrap();

        let profile = store
            .update(UserProfileUpdate {
                name: Some("Ana".into()),
                email: Some("ana@example.com".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(profile.name, "Ana");
        assert_eq!(profile.points, 100);

        let raw = storage
            .raw(&keys::user_profile_key("device-1"))
            .await
            .unwrap();
        let persisted: UserProfile = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, profile);
    }

    #[tokio::test]
    async fn update_failure_is_reported_and_not_applied() {
        let (storage, store) = fixture();
        store.load().await;
        storage.set_fail_on_write(true).await;

        let result = store
            .update(UserProfileUpdate {
                name: Some("Ana".into()),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(StorageError::Backend(_))));
        assert_eq!(store.profile().await.name, "");
    }

    #[tokio::test]
    async fn clear_resets_counters() {
        let (storage, store) = fixture();
        store.load().await;
        store.add_points(300).await.unwrap();
        store.add_review().await.unwrap();

        store.clear().await.unwrap();

        let profile = store.profile().await;
        assert_eq!(profile.points, 0);
        assert_eq!(profile.total_checkins, 0);
        assert_eq!(profile.total_reviews, 0);
        assert!(storage
            .raw(&keys::user_profile_key("device-1"))
            .await
            .is_none());
    }
}
