use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;

use crate::models::CheckIn;
use crate::storage::{KeyValueStorage, Staged, StorageError, keys};
use crate::utils::Clock;

/// 单个设备的打卡记录集合
///
/// 启动时从持久化存储加载一次并清理过期记录，之后每次变更都立即写回。
/// 写入成功后才更新内存，写入失败时内存保持原样。
pub struct CheckInStore {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
    key: String,
    expiry: Duration,
    check_ins: Mutex<Vec<CheckIn>>,
    ready: AtomicBool,
}

impl CheckInStore {
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
        owner_id: &str,
        expiry: Duration,
    ) -> Self {
        Self {
            storage,
            clock,
            key: keys::checkins_key(owner_id),
            expiry,
            check_ins: Mutex::new(Vec::new()),
            ready: AtomicBool::new(false),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// 加载持久化的打卡记录，读取或解析失败时视为空
    pub async fn load(&self) {
        let mut check_ins = self.check_ins.lock().await;

        match self.read_persisted().await {
            Ok(Some(stored)) => {
                let now = self.clock.now_millis();
                let total = stored.len();
                let valid: Vec<CheckIn> = stored
                    .into_iter()
                    .filter(|check_in| check_in.is_active(now, self.expiry))
                    .collect();

                if valid.len() != total {
                    tracing::debug!(
                        key = %self.key,
                        evicted = total - valid.len(),
                        "evicting expired check-ins"
                    );
                    if let Err(e) = self.persist(&valid).await {
                        tracing::warn!(key = %self.key, "failed to persist pruned check-ins: {}", e);
                    }
                }
                *check_ins = valid;
            }
            Ok(None) => check_ins.clear(),
            Err(e) => {
                tracing::warn!(key = %self.key, "failed to load check-ins: {}", e);
                check_ins.clear();
            }
        }

        self.ready.store(true, Ordering::Release);
    }

    /// 追加一条打卡记录，同一餐厅可以有多条
    pub async fn add(&self, check_in: CheckIn) -> Result<(), StorageError> {
        let staged = self.stage_add(check_in).await?;
        let (key, json) = staged.entry();
        self.storage.set_item(&key, json).await?;

        let saved = staged.commit();
        if let Some(last) = saved.last() {
            tracing::info!(
                restaurant_id = %last.restaurant_id,
                timestamp = last.timestamp,
                "check-in saved"
            );
        }
        Ok(())
    }

    /// 准备追加一条记录，持久化由调用方完成
    pub(crate) async fn stage_add(
        &self,
        check_in: CheckIn,
    ) -> Result<Staged<'_, Vec<CheckIn>>, StorageError> {
        let check_ins = self.check_ins.lock().await;

        let mut updated = check_ins.clone();
        updated.push(check_in);
        let json = serde_json::to_string(&updated)?;
        Ok(Staged::new(check_ins, updated, &self.key, json))
    }

    pub(crate) fn storage(&self) -> Arc<dyn KeyValueStorage> {
        self.storage.clone()
    }

    pub async fn has_active(&self, restaurant_id: &str) -> bool {
        self.get(restaurant_id).await.is_some()
    }

    /// 按插入顺序返回该餐厅第一条未过期的记录
    pub async fn get(&self, restaurant_id: &str) -> Option<CheckIn> {
        let now = self.clock.now_millis();
        self.check_ins
            .lock()
            .await
            .iter()
            .find(|check_in| {
                check_in.restaurant_id == restaurant_id && check_in.is_active(now, self.expiry)
            })
            .cloned()
    }

    /// 所有未过期的记录
    pub async fn active(&self) -> Vec<CheckIn> {
        let now = self.clock.now_millis();
        self.check_ins
            .lock()
            .await
            .iter()
            .filter(|check_in| check_in.is_active(now, self.expiry))
            .cloned()
            .collect()
    }

    /// 清空内存并删除持久化记录
    pub async fn clear(&self) -> Result<(), StorageError> {
        let mut check_ins = self.check_ins.lock().await;
        self.storage.remove_item(&self.key).await?;
        check_ins.clear();
        Ok(())
    }

    async fn read_persisted(&self) -> Result<Option<Vec<CheckIn>>, StorageError> {
        match self.storage.get_item(&self.key).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn persist(&self, check_ins: &[CheckIn]) -> Result<(), StorageError> {
        let json = serde_json::to_string(check_ins)?;
        self.storage.set_item(&self.key, json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::MapLocation;
    use crate::storage::MemoryStorage;
    use crate::utils::ManualClock;

    const DAY: Duration = Duration::from_secs(24 * 3600);
    const T0: i64 = 1_760_000_000_000;

    fn fixture() -> (Arc<MemoryStorage>, Arc<ManualClock>, CheckInStore) {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(T0));
        let store = CheckInStore::new(storage.clone(), clock.clone(), "device-1", DAY);
        (storage, clock, store)
    }

    fn check_in(restaurant_id: &str, timestamp: i64) -> CheckIn {
        CheckIn::new(restaurant_id, timestamp, MapLocation::new(34.0928, -118.3287))
    }

    #[tokio::test]
    async fn load_marks_ready_even_without_data() {
        let (_, _, store) = fixture();
        assert!(!store.is_ready());
        store.load().await;
        assert!(store.is_ready());
        assert!(store.active().await.is_empty());
    }

    #[tokio::test]
    async fn active_until_expiry_window_elapses() {
        let (_, clock, store) = fixture();
        store.load().await;
        store.add(check_in("1", T0)).await.unwrap();

        assert!(store.has_active("1").await);

        clock.set(T0 + DAY.as_millis() as i64 - 1);
        assert!(store.has_active("1").await);
        assert!(store.get("1").await.is_some());

        clock.set(T0 + DAY.as_millis() as i64);
        assert!(!store.has_active("1").await);
        assert!(store.get("1").await.is_none());
    }

    #[tokio::test]
    async fn add_persists_full_collection() {
        let (storage, _, store) = fixture();
        store.load().await;
        store.add(check_in("1", T0)).await.unwrap();
        store.add(check_in("2", T0 + 10)).await.unwrap();

        let raw = storage.raw(&keys::checkins_key("device-1")).await.unwrap();
        let persisted: Vec<CheckIn> = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted.len(), 2);
        assert!(store.has_active("1").await);
        assert!(store.has_active("2").await);
    }

    #[tokio::test]
    async fn failed_write_leaves_memory_unchanged() {
        let (storage, _, store) = fixture();
        store.load().await;
        storage.set_fail_on_write(true).await;

        assert!(store.add(check_in("1", T0)).await.is_err());
        assert!(!store.has_active("1").await);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let (storage, _, store) = fixture();
        store.load().await;
        store.add(check_in("1", T0)).await.unwrap();
        store.add(check_in("2", T0)).await.unwrap();

        store.clear().await.unwrap();

        assert!(!store.has_active("1").await);
        assert!(!store.has_active("2").await);
        assert!(storage.raw(&keys::checkins_key("device-1")).await.is_none());
    }

    #[tokio::test]
    async fn load_evicts_expired_and_repersists() {
        let (storage, _, store) = fixture();
        let stale = check_in("old", T0 - DAY.as_millis() as i64 - 1);
        let fresh = check_in("new", T0 - 1_000);
        storage
            .insert_raw(
                &keys::checkins_key("device-1"),
                serde_json::to_string(&vec![stale, fresh.clone()]).unwrap(),
            )
            .await;

        store.load().await;

        assert_eq!(store.active().await, vec![fresh.clone()]);
        let raw = storage.raw(&keys::checkins_key("device-1")).await.unwrap();
        let persisted: Vec<CheckIn> = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, vec![fresh]);
    }

    #[tokio::test]
    async fn corrupt_record_loads_as_empty() {
        let (storage, _, store) = fixture();
        storage
            .insert_raw(&keys::checkins_key("device-1"), "{not json")
            .await;

        store.load().await;

        assert!(store.is_ready());
        assert!(store.active().await.is_empty());
        // 原始数据保留
        assert_eq!(
            storage.raw(&keys::checkins_key("device-1")).await.as_deref(),
            Some("{not json")
        );
    }

    #[tokio::test]
    async fn get_returns_first_active_match() {
        let (_, clock, store) = fixture();
        store.load().await;
        let first = check_in("1", T0);
        let second = check_in("1", T0 + 60_000);
        store.add(first.clone()).await.unwrap();
        store.add(second.clone()).await.unwrap();

        assert_eq!(store.get("1").await, Some(first));

        // 第一条过期后返回仍有效的第二条
        clock.set(T0 + DAY.as_millis() as i64);
        assert_eq!(store.get("1").await, Some(second));
    }

    #[tokio::test]
    async fn read_failure_loads_as_empty() {
        let (storage, _, store) = fixture();
        storage
            .insert_raw(
                &keys::checkins_key("device-1"),
                serde_json::to_string(&vec![check_in("1", T0)]).unwrap(),
            )
            .await;
        storage.set_fail_on_get(true).await;

        store.load().await;

        assert!(store.is_ready());
        assert!(store.active().await.is_empty());
        assert!(storage.raw(&keys::checkins_key("device-1")).await.is_some());
    }

    #[tokio::test]
    async fn dropped_stage_changes_nothing() {
        let (storage, _, store) = fixture();
        store.load().await;

        let staged = store.stage_add(check_in("1", T0)).await.unwrap();
        let (key, json) = staged.entry();
        assert_eq!(key, keys::checkins_key("device-1"));
        assert_eq!(serde_json::from_str::<Vec<CheckIn>>(&json).unwrap().len(), 1);
        drop(staged);

        assert!(!store.has_active("1").await);
        assert!(storage.raw(&keys::checkins_key("device-1")).await.is_none());
    }
}
