//! 设备会话
//!
//! 每个设备拥有一份打卡记录、一份会员资料和一个打卡状态机，
//! 首次访问时构建并从存储加载，之后在进程内复用。闲置超时的会话会被
//! 回收，再次访问时从存储重建。

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::catalog::RestaurantCatalog;
use crate::checkin::CheckInStore;
use crate::config::CheckInPolicy;
use crate::flow::CheckInFlow;
use crate::models::{MAX_RATING, Review, ReviewDraft};
use crate::storage::{KeyValueStorage, StorageError};
use crate::user::UserRewardsStore;
use crate::utils::Clock;

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("You must scan the QR code at this restaurant before writing a review.")]
    CheckInRequired,

    #[error("rating must be between 1 and 8, got {0}")]
    InvalidRating(u8),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct DeviceSession {
    pub device_id: String,
    pub check_ins: Arc<CheckInStore>,
    pub rewards: Arc<UserRewardsStore>,
    pub flow: CheckInFlow,
    clock: Arc<dyn Clock>,
    last_seen: AtomicI64,
}

impl DeviceSession {
    pub fn new(
        device_id: &str,
        storage: Arc<dyn KeyValueStorage>,
        catalog: Arc<dyn RestaurantCatalog>,
        clock: Arc<dyn Clock>,
        policy: CheckInPolicy,
    ) -> Self {
        let check_ins = Arc::new(CheckInStore::new(
            storage.clone(),
            clock.clone(),
            device_id,
            policy.expiry,
        ));
        let rewards = Arc::new(UserRewardsStore::new(storage, clock.clone(), device_id));
        let flow = CheckInFlow::new(
            catalog,
            check_ins.clone(),
            rewards.clone(),
            clock.clone(),
            policy,
        );

        Self {
            device_id: device_id.to_string(),
            check_ins,
            rewards,
            flow,
            last_seen: AtomicI64::new(clock.now_millis()),
            clock,
        }
    }

    fn touch(&self) {
        self.last_seen.store(self.clock.now_millis(), Ordering::Relaxed);
    }

    fn idle_for(&self, now: i64) -> i64 {
        now - self.last_seen.load(Ordering::Relaxed)
    }

    pub async fn load(&self) {
        self.check_ins.load().await;
        self.rewards.load().await;
    }

    /// 提交点评，需要该餐厅有未过期的打卡
    pub async fn submit_review(&self, draft: ReviewDraft) -> Result<Review, ReviewError> {
        if draft.rating == 0 || draft.rating > MAX_RATING {
            return Err(ReviewError::InvalidRating(draft.rating));
        }
        if !self.check_ins.has_active(&draft.restaurant_id).await {
            return Err(ReviewError::CheckInRequired);
        }

        self.rewards.add_review().await?;

        let review = Review {
            id: Uuid::new_v4().to_string(),
            restaurant_id: draft.restaurant_id,
            rating: draft.rating,
            text: draft.text.trim().to_string(),
            visibility: draft.visibility,
            created_at: self.clock.now_millis(),
        };
        tracing::info!(
            device_id = %self.device_id,
            restaurant_id = %review.restaurant_id,
            rating = review.rating,
            visibility = ?review.visibility,
            "review submitted"
        );
        Ok(review)
    }
}

/// 默认闲置回收时间
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

/// 按设备 ID 缓存的会话
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<DeviceSession>>>,
    storage: Arc<dyn KeyValueStorage>,
    catalog: Arc<dyn RestaurantCatalog>,
    clock: Arc<dyn Clock>,
    policy: CheckInPolicy,
    idle_ttl: Duration,
}

impl SessionRegistry {
    pub fn new(
        storage: Arc<dyn KeyValueStorage>,
        catalog: Arc<dyn RestaurantCatalog>,
        clock: Arc<dyn Clock>,
        policy: CheckInPolicy,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            storage,
            catalog,
            clock,
            policy,
            idle_ttl: DEFAULT_IDLE_TTL,
        }
    }

    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// 获取设备会话，不存在时创建并加载
    pub async fn session(&self, device_id: &str) -> Arc<DeviceSession> {
        if let Some(session) = self.sessions.read().await.get(device_id) {
            session.touch();
            return session.clone();
        }

        // 加载期间不持有锁，并发创建时以先插入的为准
        let loaded = Arc::new(DeviceSession::new(
            device_id,
            self.storage.clone(),
            self.catalog.clone(),
            self.clock.clone(),
            self.policy,
        ));
        loaded.load().await;

        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(device_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(device_id = %device_id, "device session opened");
                loaded
            })
            .clone();
        session.touch();
        session
    }

    /// 回收闲置超时的会话，返回回收数量
    ///
    /// 仍被请求持有或有扫码在处理的会话保留。
    pub async fn evict_idle(&self) -> usize {
        let now = self.clock.now_millis();
        let ttl = self.idle_ttl.as_millis() as i64;

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| {
            Arc::strong_count(session) > 1
                || session.flow.state().is_in_flight()
                || session.idle_for(now) < ttl
        });
        let evicted = before - sessions.len();

        if evicted > 0 {
            tracing::debug!(evicted, remaining = sessions.len(), "evicted idle device sessions");
        }
        evicted
    }

    /// 后台定期回收闲置会话
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let registry = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                registry.evict_idle().await;
            }
        })
    }
}
