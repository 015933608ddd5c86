//! 扫码打卡流程
//!
//! 状态机：`Idle → Scanning → Resolving → LocationCheck → Committing → Verified | Rejected`。
//! 同一时间只处理一次扫码，处理中的重复扫码直接忽略。扫码的 future 在
//! 提交前被丢弃（用户离开页面）时，状态机回到 `Idle` 且没有任何写入；
//! 一旦开始提交，打卡与积分会一起完成或一起失败。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::catalog::RestaurantCatalog;
use crate::checkin::CheckInStore;
use crate::common::MapLocation;
use crate::config::CheckInPolicy;
use crate::models::{CheckIn, Restaurant};
use crate::storage::StorageError;
use crate::user::UserRewardsStore;
use crate::utils::Clock;

pub mod device;
mod rejection;

pub use device::{
    LocationProvider, LocationUnavailable, PermissionProvider, PermissionStatus, ReportedDevice,
};
pub use rejection::Rejection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Idle,
    Scanning,
    Resolving,
    LocationCheck,
    /// 写入打卡与积分，只有提交任务能离开这个状态
    Committing,
    Verified,
    Rejected,
}

impl FlowState {
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            FlowState::Scanning
                | FlowState::Resolving
                | FlowState::LocationCheck
                | FlowState::Committing
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, FlowState::Verified | FlowState::Rejected)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Verified {
        restaurant: Restaurant,
        points_earned: u64,
        check_in: CheckIn,
    },
    Rejected(Rejection),
    /// 已有扫码正在处理
    Ignored,
}

fn lock(state: &Mutex<FlowState>) -> MutexGuard<'_, FlowState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 处理中的扫码，未到达终态就被丢弃时把状态机复位
///
/// 进入提交阶段后所有权移交给提交任务，调用方放弃也不会提前复位。
struct InFlight {
    state: Arc<Mutex<FlowState>>,
    finished: bool,
}

impl InFlight {
    fn enter(&self, next: FlowState) {
        *lock(&self.state) = next;
    }

    fn finish(mut self, terminal: FlowState) {
        *lock(&self.state) = terminal;
        self.finished = true;
    }

    fn reject(self, rejection: Rejection) -> ScanOutcome {
        self.finish(FlowState::Rejected);
        ScanOutcome::Rejected(rejection)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.finished {
            *lock(&self.state) = FlowState::Idle;
            tracing::debug!("scan abandoned before completion");
        }
    }
}

pub struct CheckInFlow {
    catalog: Arc<dyn RestaurantCatalog>,
    check_ins: Arc<CheckInStore>,
    rewards: Arc<UserRewardsStore>,
    clock: Arc<dyn Clock>,
    policy: CheckInPolicy,
    state: Arc<Mutex<FlowState>>,
}

impl CheckInFlow {
    pub fn new(
        catalog: Arc<dyn RestaurantCatalog>,
        check_ins: Arc<CheckInStore>,
        rewards: Arc<UserRewardsStore>,
        clock: Arc<dyn Clock>,
        policy: CheckInPolicy,
    ) -> Self {
        Self {
            catalog,
            check_ins,
            rewards,
            clock,
            policy,
            state: Arc::new(Mutex::new(FlowState::Idle)),
        }
    }

    pub fn state(&self) -> FlowState {
        *lock(&self.state)
    }

    pub fn policy(&self) -> CheckInPolicy {
        self.policy
    }

    /// 终态复位为 `Idle`，处理中的扫码不受影响
    pub fn reset(&self) -> bool {
        let mut state = lock(&self.state);
        if state.is_terminal() {
            *state = FlowState::Idle;
            true
        } else {
            false
        }
    }

    /// `permission_denied` 之后由调用方发起授权请求
    pub async fn request_permission(&self, permission: &dyn PermissionProvider) -> PermissionStatus {
        permission.request().await
    }

    /// 处理一次扫码，`payload` 应为餐厅 ID
    pub async fn handle_scan(
        &self,
        payload: &str,
        location: &dyn LocationProvider,
        permission: &dyn PermissionProvider,
    ) -> ScanOutcome {
        let Some(in_flight) = self.begin() else {
            tracing::debug!(payload = %payload, "scan ignored, another scan is in flight");
            return ScanOutcome::Ignored;
        };

        let outcome = self.run(in_flight, payload, location, permission).await;

        if let ScanOutcome::Rejected(rejection) = &outcome {
            tracing::info!(
                payload = %payload,
                reason = rejection.reason(),
                "check-in rejected: {}",
                rejection
            );
        }
        outcome
    }

    fn begin(&self) -> Option<InFlight> {
        let mut state = lock(&self.state);
        if state.is_in_flight() {
            return None;
        }
        *state = FlowState::Scanning;
        Some(InFlight {
            state: self.state.clone(),
            finished: false,
        })
    }

    async fn run(
        &self,
        in_flight: InFlight,
        payload: &str,
        location: &dyn LocationProvider,
        permission: &dyn PermissionProvider,
    ) -> ScanOutcome {
        tracing::info!(payload = %payload, "QR code scanned");
        self.ensure_loaded().await;

        in_flight.enter(FlowState::Resolving);
        let restaurant_id = payload.trim();
        if restaurant_id.is_empty() {
            return in_flight.reject(Rejection::InvalidCode);
        }
        let restaurant = match self.catalog.find_by_id(restaurant_id).await {
            Ok(Some(restaurant)) => restaurant,
            Ok(None) => return in_flight.reject(Rejection::InvalidCode),
            Err(e) => {
                // 目录不可用时无法确认二维码，仍按无效码处理
                tracing::warn!(restaurant_id = %restaurant_id, "restaurant lookup failed: {}", e);
                return in_flight.reject(Rejection::InvalidCode);
            }
        };

        let status = permission.status().await;
        if status != PermissionStatus::Granted {
            return in_flight.reject(Rejection::PermissionDenied { status });
        }

        in_flight.enter(FlowState::LocationCheck);
        let position = match location.current_position().await {
            Ok(position) => position,
            Err(LocationUnavailable) => {
                return in_flight.reject(Rejection::LocationUnavailable);
            }
        };

        let distance_meters = position.distance_to(&restaurant.location());
        if distance_meters > self.policy.radius_meters {
            return in_flight.reject(Rejection::TooFar { distance_meters });
        }

        self.commit(in_flight, restaurant, position).await
    }

    async fn ensure_loaded(&self) {
        if !self.check_ins.is_ready() {
            self.check_ins.load().await;
        }
        if !self.rewards.is_ready() {
            self.rewards.load().await;
        }
    }

    /// 写入打卡并入账积分
    ///
    /// 两条记录在一次原子写入中落盘，之后才更新内存。提交在独立任务中
    /// 执行，调用方中途放弃时状态机保持 `Committing` 直到任务结束。
    async fn commit(
        &self,
        in_flight: InFlight,
        restaurant: Restaurant,
        position: MapLocation,
    ) -> ScanOutcome {
        let check_in = CheckIn::new(restaurant.id.clone(), self.clock.now_millis(), position);
        let points_earned = self.policy.reward_points;
        let check_ins = self.check_ins.clone();
        let rewards = self.rewards.clone();

        in_flight.enter(FlowState::Committing);
        let task = tokio::spawn(async move {
            let result = persist_check_in(&check_ins, &rewards, check_in.clone(), points_earned).await;
            match result {
                Ok(()) => {
                    in_flight.finish(FlowState::Verified);
                    Ok(check_in)
                }
                Err(e) => {
                    tracing::error!(
                        restaurant_id = %check_in.restaurant_id,
                        "failed to record check-in: {}",
                        e
                    );
                    in_flight.finish(FlowState::Rejected);
                    Err(Rejection::PersistenceFailed)
                }
            }
        });

        match task.await {
            Ok(Ok(check_in)) => {
                tracing::info!(
                    restaurant_id = %restaurant.id,
                    points_earned,
                    "check-in verified"
                );
                ScanOutcome::Verified {
                    restaurant,
                    points_earned,
                    check_in,
                }
            }
            Ok(Err(rejection)) => ScanOutcome::Rejected(rejection),
            Err(e) => {
                tracing::error!("check-in commit task failed: {}", e);
                ScanOutcome::Rejected(Rejection::PersistenceFailed)
            }
        }
    }
}

/// 打卡记录与积分一起写入，任一失败则两者都不生效
async fn persist_check_in(
    check_ins: &CheckInStore,
    rewards: &UserRewardsStore,
    check_in: CheckIn,
    points: u64,
) -> Result<(), StorageError> {
    let staged_check_ins = check_ins.stage_add(check_in).await?;
    let staged_profile = rewards.stage_points(points).await?;

    check_ins
        .storage()
        .set_items(vec![staged_check_ins.entry(), staged_profile.entry()])
        .await?;

    staged_check_ins.commit();
    staged_profile.commit();
    Ok(())
}
