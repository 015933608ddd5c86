// 用户模块
// 会员资料、积分与等级计数

pub mod store;

pub use store::UserRewardsStore;
