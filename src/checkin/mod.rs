// 打卡模块
// 打卡记录的持久化与有效期判断

pub mod store;

pub use store::CheckInStore;
