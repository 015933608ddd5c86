//! 本地持久化存储
//!
//! 以字符串键值对保存 JSON 记录，生产环境使用 Redis，测试使用内存实现。

use async_trait::async_trait;
use tokio::sync::MutexGuard;

pub mod keys;
pub mod memory;
pub mod redis;

pub use memory::MemoryStorage;
pub use self::redis::RedisStorage;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<::redis::RedisError> for StorageError {
    fn from(err: ::redis::RedisError) -> Self {
        StorageError::Backend(err.to_string())
    }
}

/// 键值存储，每个操作在底层读写完成后才返回
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    async fn set_item(&self, key: &str, value: String) -> Result<()>;

    /// 一次写入多条记录，要么全部成功，要么全部不生效
    async fn set_items(&self, items: Vec<(String, String)>) -> Result<()>;

    async fn remove_item(&self, key: &str) -> Result<()>;
}

/// 已序列化但尚未提交到内存的变更
///
/// 持有内存状态的锁，直到 `commit` 或被丢弃。持久化成功后再 `commit`。
pub(crate) struct Staged<'a, T> {
    guard: MutexGuard<'a, T>,
    updated: T,
    key: String,
    json: String,
}

impl<'a, T> Staged<'a, T> {
    pub(crate) fn new(guard: MutexGuard<'a, T>, updated: T, key: &str, json: String) -> Self {
        Self {
            guard,
            updated,
            key: key.to_string(),
            json,
        }
    }

    /// 待写入的键值对
    pub(crate) fn entry(&self) -> (String, String) {
        (self.key.clone(), self.json.clone())
    }

    pub(crate) fn commit(mut self) -> T
    where
        T: Clone,
    {
        *self.guard = self.updated.clone();
        self.updated
    }
}
