//! 内存存储，用于测试以及没有 Redis 的本地运行

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{KeyValueStorage, Result, StorageError};

/// 可注入故障的内存存储
#[derive(Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
    fail_on_get: RwLock<bool>,
    fail_on_write: RwLock<bool>,
    fail_on_write_key: RwLock<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_get(&self, fail: bool) {
        *self.fail_on_get.write().await = fail;
    }

    /// 所有 `set_item`/`remove_item` 都失败
    pub async fn set_fail_on_write(&self, fail: bool) {
        *self.fail_on_write.write().await = fail;
    }

    /// 只让指定键的写入失败
    pub async fn set_fail_on_write_key(&self, key: Option<String>) {
        *self.fail_on_write_key.write().await = key;
    }

    /// 直接读取原始值，不受故障注入影响
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.items.read().await.get(key).cloned()
    }

    pub async fn insert_raw(&self, key: &str, value: impl Into<String>) {
        self.items.write().await.insert(key.to_string(), value.into());
    }

    async fn check_write(&self, key: &str) -> Result<()> {
        if *self.fail_on_write.read().await {
            return Err(StorageError::Backend("write rejected".into()));
        }
        if self.fail_on_write_key.read().await.as_deref() == Some(key) {
            return Err(StorageError::Backend(format!("write rejected for {key}")));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        if *self.fail_on_get.read().await {
            return Err(StorageError::Backend("read rejected".into()));
        }
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> Result<()> {
        self.check_write(key).await?;
        self.items.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn set_items(&self, items: Vec<(String, String)>) -> Result<()> {
        for (key, _) in &items {
            self.check_write(key).await?;
        }
        let mut stored = self.items.write().await;
        for (key, value) in items {
            stored.insert(key, value);
        }
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.check_write(key).await?;
        self.items.write().await.remove(key);
        Ok(())
    }
}
