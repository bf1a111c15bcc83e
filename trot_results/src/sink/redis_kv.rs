//! Key-value backend: each performance is a JSON string under `{prefix}:{id}`.

use async_trait::async_trait;
use lib_common::connections::CacheHandler;

use super::{PerformanceStore, StoreError};
use crate::performance::StoredPerformance;

pub struct RedisStore {
    cache: CacheHandler,
    prefix: String,
}

impl RedisStore {
    pub fn new(cache: CacheHandler, prefix: impl Into<String>) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
        }
    }

    pub fn key_for(&self, record: &StoredPerformance) -> String {
        record_key(&self.prefix, record)
    }
}

fn record_key(prefix: &str, record: &StoredPerformance) -> String {
    format!("{}:{}", prefix, record.id)
}

#[async_trait]
impl PerformanceStore for RedisStore {
    async fn put(&self, record: &StoredPerformance) -> Result<(), StoreError> {
        let value = serde_json::to_string(record)?;
        self.cache.set_string(&self.key_for(record), &value).await?;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "redis"
    }
}
