//! Dry-run backend printing one JSON document per line.

use std::io::Write;

use async_trait::async_trait;

use super::{PerformanceStore, StoreError};
use crate::performance::StoredPerformance;

#[derive(Debug, Default)]
pub struct StdoutStore;

impl StdoutStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PerformanceStore for StdoutStore {
    async fn put(&self, record: &StoredPerformance) -> Result<(), StoreError> {
        let line = serde_json::to_string(record)?;
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", line)?;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "stdout"
    }
}
