//! In-process backend keeping every record in a vector.
//!
//! Used by tests and by embedders that want the records back instead of
//! persisting them. An optional predicate makes chosen writes fail.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::{PerformanceStore, StoreError};
use crate::performance::StoredPerformance;

type FailWhen = Box<dyn Fn(&StoredPerformance) -> bool + Send + Sync>;

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<StoredPerformance>>,
    fail_when: Option<FailWhen>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store rejecting every record for which `predicate` holds.
    pub fn failing_on<F>(predicate: F) -> Self
    where
        F: Fn(&StoredPerformance) -> bool + Send + Sync + 'static,
    {
        Self {
            records: Mutex::new(Vec::new()),
            fail_when: Some(Box::new(predicate)),
        }
    }

    /// Snapshot of the records written so far, in completion order.
    pub fn records(&self) -> Vec<StoredPerformance> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl PerformanceStore for MemoryStore {
    async fn put(&self, record: &StoredPerformance) -> Result<(), StoreError> {
        if self.fail_when.as_ref().is_some_and(|fail| fail(record)) {
            return Err(StoreError::Rejected(format!("record {}", record.id)));
        }
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}
