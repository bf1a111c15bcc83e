//! # Performance Sink
//!
//! Persists performance records through a pluggable [`PerformanceStore`].
//!
//! ## Write semantics:
//! - every record gets a fresh random id right before it is written,
//! - one write per record, all issued concurrently,
//! - no atomicity: some records may land while others fail,
//! - no idempotence: re-running a day stores it again.
//!
//! What happens to failed writes is an explicit [`WritePolicy`]. The default,
//! `BestEffort`, counts and logs them and reports success anyway.
//!
//! ## Backends:
//! - **`postgres`**: one row per record in a configured table.
//! - **`redis_kv`**: one `SET table:id json` per record.
//! - **`stdout`**: JSON lines on standard output, for dry runs.
//! - **`memory`**: an in-process vector, only handed in through
//!   `Pipeline::with_store`; no store URI selects it.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use lib_common::connections::{mask_url_password, CacheError, CacheHandler, Database, DbError};
use thiserror::Error;
use tracing::{debug, info};

use crate::performance::{Performance, StoredPerformance};

pub mod memory;
pub mod postgres;
pub mod redis_kv;
pub mod stdout;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use redis_kv::RedisStore;
pub use stdout::StdoutStore;

/// A single write failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] DbError),
    #[error("key-value store error: {0}")]
    Cache(#[from] CacheError),
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("write rejected: {0}")]
    Rejected(String),
    #[error("unsupported store URI '{0}' (expected postgres://, redis:// or stdout)")]
    UnsupportedUri(String),
    #[error("invalid store target '{0}': must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidTarget(String),
}

/// Batch-level failure, only raised under [`WritePolicy::Strict`].
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("{} of {} performance writes failed", .0.failed, .0.attempted)]
    PartialWrite(WriteReport),
}

/// Durable storage accepting one performance at a time.
#[async_trait]
pub trait PerformanceStore: Send + Sync {
    /// Writes one record.
    async fn put(&self, record: &StoredPerformance) -> Result<(), StoreError>;

    /// Backend name for logging.
    fn backend_type(&self) -> &'static str;
}

/// What a batch does about individual write failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Failed writes are counted and logged; the batch still succeeds.
    #[default]
    BestEffort,
    /// The batch fails if any write failed. Successful writes are kept.
    Strict,
}

impl FromStr for WritePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "best-effort" | "besteffort" => Ok(Self::BestEffort),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown write policy '{}' (expected best-effort or strict)", other)),
        }
    }
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BestEffort => f.write_str("best-effort"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

/// Outcome counts of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub attempted: usize,
    pub written: usize,
    pub failed: usize,
}

/// Writes batches of performances to a store.
#[derive(Clone)]
pub struct Sink {
    store: Arc<dyn PerformanceStore>,
    policy: WritePolicy,
}

impl Sink {
    pub fn new(store: Arc<dyn PerformanceStore>, policy: WritePolicy) -> Self {
        Self { store, policy }
    }

    pub fn backend_type(&self) -> &'static str {
        self.store.backend_type()
    }

    /// Assigns ids and writes every performance concurrently.
    pub async fn store_performances(&self, performances: Vec<Performance>) -> Result<WriteReport, SinkError> {
        let records: Vec<StoredPerformance> = performances.into_iter().map(StoredPerformance::new).collect();
        let outcomes = join_all(records.iter().map(|record| self.store.put(record))).await;

        let mut report = WriteReport {
            attempted: records.len(),
            ..WriteReport::default()
        };
        for (record, outcome) in records.iter().zip(outcomes) {
            match outcome {
                Ok(()) => report.written += 1,
                Err(e) => {
                    report.failed += 1;
                    debug!(id = %record.id, name = %record.performance.name, error = %e, "Performance write failed");
                }
            }
        }

        info!(
            backend = self.store.backend_type(),
            policy = %self.policy,
            attempted = report.attempted,
            written = report.written,
            failed = report.failed,
            "Stored performances"
        );

        match self.policy {
            WritePolicy::Strict if report.failed > 0 => Err(SinkError::PartialWrite(report)),
            _ => Ok(report),
        }
    }
}

/// Default table / key prefix for stored performances.
pub const DEFAULT_STORE_TARGET: &str = "horse_performances";

/// Which backend a store URI selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Redis,
    Stdout,
}

impl StoreKind {
    /// Classifies a store URI by its scheme.
    pub fn from_uri(uri: &str) -> Option<Self> {
        let scheme = match uri.split_once("://") {
            Some((scheme, _)) => scheme,
            None => uri,
        };
        match scheme.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "redis" | "rediss" => Some(Self::Redis),
            "stdout" => Some(Self::Stdout),
            _ => None,
        }
    }
}

/// True if `name` can be used unquoted as a table name or key prefix.
pub fn is_valid_target(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Opens the backend selected by `uri`.
///
/// SQL backends are pinged and get their table created before this returns,
/// so an unreachable store fails here rather than on the first write.
pub async fn open_store(
    uri: &str,
    target: &str,
    max_connections: usize,
) -> Result<Arc<dyn PerformanceStore>, StoreError> {
    if !is_valid_target(target) {
        return Err(StoreError::InvalidTarget(target.to_string()));
    }
    let kind = StoreKind::from_uri(uri).ok_or_else(|| StoreError::UnsupportedUri(mask_url_password(uri)))?;
    info!(backend = ?kind, uri = %mask_url_password(uri), store_target = target, "Opening performance store");

    let store: Arc<dyn PerformanceStore> = match kind {
        StoreKind::Postgres => {
            let db = Database::new(uri, max_connections)?;
            Arc::new(PostgresStore::connect(db, target).await?)
        }
        StoreKind::Redis => {
            let cache = CacheHandler::connect(uri).await?;
            Arc::new(RedisStore::new(cache, target))
        }
        StoreKind::Stdout => Arc::new(StdoutStore::new()),
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn performances(names: &[&str]) -> Vec<Performance> {
        names
            .iter()
            .map(|name| Performance {
                name: name.to_string(),
                winner: false,
                coach: String::new(),
                driver: String::new(),
                date: 0,
            })
            .collect()
    }

    #[test]
    fn parses_write_policy() {
        assert_eq!("best-effort".parse::<WritePolicy>(), Ok(WritePolicy::BestEffort));
        assert_eq!("BEST_EFFORT".parse::<WritePolicy>(), Ok(WritePolicy::BestEffort));
        assert_eq!(" strict ".parse::<WritePolicy>(), Ok(WritePolicy::Strict));
        assert!("sometimes".parse::<WritePolicy>().is_err());
        assert_eq!(WritePolicy::default(), WritePolicy::BestEffort);
    }

    #[test]
    fn classifies_store_uris() {
        assert_eq!(StoreKind::from_uri("postgres://u:p@db/x"), Some(StoreKind::Postgres));
        assert_eq!(StoreKind::from_uri("postgresql://db/x"), Some(StoreKind::Postgres));
        assert_eq!(StoreKind::from_uri("redis://127.0.0.1/0"), Some(StoreKind::Redis));
        assert_eq!(StoreKind::from_uri("rediss://cache:6380"), Some(StoreKind::Redis));
        assert_eq!(StoreKind::from_uri("stdout"), Some(StoreKind::Stdout));
        assert_eq!(StoreKind::from_uri("memory"), None);
        assert_eq!(StoreKind::from_uri("memory://"), None);
        assert_eq!(StoreKind::from_uri("mongodb://db"), None);
    }

    #[test]
    fn validates_target_names() {
        assert!(is_valid_target(DEFAULT_STORE_TARGET));
        assert!(is_valid_target("_t1"));
        assert!(!is_valid_target(""));
        assert!(!is_valid_target("1table"));
        assert!(!is_valid_target("perf; DROP TABLE x"));
        assert!(!is_valid_target("with-dash"));
    }

    #[tokio::test]
    async fn open_store_rejects_bad_input() {
        let err = open_store("stdout", "bad name", 1).await.err().unwrap();
        assert!(matches!(err, StoreError::InvalidTarget(_)));

        let err = open_store("mongodb://u:secret@db", DEFAULT_STORE_TARGET, 1).await.err().unwrap();
        match err {
            StoreError::UnsupportedUri(uri) => assert!(!uri.contains("secret")),
            other => panic!("unexpected error {other:?}"),
        }

        let err = open_store("memory", DEFAULT_STORE_TARGET, 1).await.err().unwrap();
        assert!(matches!(err, StoreError::UnsupportedUri(_)));

        let store = open_store("stdout", DEFAULT_STORE_TARGET, 1).await.unwrap();
        assert_eq!(store.backend_type(), "stdout");
    }

    #[tokio::test]
    async fn best_effort_swallows_failed_writes() {
        let store = Arc::new(MemoryStore::failing_on(|record| record.performance.name == "bad"));
        let sink = Sink::new(store.clone(), WritePolicy::BestEffort);

        let report = sink.store_performances(performances(&["a", "bad", "b"])).await.unwrap();

        assert_eq!(report, WriteReport { attempted: 3, written: 2, failed: 1 });
        let names: Vec<String> = store.records().into_iter().map(|r| r.performance.name).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"a".to_string()) && names.contains(&"b".to_string()));
    }

    #[tokio::test]
    async fn strict_reports_partial_writes() {
        let store = Arc::new(MemoryStore::failing_on(|record| record.performance.name == "bad"));
        let sink = Sink::new(store.clone(), WritePolicy::Strict);

        let err = sink.store_performances(performances(&["a", "bad"])).await.unwrap_err();

        let SinkError::PartialWrite(report) = err;
        assert_eq!(report, WriteReport { attempted: 2, written: 1, failed: 1 });
        // No rollback of the write that succeeded.
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let store = Arc::new(MemoryStore::new());
        let sink = Sink::new(store.clone(), WritePolicy::Strict);
        let report = sink.store_performances(Vec::new()).await.unwrap();
        assert_eq!(report, WriteReport::default());
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn every_write_gets_a_fresh_id() {
        let store = Arc::new(MemoryStore::new());
        let sink = Sink::new(store.clone(), WritePolicy::BestEffort);
        sink.store_performances(performances(&["same", "same"])).await.unwrap();
        sink.store_performances(performances(&["same"])).await.unwrap();

        let mut ids: Vec<_> = store.records().into_iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 3);
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }
}
