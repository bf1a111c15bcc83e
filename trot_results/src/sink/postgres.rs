//! PostgreSQL backend: one row per performance in a configured table.

use async_trait::async_trait;
use lib_common::connections::Database;
use tracing::info;

use super::{is_valid_target, PerformanceStore, StoreError};
use crate::performance::StoredPerformance;

/// DDL for the performance table.
pub fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\
         id UUID PRIMARY KEY, \
         name TEXT NOT NULL, \
         winner BOOLEAN NOT NULL, \
         coach TEXT NOT NULL, \
         driver TEXT NOT NULL, \
         \"date\" BIGINT NOT NULL)"
    )
}

/// Parameterized insert for one performance.
pub fn insert_sql(table: &str) -> String {
    format!("INSERT INTO {table} (id, name, winner, coach, driver, \"date\") VALUES ($1, $2, $3, $4, $5, $6)")
}

pub struct PostgresStore {
    db: Database,
    insert_sql: String,
}

impl PostgresStore {
    /// Checks the connection and creates `table` if it does not exist yet.
    pub async fn connect(db: Database, table: &str) -> Result<Self, StoreError> {
        if !is_valid_target(table) {
            return Err(StoreError::InvalidTarget(table.to_string()));
        }
        db.ping().await?;
        db.batch_execute(&create_table_sql(table)).await?;
        info!(table, "Performance table ready");
        Ok(Self {
            db,
            insert_sql: insert_sql(table),
        })
    }
}

#[async_trait]
impl PerformanceStore for PostgresStore {
    async fn put(&self, record: &StoredPerformance) -> Result<(), StoreError> {
        let p = &record.performance;
        self.db
            .execute(
                &self.insert_sql,
                &[&record.id, &p.name, &p.winner, &p.coach, &p.driver, &p.date],
            )
            .await?;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "postgres"
    }
}
