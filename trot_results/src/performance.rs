//! # Performance Records
//!
//! The normalized unit of persistence: one horse, one race day, won or not.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single horse's result in one race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Performance {
    /// Horse name with any `*` annotation removed.
    pub name: String,
    /// Whether the horse won its race.
    pub winner: bool,
    pub coach: String,
    pub driver: String,
    /// Race day as milliseconds since the Unix epoch.
    pub date: i64,
}

/// A [`Performance`] with the identifier it is stored under.
///
/// The id is random, so storing the same performance twice yields two rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPerformance {
    pub id: Uuid,
    #[serde(flatten)]
    pub performance: Performance,
}

impl StoredPerformance {
    pub fn new(performance: Performance) -> Self {
        Self {
            id: Uuid::new_v4(),
            performance,
        }
    }
}
