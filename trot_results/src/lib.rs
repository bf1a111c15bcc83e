//! # trot_results
//!
//! A small extract-transform-load job: it pulls one day of trotting cards,
//! races and runners from the Veikkaus API, resolves each race winner, and
//! stores one win/loss `Performance` per starting horse.
//!
//! ## Modules:
//! - **`config`**: CLI/env/file configuration merged into an immutable `AppConfig`.
//! - **`target_date`**: which race day a run processes and its epoch timestamp.
//! - **`veikkaus`**: upstream models, HTTP paths and the tiered `Fetcher`.
//! - **`transform`**: winner resolution, name cleaning, runner → performance mapping.
//! - **`performance`**: the persisted record.
//! - **`sink`**: storage backends and the best-effort batch writer.
//! - **`pipeline`**: wires fetcher and sink together for one run.
//! - **`schedule`**: optional in-process cron trigger.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

pub mod config;
pub mod performance;
pub mod pipeline;
pub mod schedule;
pub mod sink;
pub mod target_date;
pub mod transform;
pub mod veikkaus;

pub use config::AppConfig;
pub use performance::{Performance, StoredPerformance};
pub use pipeline::{Pipeline, RunSummary};
pub use target_date::TargetDate;
