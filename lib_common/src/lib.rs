//! # lib_common
//!
//! Shared infrastructure for the trotting results ingestor. Each top-level
//! module is gated behind a cargo feature of the same name so binaries only
//! pull in the drivers they actually use.
//!
//! - **`retrieve`**: resilient JSON-over-HTTP client (`ApiClient`).
//! - **`loggers`**: `tracing` subscriber setup with console and rolling file output.
//! - **`connections`**: PostgreSQL pool and Redis connection wrappers.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

#[cfg(feature = "connections")]
pub mod connections;
#[cfg(feature = "loggers")]
pub mod loggers;
#[cfg(feature = "retrieve")]
pub mod retrieve;
