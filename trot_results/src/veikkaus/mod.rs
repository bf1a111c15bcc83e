//! # Veikkaus Trotting API Integration
//!
//! Everything needed to read one day of results from the upstream API.
//!
//! ## Contained Modules:
//!
//! - **`model`**: strongly-typed cards, races and runners as the API returns them.
//! - **`apicall`**: the HTTP client and the three hierarchical endpoints.
//! - **`fetcher`**: tiered, concurrent fetching with the "log and return empty"
//!   failure policy, producing flat performance lists.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Client for the cards, races and runners endpoints.
pub mod apicall;
/// Tiered fetching of a race day into performances.
pub mod fetcher;
/// Data models for upstream payloads.
pub mod model;

pub use apicall::VeikkausApi;
pub use fetcher::Fetcher;
pub use model::{Card, Collection, Race, Runner, ShoeState};
