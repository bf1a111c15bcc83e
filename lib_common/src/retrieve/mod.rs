//! # Data Retrieval Module
//!
//! This module provides a centralized location for generic data retrieval
//! clients and utilities, primarily focused on HTTP-based interactions.
//!
//! ## Purpose:
//! The goal of the `retrieve` module is to offer a consistent way to fetch
//! data from external services, encapsulating common concerns such as HTTP
//! request building, error classification, and retry middleware. Upstream
//! clients (e.g. the Veikkaus trotting API) then only deal with paths and
//! payload types.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: A generic HTTP `ApiClient` built on `reqwest` and
//!   `reqwest-middleware`, with configurable exponential backoff retries and
//!   an optional per-request timeout.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Generic HTTP API client with retry middleware for resilient network requests.
pub mod ky_http;

pub use ky_http::{ApiClient, ApiClientOptions, ApiError, ApiResponse};
