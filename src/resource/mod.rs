//! Resource abstraction layer
//!
//! This module provides a data-driven approach to counting AWS resources.
//! Counter definitions are loaded from JSON at compile time, so adding a
//! resource kind means adding a registry entry and a dispatch arm.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches counter definitions from embedded JSON
//! - [`fetcher`] - Counts listing results with pagination support
//! - [`sdk_dispatch`] - Maps abstract SDK method names to concrete AWS SDK calls
//!
//! # Example
//!
//! ```ignore
//! use crate::resource::{count_listing, ListRequest};
//!
//! async fn lambdas(backend: &AwsBackend) -> anyhow::Result<u64> {
//!     let request = ListRequest {
//!         service: "lambda",
//!         sdk_method: "list_functions",
//!         region: "eu-west-1",
//!         owner: None,
//!     };
//!     count_listing(backend, &request).await
//! }
//! ```

mod fetcher;
mod registry;
pub mod sdk_dispatch;

pub use fetcher::{count_listing, ListRequest, ListingBackend, Page};
pub use registry::*;
