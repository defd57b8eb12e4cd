// src/fetch/mod.rs

/// Module for mapping (taxi type, month) pairs to remote Parquet files
pub mod targets;

/// Module for downloading a single file into memory
pub mod client;

pub use client::{Fetcher, HttpFetcher};
pub use targets::{plan_targets, FetchTarget};
