//! keyscore-fetch: answer-key page fetching.
//!
//! Implements the `PageFetcher` trait over HTTP with browser-like headers
//! and manual redirect handling, plus the TOML configuration the CLI loads.

pub mod config;
pub mod http;

pub use config::{create_fetcher, load_config, load_config_from, KeyscoreConfig};
pub use http::HttpFetcher;
