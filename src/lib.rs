//! Linkvault - URL shortening storage layer
//!
//! Maps long URLs to short keys and back over interchangeable storage
//! backends, with per-owner soft deletion and signed identity tokens.
//!
//! # Features
//! - **cli**: Command-line binary (default)
//!
//! # Architecture
//! - `storage`: `UrlStore` contract and the memory, append-only file and
//!   relational (SeaORM) backends
//! - `services`: deduplicating shortener, batch delete pipeline, statistics,
//!   health checks
//! - `identity`: HMAC-signed identity tokens
//! - `config`: Configuration management
//! - `system`: Logging initialization

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod errors;
pub mod identity;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
