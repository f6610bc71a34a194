//! SQL-backed key-value cache with TTL expiry.
//!
//! This crate provides:
//! - A typed cache facade (`Cache`) backed by a relational store
//! - Atomic `set`/`get`/`delete`/`cleanup`/`stats` operations
//! - Layered configuration and typed errors

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{Cache, CacheDb, CacheStats};
pub use config::{CacheConfig, ConfigError};
pub use error::Error;
