//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: Daily log files and in-memory sinks
//! - Adapters: Carrier client, HTTP endpoints, console

pub mod config;
pub mod storage;
pub mod adapters;
