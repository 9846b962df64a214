//! Infrastructure - configuration and metrics
//!
//! This module contains infrastructure concerns:
//! - `config` - Application configuration (TOML loading, CLI overrides, defaults)
//! - `metrics` - Lock-free counters with periodic log reporting

pub mod config;
pub mod metrics;

// Re-export commonly used types
pub use config::{CliOverrides, Config};
pub use metrics::Metrics;
