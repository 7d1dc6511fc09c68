//! Shared infrastructure for the test-bench tools
//!
//! - `config`: layered bench configuration (defaults, YAML, `BENCH_` env)
//! - `logging`: console and daily-file tracing setup
//! - `error`: error type shared by both

pub mod config;
pub mod error;
pub mod logging;

pub use config::{BenchConfig, LoggingConfig, ReportsConfig, SiteConfig};
pub use error::{Error, Result};
pub use logging::{init_with_config, LogConfig};
