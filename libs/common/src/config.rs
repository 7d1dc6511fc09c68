//! Bench configuration
//!
//! Layered with figment, lowest to highest priority:
//! 1. Built-in defaults
//! 2. YAML file (`config/benchctl.yaml` unless a path is given)
//! 3. Environment variables prefixed `BENCH_`, nested with `__`
//!    (e.g. `BENCH_LOGGING__LEVEL=debug`)
//!
//! Acceptance limits are deliberately absent: they are fixed in code.

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Error, Result};

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/benchctl.yaml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "BENCH_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Site identification printed on reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub site_id: String,
    pub site_name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_id: "BENCH-01".to_string(),
            site_name: "Test Bench".to_string(),
        }
    }
}

/// Report export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportsConfig {
    /// Directory exported results are written to
    #[serde(default = "default_output_dir")]
    pub default_output_dir: String,

    /// File name prefix; a timestamp is used when unset
    #[serde(default)]
    pub file_prefix: Option<String>,
}

fn default_output_dir() -> String {
    "reports".to_string()
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            default_output_dir: default_output_dir(),
            file_prefix: None,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log directory
    #[serde(default = "default_log_dir")]
    pub dir: String,

    /// Also write a daily log file under `dir`
    #[serde(default)]
    pub file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
            file: false,
        }
    }
}

/// Complete bench configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub reports: ReportsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchConfig {
    /// Provider chain for a given file
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(BenchConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// File the configuration is read from
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(explicit) if !explicit.exists() => Err(Error::config(format!(
                "Config file not found: {}",
                explicit.display()
            ))),
            Some(explicit) => Ok(explicit.to_path_buf()),
            None => Ok(PathBuf::from(DEFAULT_CONFIG_PATH)),
        }
    }

    /// Load, validate and normalize configuration
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(&Self::resolve_path(path)?)
    }

    /// Load from a resolved path; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config: BenchConfig = Self::figment(path).extract()?;
        config.validate()?;
        config.normalize();
        Ok(config)
    }

    /// Check required values
    pub fn validate(&self) -> Result<()> {
        if self.site.site_id.trim().is_empty() {
            return Err(Error::config("site.site_id must not be empty"));
        }
        if self.reports.default_output_dir.trim().is_empty() {
            return Err(Error::config("reports.default_output_dir must not be empty"));
        }
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(Error::config(format!(
                "logging.level '{}' is not one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    /// Expand `~` and make the report directory absolute
    fn normalize(&mut self) {
        let expanded = expand_home(&self.reports.default_output_dir);
        let absolute = if expanded.is_absolute() {
            expanded
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&expanded))
                .unwrap_or(expanded)
        };
        self.reports.default_output_dir = absolute.to_string_lossy().into_owned();
        self.logging.level = self.logging.level.to_ascii_lowercase();
    }

    /// Render the effective configuration as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => Path::new(&home).join(rest),
        _ if path == "~" => std::env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(path)),
        _ => PathBuf::from(path),
    }
}
