//! Runtime configuration: parsing, validation, and loading.
//!
//! A small TOML file describes where the orders live and which zone's midnights
//! define "today":
//!
//! ```toml
//! database_url = "sqlite://orders.db"
//! time_zone = "Africa/Tunis"
//! recent_limit = 5
//! log_level = "info"
//! ```
//!
//! Every key is optional. `DATABASE_URL` and `ORDER_STATS_TZ` override the file when
//! set (see [`StatsConfig::apply_env_overrides`]).
//!
//! Entrypoints:
//! - Parse + validate a TOML string: [`load_config_str`]
//! - Parse + validate a file: [`load_config_path`]
//! - File (optional) + environment + validation, as the CLI does it: [`load_config`]

use std::path::Path;

use anyhow::Context;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use shared_utils::env::optional_env_var;

use crate::{engine::DEFAULT_RECENT_LIMIT, tz};

/// Environment variable overriding [`StatsConfig::database_url`].
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
/// Environment variable overriding [`StatsConfig::time_zone`].
pub const TIME_ZONE_VAR: &str = "ORDER_STATS_TZ";

/// Upper bound for [`StatsConfig::recent_limit`].
pub const MAX_RECENT_LIMIT: usize = 100;

/// Configuration as written in the TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StatsConfig {
    /// SQLite database path or `sqlite://` URL.
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// IANA zone name, e.g. "Africa/Tunis".
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// Rows in the "latest orders" list, 1..=100.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
    /// `tracing` filter directive; `RUST_LOG` wins when set.
    #[serde(default)]
    pub log_level: Option<String>,
}

fn default_database_url() -> String {
    "orders.db".into()
}

fn default_time_zone() -> String {
    "UTC".into()
}

fn default_recent_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            time_zone: default_time_zone(),
            recent_limit: default_recent_limit(),
            log_level: None,
        }
    }
}

/// Validation failures for [`StatsConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `database_url` is blank.
    #[error("database_url cannot be empty")]
    EmptyDatabaseUrl,
    /// `time_zone` is not an IANA zone name.
    #[error("unknown time_zone {0:?}")]
    UnknownTimeZone(String),
    /// `recent_limit` is outside 1..=100.
    #[error("recent_limit must be between 1 and {MAX_RECENT_LIMIT}, got {0}")]
    RecentLimit(usize),
}

/// A validated configuration, ready to build an engine from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Trimmed database URL.
    pub database_url: String,
    /// Parsed zone.
    pub tz: Tz,
    /// Rows in the "latest orders" list.
    pub recent_limit: usize,
    /// `tracing` filter directive, if configured.
    pub log_level: Option<String>,
}

impl StatsConfig {
    /// Replace fields with values from `lookup(name)` where it returns `Some`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(DATABASE_URL_VAR) {
            self.database_url = url;
        }
        if let Some(zone) = lookup(TIME_ZONE_VAR) {
            self.time_zone = zone;
        }
    }

    /// [`Self::apply_overrides`] from the process environment. Blank variables are ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(optional_env_var);
    }

    /// Check every field and parse the zone.
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        let database_url = self.database_url.trim();
        if database_url.is_empty() {
            return Err(ConfigError::EmptyDatabaseUrl);
        }
        let tz = tz::parse_tz(&self.time_zone)
            .map_err(|_| ConfigError::UnknownTimeZone(self.time_zone.clone()))?;
        if !(1..=MAX_RECENT_LIMIT).contains(&self.recent_limit) {
            return Err(ConfigError::RecentLimit(self.recent_limit));
        }
        Ok(ResolvedConfig {
            database_url: database_url.to_string(),
            tz,
            recent_limit: self.recent_limit,
            log_level: self
                .log_level
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        })
    }
}

/// Parse a configuration TOML string and validate it. The environment is not consulted.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<ResolvedConfig> {
    let cfg: StatsConfig = toml::from_str(toml_str).context("failed to parse config TOML")?;
    cfg.resolve().context("invalid configuration")
}

/// Read a configuration file from disk, parse, and validate it.
///
/// See [`load_config_str`].
pub fn load_config_path(path: impl AsRef<Path>) -> anyhow::Result<ResolvedConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read config file {}", path.as_ref().display()))?;
    load_config_str(&text)
}

/// Load the file at `path` (defaults when `None`), apply environment overrides, validate.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ResolvedConfig> {
    let mut cfg = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("read config file {}", p.display()))?;
            toml::from_str::<StatsConfig>(&text)
                .with_context(|| format!("failed to parse config TOML {}", p.display()))?
        }
        None => StatsConfig::default(),
    };
    cfg.apply_env_overrides();
    cfg.resolve().context("invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = load_config_str("").unwrap();
        assert_eq!(cfg.database_url, "orders.db");
        assert_eq!(cfg.tz, Tz::UTC);
        assert_eq!(cfg.recent_limit, 5);
        assert_eq!(cfg.log_level, None);
    }

    #[test]
    fn full_file() {
        let cfg = load_config_str(
            r#"
            database_url = " sqlite://data/orders.db "
            time_zone = "Africa/Tunis"
            recent_limit = 10
            log_level = "order_stats=debug"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.database_url, "sqlite://data/orders.db");
        assert_eq!(cfg.tz, Tz::Africa__Tunis);
        assert_eq!(cfg.recent_limit, 10);
        assert_eq!(cfg.log_level.as_deref(), Some("order_stats=debug"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = load_config_str("timezone = \"UTC\"").unwrap_err();
        assert!(format!("{err:#}").contains("unknown field"), "{err:#}");
    }

    #[test]
    fn validation_errors() {
        let base = StatsConfig::default();
        let bad_tz = StatsConfig {
            time_zone: "Mars/Olympus".into(),
            ..base.clone()
        };
        assert_eq!(
            bad_tz.resolve(),
            Err(ConfigError::UnknownTimeZone("Mars/Olympus".into()))
        );
        for n in [0, 101] {
            let cfg = StatsConfig {
                recent_limit: n,
                ..base.clone()
            };
            assert_eq!(cfg.resolve(), Err(ConfigError::RecentLimit(n)));
        }
        let cfg = StatsConfig {
            database_url: "  ".into(),
            ..base
        };
        assert_eq!(cfg.resolve(), Err(ConfigError::EmptyDatabaseUrl));
    }

    #[test]
    fn overrides_win_over_the_file() {
        let vars: HashMap<&str, &str> =
            [(DATABASE_URL_VAR, "/tmp/x.db"), (TIME_ZONE_VAR, "Europe/Paris")].into();
        let mut cfg = StatsConfig::default();
        cfg.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));
        let r = cfg.resolve().unwrap();
        assert_eq!(r.database_url, "/tmp/x.db");
        assert_eq!(r.tz, Tz::Europe__Paris);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_config_path("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
