//! TOML configuration for the redscope binary.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use redscope_scan::ScanSpec;
use redscope_store::RedisConfig;

/// Top-level config file: one `[redis]` table plus `[scans.<name>]` tables.
///
/// ```toml
/// [redis]
/// server = "127.0.0.1:6379"
///
/// [scans.users]
/// pattern = "user:*"
/// type = "hash"
/// interval_secs = 5
/// ```
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub redis: RedisConfig,
    #[serde(default)]
    pub scans: BTreeMap<String, ScanSpec>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if raw.trim().is_empty() {
            bail!("{} is empty", path.display());
        }
        let config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        if config.scans.is_empty() {
            bail!("{} configures no [scans.<name>] tables", path.display());
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redscope_store::ValueKind;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_a_full_config() {
        let file = write_config(
            r#"
            [redis]
            server = "127.0.0.1:6380"
            password = "secret"
            db = 2

            [scans.users]
            pattern = "user:*"
            type = "hash"
            interval_secs = 5

            [scans.queues]
            pattern = "queue:*"
            type = "list"
            "#,
        );

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.redis.server, "127.0.0.1:6380");
        assert_eq!(config.redis.db, 2);
        assert_eq!(config.scans.len(), 2);

        let users = &config.scans["users"];
        assert_eq!(users.pattern, "user:*");
        assert_eq!(users.kind, ValueKind::Hash);
        assert_eq!(users.interval_secs, 5);

        // Interval falls back to the default when omitted.
        assert_eq!(config.scans["queues"].interval_secs, 10);
    }

    #[test]
    fn rejects_an_empty_file() {
        let file = write_config("");
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn rejects_a_config_without_scans() {
        let file = write_config("[redis]\nserver = \"127.0.0.1\"\n");
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("no [scans"));
    }

    #[test]
    fn rejects_an_unknown_value_kind() {
        let file = write_config(
            r#"
            [redis]
            server = "127.0.0.1"

            [scans.bad]
            pattern = "x:*"
            type = "stream"
            "#,
        );
        assert!(AppConfig::load(file.path()).is_err());
    }
}
