use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use pulsemon_collector::{CollectorConfig, LogSource};
use serde::Deserialize;

/// Minimum broadcast period. Sampling much faster than this mostly
/// measures the sampler itself.
pub const MIN_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_host")]
    pub bind_host: String,
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,
    /// Milliseconds between pushed snapshots.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Filesystem roots reported in the storage category.
    #[serde(default = "default_storage_paths")]
    pub storage_paths: Vec<String>,
    /// Log files tailed into each snapshot.
    #[serde(default)]
    pub log_files: Vec<LogSource>,
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_bind_port() -> u16 {
    5000
}

fn default_interval_ms() -> u64 {
    2_000
}

fn default_storage_paths() -> Vec<String> {
    vec!["/".to_string()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_host: default_bind_host(),
            bind_port: default_bind_port(),
            interval_ms: default_interval_ms(),
            storage_paths: default_storage_paths(),
            log_files: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Loads from `path` when it exists; a missing file just means the
    /// built-in defaults.
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            tracing::info!(path, "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: ServerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Environment overrides, applied after the file so a deployed instance
    /// can be tuned without editing it.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = get("POLLING_INTERVAL_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.interval_ms = ms,
                Err(_) => {
                    tracing::warn!(value = %raw, "ignoring unparseable POLLING_INTERVAL_MS")
                }
            }
        }
        if let Some(raw) = get("STORAGE_PATHS") {
            let paths: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
            if paths.is_empty() {
                tracing::warn!(value = %raw, "ignoring empty STORAGE_PATHS override");
            } else {
                self.storage_paths = paths;
            }
        }
        if let Some(raw) = get("LOG_CONFIG") {
            let mut files = Vec::new();
            for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                match item.split_once(':') {
                    Some((name, path)) if !name.trim().is_empty() && !path.trim().is_empty() => {
                        files.push(LogSource {
                            name: name.trim().to_string(),
                            path: path.trim().to_string(),
                        });
                    }
                    _ => tracing::warn!(item, "ignoring LOG_CONFIG entry, expected Name:Path"),
                }
            }
            if files.is_empty() {
                tracing::warn!(value = %raw, "ignoring LOG_CONFIG override with no valid entries");
            } else {
                self.log_files = files;
            }
        }
    }

    /// Broadcast period with the floor applied.
    pub fn effective_interval(&self) -> Duration {
        let ms = if self.interval_ms < MIN_INTERVAL_MS {
            tracing::warn!(
                configured_ms = self.interval_ms,
                floor_ms = MIN_INTERVAL_MS,
                "polling interval below floor, clamping"
            );
            MIN_INTERVAL_MS
        } else {
            self.interval_ms
        };
        Duration::from_millis(ms)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.bind_port)
    }

    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            storage_paths: self.storage_paths.clone(),
            log_files: self.log_files.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |key| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn defaults_without_file_or_env() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
        assert_eq!(config.interval_ms, 2_000);
        assert_eq!(config.storage_paths, vec!["/"]);
        assert!(config.log_files.is_empty());
    }

    #[test]
    fn load_tolerates_missing_file() {
        let config = ServerConfig::load("/definitely/not/here/pulsemon.toml").unwrap();
        assert_eq!(config.interval_ms, 2_000);
    }

    #[test]
    fn file_values_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulsemon.toml");
        std::fs::write(
            &path,
            r#"
bind_port = 8080
interval_ms = 1000
storage_paths = ["/", "/data"]

[[log_files]]
name = "syslog"
path = "/var/log/syslog"
"#,
        )
        .unwrap();

        let config = ServerConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.bind_port, 8080);
        assert_eq!(config.interval_ms, 1_000);
        assert_eq!(config.storage_paths, vec!["/", "/data"]);
        assert_eq!(
            config.log_files,
            vec![LogSource {
                name: "syslog".into(),
                path: "/var/log/syslog".into(),
            }]
        );
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = ServerConfig::default();
        config.apply_overrides(env(&[
            ("POLLING_INTERVAL_MS", "750"),
            ("STORAGE_PATHS", "/, /mnt/data"),
            ("LOG_CONFIG", "App:/var/log/app.log, Sys:/var/log/syslog"),
        ]));
        assert_eq!(config.interval_ms, 750);
        assert_eq!(config.storage_paths, vec!["/", "/mnt/data"]);
        assert_eq!(config.log_files.len(), 2);
        assert_eq!(config.log_files[0].name, "App");
        assert_eq!(config.log_files[1].path, "/var/log/syslog");
    }

    #[test]
    fn malformed_env_values_keep_prior_settings() {
        let mut config = ServerConfig::default();
        config.apply_overrides(env(&[
            ("POLLING_INTERVAL_MS", "fast"),
            ("STORAGE_PATHS", " , "),
        ]));
        assert_eq!(config.interval_ms, 2_000);
        assert_eq!(config.storage_paths, vec!["/"]);
    }

    #[test]
    fn log_config_skips_malformed_entries() {
        let mut config = ServerConfig::default();
        config.apply_overrides(env(&[("LOG_CONFIG", "App:/var/log/app.log, justaname")]));
        assert_eq!(config.log_files.len(), 1);
        assert_eq!(config.log_files[0].name, "App");
    }

    #[test]
    fn log_config_with_no_valid_entries_keeps_prior() {
        let mut config = ServerConfig::default();
        config.log_files = vec![LogSource {
            name: "boot".into(),
            path: "/var/log/boot.log".into(),
        }];

        // All items malformed: the file-configured list survives.
        config.apply_overrides(env(&[("LOG_CONFIG", "justaname, :nopath, name:")]));
        assert_eq!(config.log_files.len(), 1);
        assert_eq!(config.log_files[0].name, "boot");

        // Set but empty behaves the same way.
        config.apply_overrides(env(&[("LOG_CONFIG", "")]));
        assert_eq!(config.log_files.len(), 1);
        assert_eq!(config.log_files[0].name, "boot");
    }

    #[test]
    fn interval_floor_is_enforced() {
        let mut config = ServerConfig::default();
        config.interval_ms = 100;
        assert_eq!(config.effective_interval(), Duration::from_millis(500));
        config.interval_ms = 900;
        assert_eq!(config.effective_interval(), Duration::from_millis(900));
    }
}
