use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::notify::DEFAULT_TOAST_SECONDS;

const MAX_TOAST_SECONDS: i64 = 24 * 60 * 60;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default = "default_toast_seconds")]
    pub toast_seconds: i64,
    #[serde(default = "default_fallback_hostname")]
    pub fallback_hostname: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_server_url() -> String {
    "http://127.0.0.1:3000".into()
}

fn default_api_prefix() -> String {
    "/api".into()
}

fn default_language() -> String {
    "en".into()
}

fn default_toast_seconds() -> i64 {
    DEFAULT_TOAST_SECONDS
}

fn default_fallback_hostname() -> String {
    "tailscale-discloud".into()
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            api_prefix: default_api_prefix(),
            default_language: default_language(),
            toast_seconds: default_toast_seconds(),
            fallback_hostname: default_fallback_hostname(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ConsoleConfig {
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("[config] loaded from {}", path.display());
                    config
                }
                Err(error) => {
                    log::warn!("[config] failed to parse {}: {error}", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                log::info!(
                    "[config] no configuration file at {}, using defaults",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// `toast_seconds` outside `0..=86400` falls back to the default.
    pub fn toast_lifetime(&self) -> Duration {
        let seconds = if (0..=MAX_TOAST_SECONDS).contains(&self.toast_seconds) {
            self.toast_seconds
        } else {
            log::warn!(
                "[config] toast_seconds = {} is out of range, using {DEFAULT_TOAST_SECONDS}",
                self.toast_seconds
            );
            DEFAULT_TOAST_SECONDS
        };
        Duration::seconds(seconds)
    }

    pub fn api_base(&self) -> String {
        format!(
            "{}{}",
            self.server_url.trim_end_matches('/'),
            self.api_prefix.trim_end_matches('/')
        )
    }
}

pub fn configuration_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tunnel-console")
}

pub fn configuration_path() -> PathBuf {
    configuration_directory().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_file_keeps_defaults() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("config.toml");
        std::fs::write(&path, "server_url = \"http://tunnels.lan:3000/\"\ntoast_seconds = 8\n").unwrap();

        let config = ConsoleConfig::load(&path);
        assert_eq!(config.server_url, "http://tunnels.lan:3000/");
        assert_eq!(config.toast_seconds, 8);
        assert_eq!(config.default_language, "en");
        assert_eq!(config.api_base(), "http://tunnels.lan:3000/api");
    }

    #[test]
    fn out_of_range_toast_seconds_use_default() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("config.toml");
        std::fs::write(&path, "toast_seconds = 1000000000000000\n").unwrap();
        assert_eq!(ConsoleConfig::load(&path).toast_lifetime(), Duration::seconds(5));

        let negative = ConsoleConfig {
            toast_seconds: -1,
            ..ConsoleConfig::default()
        };
        assert_eq!(negative.toast_lifetime(), Duration::seconds(5));

        let zero = ConsoleConfig {
            toast_seconds: 0,
            ..ConsoleConfig::default()
        };
        assert_eq!(zero.toast_lifetime(), Duration::zero());
    }

    #[test]
    fn missing_or_broken_file_uses_defaults() {
        let directory = tempfile::tempdir().unwrap();
        assert_eq!(
            ConsoleConfig::load(&directory.path().join("absent.toml")),
            ConsoleConfig::default()
        );

        let path = directory.path().join("broken.toml");
        std::fs::write(&path, "server_url = [").unwrap();
        assert_eq!(ConsoleConfig::load(&path), ConsoleConfig::default());
    }
}
