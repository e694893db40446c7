use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_API_PREFIX: &str = "/api/notifications";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub api_prefix: String,
    pub vapid_private_key: Option<String>,
    pub vapid_public_key: Option<String>,
    pub vapid_subject: Option<String>,
    pub fanout_concurrency: usize,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            vapid_private_key: None,
            vapid_public_key: None,
            vapid_subject: None,
            fanout_concurrency: 1,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Optional TOML config file. Command-line flags and environment variables
/// take precedence over every value here.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub bind: Option<SocketAddr>,
    pub api_prefix: Option<String>,
    pub fanout_concurrency: Option<usize>,
    pub log_level: Option<String>,
    #[serde(default)]
    pub vapid: FileVapidConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileVapidConfig {
    pub private_key: Option<String>,
    pub public_key: Option<String>,
    pub subject: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }
}

/// Route prefix with a leading slash and no trailing slash; empty means root.
pub fn normalize_api_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn file_config__should_parse_vapid_table() {
        // Given
        let raw = r#"
bind = "0.0.0.0:8080"
fanout_concurrency = 4

[vapid]
private_key = "private"
public_key = "public"
subject = "mailto:ops@example.com"
"#;

        // When
        let config = FileConfig::parse(raw).expect("parse config");

        // Then
        assert_eq!(config.bind, Some(SocketAddr::from(([0, 0, 0, 0], 8080))));
        assert_eq!(config.fanout_concurrency, Some(4));
        assert_eq!(config.vapid.public_key.as_deref(), Some("public"));
        assert!(config.api_prefix.is_none());
    }

    #[test]
    fn file_config__should_reject_unknown_keys() {
        assert!(FileConfig::parse("unknown = 1").is_err());
    }

    #[test]
    fn normalize_api_prefix__should_add_leading_and_strip_trailing_slash() {
        assert_eq!(normalize_api_prefix("api/notifications/"), "/api/notifications");
        assert_eq!(normalize_api_prefix("/push"), "/push");
        assert_eq!(normalize_api_prefix("/"), "");
        assert_eq!(normalize_api_prefix(""), "");
    }
}
