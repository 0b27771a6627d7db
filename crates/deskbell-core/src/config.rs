use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_RECONNECT_DELAY_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};

/// Client configuration, loadable from a camelCase JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreConfig {
    /// Base URL of the framework site, e.g. `https://erp.example.com`
    pub site_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,

    /// Directory for client-local storage (mute flag)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Audio cue played on new notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_file: Option<PathBuf>,

    /// `host:port` of a line-delimited realtime bridge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_addr: Option<String>,

    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("deskbell"))
        .unwrap_or_else(|| PathBuf::from("deskbell_data"))
}

fn default_reconnect_delay() -> u64 {
    DEFAULT_RECONNECT_DELAY_SECS
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl CoreConfig {
    pub fn new(site_url: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
            api_key: None,
            api_secret: None,
            data_dir: default_data_dir(),
            sound_file: None,
            feed_addr: None,
            reconnect_delay_secs: DEFAULT_RECONNECT_DELAY_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CoreConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Default config location: `<config_dir>/deskbell/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("deskbell").join("config.json"))
    }

    /// Override fields from `DESKBELL_*` environment variables
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DESKBELL_SITE_URL") {
            self.site_url = url;
        }
        if let Some(key) = lookup("DESKBELL_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(secret) = lookup("DESKBELL_API_SECRET") {
            self.api_secret = Some(secret);
        }
        if let Some(dir) = lookup("DESKBELL_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
    }

    /// `Authorization` header value for token auth, if both halves are set
    pub fn auth_token(&self) -> Option<String> {
        match (&self.api_key, &self.api_secret) {
            (Some(key), Some(secret)) => Some(format!("token {}:{}", key, secret)),
            _ => None,
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new("http://localhost:8000")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_minimal_config() {
        let json = r#"{"siteUrl": "https://erp.example.com"}"#;
        let config: CoreConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.site_url, "https://erp.example.com");
        assert!(config.api_key.is_none());
        assert_eq!(config.reconnect_delay_secs, DEFAULT_RECONNECT_DELAY_SECS);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "siteUrl": "https://erp.example.com",
            "apiKey": "abc",
            "apiSecret": "xyz",
            "dataDir": "/tmp/deskbell",
            "soundFile": "/tmp/ding.mp3",
            "feedAddr": "127.0.0.1:9000",
            "reconnectDelaySecs": 5
        }"#;
        let config: CoreConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/deskbell"));
        assert_eq!(config.sound_file, Some(PathBuf::from("/tmp/ding.mp3")));
        assert_eq!(config.feed_addr.as_deref(), Some("127.0.0.1:9000"));
        assert_eq!(config.reconnect_delay_secs, 5);
        assert_eq!(config.auth_token().as_deref(), Some("token abc:xyz"));
    }

    #[test]
    fn test_auth_token_requires_both_halves() {
        let mut config = CoreConfig::default();
        config.api_key = Some("abc".to_string());
        assert!(config.auth_token().is_none());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DESKBELL_SITE_URL", "https://other.example.com"),
            ("DESKBELL_DATA_DIR", "/var/lib/deskbell"),
        ]
        .into_iter()
        .collect();

        let mut config = CoreConfig::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.site_url, "https://other.example.com");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/deskbell"));
        assert!(config.api_secret.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"siteUrl": "https://erp.example.com"}"#).unwrap();

        let config = CoreConfig::load(&path).unwrap();
        assert_eq!(config.site_url, "https://erp.example.com");

        let missing = CoreConfig::load(&dir.path().join("missing.json"));
        assert!(missing.is_err());
    }
}
