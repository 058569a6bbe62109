//! Configuration types for the storewatch service

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
    #[serde(default)]
    pub notifier: Option<NotifierConfig>,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub alert_mode: AlertMode,
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            notifier: None,
            probe: ProbeConfig::default(),
            alert_mode: AlertMode::default(),
            state_file: default_state_file(),
        }
    }
}

/// One storefront listing entry, as written in the config file.
///
/// Fields are deliberately lenient at the serde level; validation happens in
/// [`Config::valid_endpoints`] so a malformed entry is skipped with a warning
/// instead of failing the whole file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default)]
    pub listing_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub listed_at: Option<String>,
}

/// A validated endpoint, ready to probe
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Stable state-map key: `{listing_id}|{url}`
    pub key: String,
    pub name: String,
    pub url: String,
    /// When the listing went live, if known
    pub listed_at: Option<DateTime<Utc>>,
}

/// Notifier configuration with tagged enum for extensibility
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotifierConfig {
    #[serde(rename = "wecom")]
    WeCom {
        #[serde(default)]
        webhook_url: String,
    },
    #[serde(rename = "serverchan")]
    ServerChan {
        #[serde(default)]
        send_key: String,
        #[serde(default = "default_serverchan_title")]
        title: String,
    },
}

impl NotifierConfig {
    pub fn type_name(&self) -> &str {
        match self {
            NotifierConfig::WeCom { .. } => "wecom",
            NotifierConfig::ServerChan { .. } => "serverchan",
        }
    }
}

/// Probe timing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_seconds")]
    pub retry_backoff_seconds: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            max_retries: default_max_retries(),
            retry_backoff_seconds: default_retry_backoff_seconds(),
        }
    }
}

/// Policy governing which unhealthy observations trigger a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlertMode {
    /// Alert on every unhealthy observation
    Always,
    /// Alert only on the edge from healthy/unknown into unhealthy
    #[default]
    Transition,
}

fn default_state_file() -> PathBuf {
    PathBuf::from("storewatch-state.json")
}

fn default_serverchan_title() -> String {
    "Storefront listing alert".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_seconds() -> u64 {
    1
}

impl Config {
    /// Validate the configured entries, skipping malformed ones with a warning
    pub fn valid_endpoints(&self) -> Vec<Endpoint> {
        let mut endpoints = Vec::with_capacity(self.endpoints.len());
        for (idx, entry) in self.endpoints.iter().enumerate() {
            match validate_endpoint(entry) {
                Ok(endpoint) => endpoints.push(endpoint),
                Err(reason) => {
                    tracing::warn!("Skipping endpoints[{}]: {}", idx, reason);
                }
            }
        }
        endpoints
    }

    /// Fill empty notifier credentials from the environment
    pub fn resolve_secrets(&mut self) {
        self.resolve_secrets_from(|name| std::env::var(name).ok());
    }

    fn resolve_secrets_from<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        match &mut self.notifier {
            Some(NotifierConfig::WeCom { webhook_url }) if webhook_url.is_empty() => {
                if let Some(value) = env("WECOM_WEBHOOK_URL") {
                    *webhook_url = value.trim().to_string();
                }
            }
            Some(NotifierConfig::ServerChan { send_key, .. }) if send_key.is_empty() => {
                if let Some(value) = env("SERVERCHAN_SENDKEY") {
                    *send_key = value.trim().to_string();
                }
            }
            _ => {}
        }
    }
}

fn validate_endpoint(entry: &EndpointConfig) -> std::result::Result<Endpoint, String> {
    let name = entry.name.trim();
    if name.is_empty() {
        return Err("name must not be empty".to_string());
    }

    let listing_id = entry.listing_id.trim();
    if listing_id.is_empty() || !listing_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!(
            "listing_id must be a numeric string, got {:?}",
            entry.listing_id
        ));
    }

    let url = entry.url.trim();
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(format!("url must be an http(s) URL, got {:?}", entry.url));
    }

    let listed_at = match entry.listed_at.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_listed_at(raw)?),
    };

    Ok(Endpoint {
        key: format!("{}|{}", listing_id, url),
        name: name.to_string(),
        url: url.to_string(),
        listed_at,
    })
}

/// Parse a listing go-live timestamp.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (assumed UTC), or a bare
/// `YYYY-MM-DD` date.
fn parse_listed_at(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc());
        }
    }
    Err(format!(
        "listed_at format not supported: {:?} (use RFC 3339, 'YYYY-MM-DD HH:MM:SS' or 'YYYY-MM-DD')",
        raw
    ))
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::StorewatchError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_full_config() {
        let json = r#"{
            "endpoints": [
                {
                    "listing_id": "6756509310",
                    "name": "Acme Notes",
                    "url": "https://apps.example.com/app/id6756509310",
                    "listed_at": "2025-11-02 08:30:00"
                }
            ],
            "notifier": {
                "type": "wecom",
                "webhook_url": "https://qyapi.example.com/hook/abc"
            },
            "probe": {
                "timeout_seconds": 5,
                "max_retries": 1,
                "retry_backoff_seconds": 0
            },
            "alert_mode": "always",
            "state_file": "run/state.json"
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();

        let endpoints = config.valid_endpoints();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(
            endpoints[0].key,
            "6756509310|https://apps.example.com/app/id6756509310"
        );
        assert_eq!(endpoints[0].name, "Acme Notes");
        assert_eq!(
            endpoints[0].listed_at,
            Some(Utc.with_ymd_and_hms(2025, 11, 2, 8, 30, 0).unwrap())
        );

        assert_eq!(config.notifier.as_ref().unwrap().type_name(), "wecom");
        assert_eq!(config.probe.timeout_seconds, 5);
        assert_eq!(config.probe.max_retries, 1);
        assert_eq!(config.probe.retry_backoff_seconds, 0);
        assert_eq!(config.alert_mode, AlertMode::Always);
        assert_eq!(config.state_file, PathBuf::from("run/state.json"));
    }

    #[test]
    fn parse_minimal_config() {
        let json = r#"{}"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert!(config.endpoints.is_empty());
        assert!(config.notifier.is_none());
        assert_eq!(config.probe.timeout_seconds, 10);
        assert_eq!(config.probe.max_retries, 2);
        assert_eq!(config.probe.retry_backoff_seconds, 1);
        assert_eq!(config.alert_mode, AlertMode::Transition);
        assert_eq!(config.state_file, PathBuf::from("storewatch-state.json"));
    }

    #[test]
    fn parse_serverchan_defaults() {
        let json = r#"{
            "notifier": { "type": "serverchan", "send_key": "SCT123" }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        match config.notifier.as_ref().unwrap() {
            NotifierConfig::ServerChan { send_key, title } => {
                assert_eq!(send_key, "SCT123");
                assert_eq!(title, "Storefront listing alert");
            }
            other => panic!("expected serverchan, got {other:?}"),
        }
    }

    #[test]
    fn endpoints_skips_malformed_entries() {
        let json = r#"{
            "endpoints": [
                { "listing_id": "111", "name": "Good", "url": "https://a.example/1" },
                { "listing_id": "222", "name": "", "url": "https://a.example/2" },
                { "listing_id": "not-a-number", "name": "Bad id", "url": "https://a.example/3" },
                { "listing_id": "444", "name": "Bad url", "url": "ftp://a.example/4" },
                { "listing_id": "555", "name": "Bad date", "url": "https://a.example/5", "listed_at": "next tuesday" }
            ]
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        let endpoints = config.valid_endpoints();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].name, "Good");
    }

    #[test]
    fn endpoint_without_listed_at_is_valid() {
        let config = Config {
            endpoints: vec![EndpointConfig {
                listing_id: "123".to_string(),
                name: "No date".to_string(),
                url: "https://a.example/app".to_string(),
                listed_at: None,
            }],
            ..Config::default()
        };

        let endpoints = config.valid_endpoints();
        assert_eq!(endpoints.len(), 1);
        assert!(endpoints[0].listed_at.is_none());
    }

    #[test]
    fn listed_at_accepts_all_documented_formats() {
        for raw in [
            "2025-11-02T08:30:00Z",
            "2025-11-02T08:30:00+08:00",
            "2025-11-02 08:30:00",
            "2025-11-02",
        ] {
            assert!(parse_listed_at(raw).is_ok(), "{raw} should parse");
        }
        assert!(parse_listed_at("02.11.2025").is_err());
    }

    #[test]
    fn listed_at_offset_is_normalized_to_utc() {
        let dt = parse_listed_at("2025-11-02T08:30:00+08:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 11, 2, 0, 30, 0).unwrap());
    }

    #[test]
    fn resolve_secrets_fills_empty_wecom_webhook() {
        let mut config = Config {
            notifier: Some(NotifierConfig::WeCom {
                webhook_url: String::new(),
            }),
            ..Config::default()
        };

        config.resolve_secrets_from(|name| {
            (name == "WECOM_WEBHOOK_URL").then(|| " https://qyapi.example.com/hook ".to_string())
        });

        match config.notifier.unwrap() {
            NotifierConfig::WeCom { webhook_url } => {
                assert_eq!(webhook_url, "https://qyapi.example.com/hook");
            }
            other => panic!("expected wecom, got {other:?}"),
        }
    }

    #[test]
    fn resolve_secrets_keeps_explicit_value() {
        let mut config = Config {
            notifier: Some(NotifierConfig::ServerChan {
                send_key: "from-config".to_string(),
                title: "t".to_string(),
            }),
            ..Config::default()
        };

        config.resolve_secrets_from(|_| Some("from-env".to_string()));

        match config.notifier.unwrap() {
            NotifierConfig::ServerChan { send_key, .. } => {
                assert_eq!(send_key, "from-config");
            }
            other => panic!("expected serverchan, got {other:?}"),
        }
    }

    #[test]
    fn resolve_secrets_fills_empty_serverchan_key() {
        let mut config = Config {
            notifier: Some(NotifierConfig::ServerChan {
                send_key: String::new(),
                title: "t".to_string(),
            }),
            ..Config::default()
        };

        config.resolve_secrets_from(|name| {
            (name == "SERVERCHAN_SENDKEY").then(|| "SCT999".to_string())
        });

        match config.notifier.unwrap() {
            NotifierConfig::ServerChan { send_key, .. } => {
                assert_eq!(send_key, "SCT999");
            }
            other => panic!("expected serverchan, got {other:?}"),
        }
    }

    #[test]
    fn load_config_missing_file() {
        let result = load_config(Path::new("/nonexistent/config.json"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(
            &config_path,
            r#"{"endpoints": [{"listing_id": "1", "name": "Test", "url": "https://a.example/x"}]}"#,
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.valid_endpoints().len(), 1);
    }

    #[test]
    fn load_config_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, "not json").unwrap();

        let result = load_config(&config_path);
        assert!(result.is_err());
    }
}
