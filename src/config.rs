//! Bridge configuration.
//!
//! Configuration is loaded once at startup from environment variables
//! (after `.env` is applied), optionally merged over a YAML file given with
//! `--config`, and passed by reference into the rest of the process.
//! Nothing below `main` reads the environment. Priority: ENV vars > YAML
//! values > defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use zeroize::Zeroize;

use crate::evi::{EVI_WEBSOCKET_URL, EviConfig};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 10;
/// How often the telephony receive loop re-polls while the line is quiet.
const DEFAULT_STREAM_POLL_SECONDS: u64 = 30;
/// How long a session may stay completely silent before it is torn down.
const DEFAULT_STREAM_MAX_IDLE_SECONDS: u64 = 300;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    PartialTls,

    #[error("{0} is required")]
    Missing(&'static str),
}

/// TLS configuration for HTTPS and WSS.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format).
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format).
    pub key_path: PathBuf,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    /// Hume AI API key (required).
    pub hume_api_key: String,
    /// EVI behavior configuration id.
    pub hume_config_id: Option<String>,
    /// EVI WebSocket endpoint override.
    pub evi_websocket_url: String,
    /// EVI connection timeout in seconds.
    pub evi_connect_timeout_seconds: u64,

    /// Telephony receive re-poll interval in seconds.
    pub stream_poll_seconds: u64,
    /// Idle window in seconds after which a silent session terminates.
    pub stream_max_idle_seconds: u64,
}

/// Clear secrets from memory when the config is dropped.
impl Drop for BridgeConfig {
    fn drop(&mut self) {
        self.hume_api_key.zeroize();
    }
}

/// YAML file form of the configuration. Every field may be omitted;
/// environment variables override file values.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<FileTlsConfig>,
    pub hume_api_key: Option<String>,
    pub hume_config_id: Option<String>,
    pub evi_websocket_url: Option<String>,
    pub evi_connect_timeout_seconds: Option<u64>,
    pub stream_poll_seconds: Option<u64>,
    pub stream_max_idle_seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct FileTlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl BridgeConfig {
    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(FileConfig::default(), env_lookup)
    }

    /// Load configuration from a YAML file with environment overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: FileConfig = serde_yaml::from_str(&raw)?;
        Self::resolve(file, env_lookup)
    }

    /// Merge file values and an environment lookup into a full config.
    fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let host = env("HOST")
            .or(file.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match env("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue { name: "PORT", value: raw })?,
            None => file.port.unwrap_or(DEFAULT_PORT),
        };

        let tls = match (env("TLS_CERT_PATH"), env("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: cert.into(),
                key_path: key.into(),
            }),
            (None, None) => file.tls.map(|tls| TlsConfig {
                cert_path: tls.cert_path,
                key_path: tls.key_path,
            }),
            _ => return Err(ConfigError::PartialTls),
        };

        let hume_api_key = env("HUME_API_KEY")
            .or(file.hume_api_key)
            .unwrap_or_default();
        let hume_config_id = env("HUME_CONFIG_ID").or(file.hume_config_id);
        let evi_websocket_url = env("EVI_WEBSOCKET_URL")
            .or(file.evi_websocket_url)
            .unwrap_or_else(|| EVI_WEBSOCKET_URL.to_string());

        let evi_connect_timeout_seconds = parse_seconds(
            "EVI_CONNECT_TIMEOUT_SECONDS",
            env("EVI_CONNECT_TIMEOUT_SECONDS"),
            file.evi_connect_timeout_seconds,
            DEFAULT_CONNECT_TIMEOUT_SECONDS,
        )?;
        let stream_poll_seconds = parse_seconds(
            "STREAM_POLL_SECONDS",
            env("STREAM_POLL_SECONDS"),
            file.stream_poll_seconds,
            DEFAULT_STREAM_POLL_SECONDS,
        )?;
        let stream_max_idle_seconds = parse_seconds(
            "STREAM_MAX_IDLE_SECONDS",
            env("STREAM_MAX_IDLE_SECONDS"),
            file.stream_max_idle_seconds,
            DEFAULT_STREAM_MAX_IDLE_SECONDS,
        )?;

        Ok(Self {
            host,
            port,
            tls,
            hume_api_key,
            hume_config_id,
            evi_websocket_url,
            evi_connect_timeout_seconds,
            stream_poll_seconds,
            stream_max_idle_seconds,
        })
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hume_api_key.is_empty() {
            return Err(ConfigError::Missing("HUME_API_KEY"));
        }
        if self.evi_connect_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                name: "EVI_CONNECT_TIMEOUT_SECONDS",
                value: "0".to_string(),
            });
        }
        if self.stream_poll_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                name: "STREAM_POLL_SECONDS",
                value: "0".to_string(),
            });
        }
        if self.stream_max_idle_seconds < self.stream_poll_seconds {
            return Err(ConfigError::InvalidValue {
                name: "STREAM_MAX_IDLE_SECONDS",
                value: format!(
                    "{} (must be at least the poll interval)",
                    self.stream_max_idle_seconds
                ),
            });
        }
        Ok(())
    }

    /// The socket address string to bind.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// The EVI connection settings for one session.
    pub fn evi_config(&self) -> EviConfig {
        let mut config = EviConfig::new(self.hume_api_key.clone())
            .with_websocket_url(self.evi_websocket_url.clone())
            .with_connect_timeout(self.evi_connect_timeout_seconds);
        if let Some(ref config_id) = self.hume_config_id {
            config = config.with_config_id(config_id.clone());
        }
        config
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.stream_poll_seconds)
    }

    pub fn max_idle(&self) -> Duration {
        Duration::from_secs(self.stream_max_idle_seconds)
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_seconds(
    name: &'static str,
    raw: Option<String>,
    file: Option<u64>,
    default: u64,
) -> Result<u64, ConfigError> {
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        None => Ok(file.unwrap_or(default)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |name| map.get(name).map(|v| v.to_string())
    }

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::resolve(FileConfig::default(), no_env).unwrap();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.tls.is_none());
        assert!(config.hume_api_key.is_empty());
        assert_eq!(config.evi_websocket_url, EVI_WEBSOCKET_URL);
        assert_eq!(config.stream_poll_seconds, DEFAULT_STREAM_POLL_SECONDS);
        assert_eq!(
            config.stream_max_idle_seconds,
            DEFAULT_STREAM_MAX_IDLE_SECONDS
        );
    }

    #[test]
    fn test_env_overrides_file() {
        let file = FileConfig {
            port: Some(9000),
            hume_api_key: Some("from-file".to_string()),
            ..Default::default()
        };
        let env = env_from(&[("PORT", "9100"), ("HUME_API_KEY", "from-env")]);

        let config = BridgeConfig::resolve(file, env).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.hume_api_key, "from-env");
    }

    #[test]
    fn test_file_values_apply_when_env_absent() {
        let file = FileConfig {
            host: Some("127.0.0.1".to_string()),
            hume_config_id: Some("cfg_1".to_string()),
            stream_poll_seconds: Some(5),
            stream_max_idle_seconds: Some(60),
            ..Default::default()
        };

        let config = BridgeConfig::resolve(file, no_env).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.hume_config_id.as_deref(), Some("cfg_1"));
        assert_eq!(config.stream_poll_seconds, 5);
        assert_eq!(config.stream_max_idle_seconds, 60);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let env = env_from(&[("PORT", "not-a-port")]);
        let result = BridgeConfig::resolve(FileConfig::default(), env);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name: "PORT", .. })
        ));
    }

    #[test]
    fn test_partial_tls_is_rejected() {
        let env = env_from(&[("TLS_CERT_PATH", "/tmp/cert.pem")]);
        let result = BridgeConfig::resolve(FileConfig::default(), env);
        assert!(matches!(result, Err(ConfigError::PartialTls)));
    }

    #[test]
    fn test_from_file_yaml() {
        let yaml = r#"
host: "0.0.0.0"
port: 8443
hume_api_key: "file-key"
hume_config_id: "cfg_abc"
stream_poll_seconds: 10
stream_max_idle_seconds: 120
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let parsed: FileConfig =
            serde_yaml::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        let config = BridgeConfig::resolve(parsed, no_env).unwrap();
        assert_eq!(config.port, 8443);
        assert_eq!(config.hume_api_key, "file-key");
        assert_eq!(config.hume_config_id.as_deref(), Some("cfg_abc"));
        assert_eq!(config.stream_poll_seconds, 10);
    }

    #[test]
    fn test_validate_requires_api_key() {
        let config = BridgeConfig::resolve(FileConfig::default(), no_env).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("HUME_API_KEY"))
        ));
    }

    #[test]
    fn test_validate_rejects_idle_shorter_than_poll() {
        let file = FileConfig {
            hume_api_key: Some("key".to_string()),
            stream_poll_seconds: Some(30),
            stream_max_idle_seconds: Some(10),
            ..Default::default()
        };
        let config = BridgeConfig::resolve(file, no_env).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_success() {
        let file = FileConfig {
            hume_api_key: Some("key".to_string()),
            ..Default::default()
        };
        let config = BridgeConfig::resolve(file, no_env).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_evi_config_carries_connection_settings() {
        let file = FileConfig {
            hume_api_key: Some("key".to_string()),
            hume_config_id: Some("cfg_1".to_string()),
            evi_websocket_url: Some("ws://127.0.0.1:9000".to_string()),
            evi_connect_timeout_seconds: Some(3),
            ..Default::default()
        };
        let config = BridgeConfig::resolve(file, no_env).unwrap();

        let evi = config.evi_config();
        assert_eq!(evi.api_key, "key");
        assert_eq!(evi.config_id.as_deref(), Some("cfg_1"));
        assert_eq!(evi.websocket_url, "ws://127.0.0.1:9000");
        assert_eq!(evi.connect_timeout_seconds, 3);
    }

    #[test]
    fn test_address() {
        let env = env_from(&[("HOST", "127.0.0.1"), ("PORT", "9000")]);
        let config = BridgeConfig::resolve(FileConfig::default(), env).unwrap();
        assert_eq!(config.address(), "127.0.0.1:9000");
    }
}
