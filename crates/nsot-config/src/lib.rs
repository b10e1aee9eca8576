//! Client configuration for NSoT consumers.
//!
//! Defaults, an optional TOML file, then `NSOT_*` environment variables,
//! merged with figment and translated into an `nsot_api::NsotClient`
//! bound to the configured default site.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use nsot_api::{NsotClient, SiteId, TlsMode, TransportConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] nsot_api::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config struct ───────────────────────────────────────────────────

/// Connection settings for one NSoT server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientConfig {
    /// API root, e.g. `https://nsot.example.com/api`.
    #[serde(default)]
    pub url: String,

    /// API version requested through the `Accept` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Site used when a command names none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_site: Option<SiteId>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Accept invalid TLS certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate (PEM).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_version: None,
            default_site: None,
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

impl ClientConfig {
    /// Parsed API root.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "url".into(),
                reason: "no API URL configured (set `url` or NSOT_URL)".into(),
            });
        }
        self.url.parse().map_err(|e| ConfigError::Validation {
            field: "url".into(),
            reason: format!("{e}: {}", self.url),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;
        if self.default_site == Some(0) {
            return Err(ConfigError::Validation {
                field: "default_site".into(),
                reason: "site ids start at 1".into(),
            });
        }
        Ok(())
    }

    /// Transport settings for `nsot_api`.
    pub fn to_transport_config(&self) -> TransportConfig {
        let tls = if self.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };

        TransportConfig {
            tls,
            timeout: Duration::from_secs(self.timeout),
            api_version: self.api_version.clone(),
        }
    }

    /// Build a client with the default site bound.
    pub fn build_client(&self) -> Result<NsotClient, ConfigError> {
        let base_url = self.base_url()?;
        let client = NsotClient::new(base_url, &self.to_transport_config())?;
        Ok(client.with_default_site(self.default_site))
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "nsot", "nsot").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("nsot");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load and validate the config from `path` (or [`config_path`]) plus
/// the environment. A missing file is not an error.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    debug!(path = %path.display(), "loading config");

    let config: ClientConfig = Figment::new()
        .merge(Serialized::defaults(ClientConfig::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("NSOT_"))
        .extract()?;

    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path` (or [`config_path`]).
pub fn save_config(cfg: &ClientConfig, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    debug!(path = %path.display(), "config saved");
    Ok(path)
}
