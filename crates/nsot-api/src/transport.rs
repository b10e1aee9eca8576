// Transport configuration and the request seam consumed by nsot-core.
//
// `TransportConfig` builds the blocking reqwest client. `Transport` is the
// narrow GET/POST/PUT/DELETE interface the resolver and controller drive;
// `NsotClient` implements it over HTTP and tests implement it in memory.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::error::Error;
use crate::{ObjectId, Params, SiteId};

/// TLS verification mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (for self-signed lab servers).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    /// Requested API version, sent as `Accept: application/json; version=<v>`.
    pub api_version: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            api_version: None,
        }
    }
}

impl TransportConfig {
    /// Value of the `Accept` header for this config.
    pub fn accept_header(&self) -> String {
        match self.api_version.as_deref() {
            Some(version) => format!("application/json; version={version}"),
            None => "application/json".into(),
        }
    }

    /// Build a blocking `reqwest` client from this config.
    pub fn build_client(&self) -> Result<reqwest::blocking::Client, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_str(&self.accept_header())?);

        let mut builder = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("nsot-rs/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// Resource-level request interface.
///
/// `path` is the collection path relative to the API root, already
/// site-scoped by the caller (e.g. `/sites/1/devices`).
pub trait Transport {
    /// GET a collection (or a detail endpoint) with query parameters.
    fn get(&self, path: &str, params: &Params) -> Result<Value, Error>;

    /// GET a single object by primary key.
    fn get_by_id(&self, path: &str, id: ObjectId) -> Result<Value, Error>;

    /// POST a new object (or a bulk list of objects).
    fn post(&self, path: &str, payload: &Value) -> Result<Value, Error>;

    /// PUT a full replacement of one object.
    fn put(&self, path: &str, id: ObjectId, payload: &Value) -> Result<Value, Error>;

    /// DELETE one object.
    fn delete(&self, path: &str, id: ObjectId) -> Result<Value, Error>;

    /// Site used for scoping when the caller supplies none.
    fn default_site(&self) -> Option<SiteId>;
}
