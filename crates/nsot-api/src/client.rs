// NSoT REST API HTTP client
//
// Wraps `reqwest::blocking::Client` with API-root URL construction, query
// encoding, and server error decoding. Site scoping is the caller's concern:
// every method takes a collection path that is already rebased.

use reqwest::Method;
use reqwest::blocking::Response;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::{Transport, TransportConfig};
use crate::{ObjectId, Params, SiteId};

/// Raw HTTP client for the NSoT API.
///
/// All paths are relative to `base_url` (e.g. `https://nsot.local/api/`)
/// and always end in a trailing slash, as the server expects.
pub struct NsotClient {
    http: reqwest::blocking::Client,
    base_url: Url,
    default_site: Option<SiteId>,
}

impl NsotClient {
    /// Create a new client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest` client.
    pub fn with_client(http: reqwest::blocking::Client, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            http,
            base_url,
            default_site: None,
        }
    }

    /// Bind a default site used when a command supplies none.
    pub fn with_default_site(mut self, site: Option<SiteId>) -> Self {
        self.default_site = site;
        self
    }

    pub fn set_default_site(&mut self, site: Option<SiteId>) {
        self.default_site = site;
    }

    /// The API root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path: `{base}{path}/`.
    pub fn api_url(&self, path: &str) -> Result<Url, Error> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(self.base_url.clone());
        }
        Ok(self.base_url.join(&format!("{trimmed}/"))?)
    }

    fn object_url(&self, path: &str, id: ObjectId) -> Result<Url, Error> {
        self.api_url(&format!("{}/{id}", path.trim_end_matches('/')))
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Value, Error> {
        debug!("{} {}", method, url);

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let resp = request.send()?;

        parse_response(resp)
    }
}

impl Transport for NsotClient {
    fn get(&self, path: &str, params: &Params) -> Result<Value, Error> {
        let mut url = self.api_url(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query_pairs(params) {
                pairs.append_pair(&key, &value);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        self.send(Method::GET, url, None)
    }

    fn get_by_id(&self, path: &str, id: ObjectId) -> Result<Value, Error> {
        let url = self.object_url(path, id)?;
        self.send(Method::GET, url, None)
    }

    fn post(&self, path: &str, payload: &Value) -> Result<Value, Error> {
        let url = self.api_url(path)?;
        self.send(Method::POST, url, Some(payload))
    }

    fn put(&self, path: &str, id: ObjectId, payload: &Value) -> Result<Value, Error> {
        let url = self.object_url(path, id)?;
        self.send(Method::PUT, url, Some(payload))
    }

    fn delete(&self, path: &str, id: ObjectId) -> Result<Value, Error> {
        let url = self.object_url(path, id)?;
        self.send(Method::DELETE, url, None)
    }

    fn default_site(&self) -> Option<SiteId> {
        self.default_site
    }
}

// ── Response decoding ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
}

/// Return the JSON body on success, or an `Error::Api` built from the
/// server's error envelope. Empty bodies (e.g. 204) decode as `null`.
fn parse_response(resp: Response) -> Result<Value, Error> {
    let status = resp.status();
    let body = resp.text()?;

    if !status.is_success() {
        return Err(api_error(status.as_u16(), &body));
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

pub(crate) fn api_error(status: u16, body: &str) -> Error {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => Error::Api {
            status,
            code: envelope.error.code.map(|c| value_to_string(&c)),
            message: envelope
                .error
                .message
                .map_or_else(|| format!("HTTP {status}"), |m| value_to_string(&m)),
        },
        Err(_) => Error::Api {
            status,
            code: None,
            message: if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                body.trim().to_owned()
            },
        },
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten params into query pairs. `null` is skipped, arrays repeat the key.
pub(crate) fn query_pairs(params: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|v| !v.is_null()) {
                    pairs.push((key.clone(), value_to_string(item)));
                }
            }
            other => pairs.push((key.clone(), value_to_string(other))),
        }
    }
    pairs
}
