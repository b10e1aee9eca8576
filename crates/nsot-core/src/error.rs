// ── Core error types ──
//
// User-facing errors from nsot-core. Consumers never see raw HTTP status
// handling or JSON parse failures directly: resolution failures become
// one of the lookup variants below, and `From<nsot_api::Error>` translates
// transport-layer errors into domain-appropriate variants.

use miette::Diagnostic;
use thiserror::Error;

use crate::model::ResourceType;

/// Process exit codes for front-ends that surface a `CoreError`.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

/// Unified error type for the core crate.
#[derive(Debug, Error, Diagnostic)]
pub enum CoreError {
    // ── Resolution errors ────────────────────────────────────────────
    #[error("More than one {} matches {key} ({count} found)", .resource.singular())]
    #[diagnostic(
        code(nsot::ambiguous_natural_key),
        help("Narrow the lookup with more fields, or address the object by id.")
    )]
    AmbiguousNaturalKey {
        resource: ResourceType,
        key: String,
        count: u64,
    },

    #[error("No matching {} found for {identifier}", .resource.singular())]
    #[diagnostic(
        code(nsot::not_found),
        help("Check the natural key, or try the lookup again by id.")
    )]
    NotFound {
        resource: ResourceType,
        identifier: String,
    },

    #[error("Missing site scope for {resource}")]
    #[diagnostic(
        code(nsot::missing_site_scope),
        help("Pass a site_id, or set default_site in the client configuration.")
    )]
    MissingSiteScope { resource: ResourceType },

    // ── Mutation errors ──────────────────────────────────────────────
    #[error("{resource} {action} rejected by server (HTTP {status}): {message}")]
    #[diagnostic(code(nsot::upstream_rejected))]
    UpstreamRejected {
        resource: ResourceType,
        action: &'static str,
        status: u16,
        message: String,
    },

    // ── Caller errors ────────────────────────────────────────────────
    #[error("Usage error: {message}")]
    #[diagnostic(code(nsot::usage))]
    Usage { message: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to NSoT at {url}: {reason}")]
    #[diagnostic(code(nsot::connection_failed))]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to NSoT timed out")]
    #[diagnostic(code(nsot::timeout))]
    Timeout,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(nsot::api_error))]
    Api {
        message: String,
        /// Server-side error code from the error envelope.
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    #[diagnostic(code(nsot::config))]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(nsot::internal))]
    Internal(String),
}

impl CoreError {
    pub(crate) fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Translate a failed mutating call. Server answers become
    /// `UpstreamRejected`; transport failures keep their own variants.
    pub(crate) fn rejected(
        resource: ResourceType,
        action: &'static str,
        err: nsot_api::Error,
    ) -> Self {
        match err {
            nsot_api::Error::Api {
                status, message, ..
            } => Self::UpstreamRejected {
                resource,
                action,
                status,
                message,
            },
            other => Self::from(other),
        }
    }

    /// Exit code a front-end should terminate with.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage { .. } | Self::MissingSiteScope { .. } => exit_code::USAGE,
            Self::AmbiguousNaturalKey { .. } | Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::UpstreamRejected { .. } => exit_code::CONFLICT,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Api { .. } | Self::Config { .. } | Self::Internal(_) => exit_code::GENERAL,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<nsot_api::Error> for CoreError {
    fn from(err: nsot_api::Error) -> Self {
        match err {
            nsot_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            nsot_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            nsot_api::Error::InvalidHeader(e) => CoreError::Config {
                message: format!("Invalid header value: {e}"),
            },
            nsot_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            nsot_api::Error::Api {
                status,
                code,
                message,
            } => CoreError::Api {
                message,
                code,
                status: Some(status),
            },
            nsot_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
