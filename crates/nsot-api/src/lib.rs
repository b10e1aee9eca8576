// nsot-api: Blocking Rust client for the NSoT REST API

pub mod client;
pub mod error;
pub mod transport;

pub use client::NsotClient;
pub use error::Error;
pub use transport::{TlsMode, Transport, TransportConfig};

/// Query parameters or request payload fields, keyed by API field name.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Numeric primary key of any NSoT object.
pub type ObjectId = u64;

/// Numeric primary key of a site.
pub type SiteId = u64;
