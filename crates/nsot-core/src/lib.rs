// nsot-core: Attribute reconciliation, site scoping, and natural-key
// resolution on top of nsot-api.

pub mod controller;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod resolve;

// ── Primary re-exports ──────────────────────────────────────────────
pub use controller::{AttributeUpdate, ResourceController, UpdateRequest};
pub use error::{CoreError, exit_code};
pub use reconcile::reconcile;
pub use resolve::{IdentifierResolver, RebaseState, Resolved, classify_lookup, unwrap_results};

pub use model::{
    AttributeEdit, AttributeSet, AttributeValue, NaturalKeyLookup, ReconciliationAction,
    ResolvedIdentifier, ResourceType, numeric_id, object_id,
};

// Transport-level types consumers need alongside the controller.
pub use nsot_api::{ObjectId, Params, SiteId, Transport};
