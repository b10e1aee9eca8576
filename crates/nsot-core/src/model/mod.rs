// ── Domain model ──

pub mod attribute;
pub mod identifier;
pub mod resource;

pub use attribute::{AttributeEdit, AttributeSet, AttributeValue, ReconciliationAction};
pub use identifier::{NaturalKeyLookup, ResolvedIdentifier, numeric_id, object_id};
pub use resource::ResourceType;
