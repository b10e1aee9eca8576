// ── Object identity ──
//
// How a command addresses one object: a numeric primary key, or the
// natural-key fields of its resource type.

use serde_json::Value;

use nsot_api::{ObjectId, Params};

use super::ResourceType;
use crate::error::CoreError;

/// Interpret a JSON value as a positive numeric id.
///
/// Accepts JSON numbers and strings of ASCII digits; zero is not an id.
pub fn numeric_id(value: &Value) -> Option<ObjectId> {
    let id = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse().ok()
        }
        _ => None,
    }?;
    (id > 0).then_some(id)
}

/// The `id` of an API object, if it carries one.
pub fn object_id(object: &Value) -> Option<ObjectId> {
    object.get("id").and_then(numeric_id)
}

/// How a command identified its target object.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedIdentifier {
    /// Numeric primary key; no lookup needed.
    Id(ObjectId),
    /// Natural-key fields still to be looked up.
    NaturalKey(NaturalKeyLookup),
}

impl ResolvedIdentifier {
    /// Classify the identifying fields in `params`.
    ///
    /// A non-null `id` wins and must be a positive integer. Otherwise every
    /// natural-key field of the resource with a non-null value joins the
    /// lookup. Returns `None` when neither is present.
    pub fn from_params(resource: ResourceType, params: &Params) -> Result<Option<Self>, CoreError> {
        match params.get("id") {
            None | Some(Value::Null) => {}
            Some(raw) => {
                let id = numeric_id(raw).ok_or_else(|| {
                    CoreError::usage(format!("invalid {} id: {raw}", resource.singular()))
                })?;
                return Ok(Some(Self::Id(id)));
            }
        }

        let mut fields = Params::new();
        for key in resource.natural_keys() {
            match params.get(*key) {
                Some(Value::Null) | None => {}
                Some(value) => {
                    fields.insert((*key).to_owned(), value.clone());
                }
            }
        }

        if fields.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Self::NaturalKey(NaturalKeyLookup { resource, fields })))
        }
    }
}

/// Natural-key lookup against one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct NaturalKeyLookup {
    pub resource: ResourceType,
    /// Present natural-key fields only.
    pub fields: Params,
}

impl NaturalKeyLookup {
    /// Query for the lookup: the key fields plus `limit=1`.
    pub fn query(&self) -> Params {
        let mut query = self.fields.clone();
        query.insert("limit".into(), Value::from(1));
        query
    }

    /// `field=value` pairs for messages, e.g. `hostname=foo-bar1`.
    pub fn describe(&self) -> String {
        self.fields
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => format!("{key}={s}"),
                other => format!("{key}={other}"),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
