// ── Attribute types ──
//
// Attribute values as the API stores them (scalar or list), the edit
// instructions a user supplies, and the action that folds them together.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Value of one attribute on a resource.
///
/// Multi attributes hold an ordered list; an empty list is never stored,
/// the key is removed instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Scalar(String),
    List(Vec<String>),
}

impl AttributeValue {
    /// Take the value as a list, promoting a scalar to a one-element list.
    pub fn into_list(self) -> Vec<String> {
        match self {
            Self::Scalar(value) => vec![value],
            Self::List(items) => items,
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(value) => Some(value),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            Self::Scalar(_) => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_owned())
    }
}

impl From<Vec<&str>> for AttributeValue {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(str::to_owned).collect())
    }
}

/// Attribute mapping of a resource, in server order.
pub type AttributeSet = IndexMap<String, AttributeValue>;

/// One `key=value` instruction. `value` is `None` for a bare `key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeEdit {
    pub key: String,
    pub value: Option<String>,
}

impl AttributeEdit {
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Edit carrying a value.
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, Some(value.into()))
    }

    /// Edit naming only a key.
    pub fn bare(key: impl Into<String>) -> Self {
        Self::new(key, None)
    }

    /// The value to write; a bare key writes the empty string.
    pub fn value_or_empty(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }

    /// The value, if one was given and is non-empty.
    pub fn non_empty_value(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.is_empty())
    }
}

/// How a batch of edits is applied to the existing attributes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum ReconciliationAction {
    #[default]
    Add,
    Replace,
    Delete,
}
