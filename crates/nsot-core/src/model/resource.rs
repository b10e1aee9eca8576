// ── Resource registry ──
//
// Every NSoT collection the client addresses, with its URL segment, its
// site scoping, and the natural-key fields that identify one object.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use nsot_api::Params;

use crate::error::CoreError;

/// A REST collection exposed by the NSoT API.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Sites,
    Devices,
    Networks,
    Interfaces,
    Attributes,
    Circuits,
    Protocols,
    ProtocolTypes,
    Values,
    Changes,
}

impl ResourceType {
    /// Natural-key fields, in lookup order.
    pub fn natural_keys(self) -> &'static [&'static str] {
        match self {
            Self::Devices => &["hostname"],
            Self::Networks => &["cidr"],
            Self::Interfaces => &["name", "device"],
            Self::Attributes => &["name", "resource_name"],
            Self::Circuits | Self::Sites => &["name"],
            Self::Protocols | Self::ProtocolTypes | Self::Values | Self::Changes => &[],
        }
    }

    /// Everything but the sites collection lives under `/sites/{id}`.
    pub fn is_site_scoped(self) -> bool {
        !matches!(self, Self::Sites)
    }

    /// URL segment of the collection.
    pub fn path_segment(self) -> &'static str {
        self.into()
    }

    /// Human-readable singular name, for messages.
    pub fn singular(self) -> &'static str {
        match self {
            Self::Sites => "site",
            Self::Devices => "device",
            Self::Networks => "network",
            Self::Interfaces => "interface",
            Self::Attributes => "attribute",
            Self::Circuits => "circuit",
            Self::Protocols => "protocol",
            Self::ProtocolTypes => "protocol type",
            Self::Values => "value",
            Self::Changes => "change",
        }
    }

    /// Expand a displayed natural key into lookup params.
    ///
    /// Compound keys are colon-joined the way they are printed:
    /// interfaces as `device:name`, attributes as `resource_name:name`.
    /// Single-field keys take the whole string, so IPv6 CIDRs keep their
    /// colons.
    pub fn split_natural_key(self, raw: &str) -> Result<Params, CoreError> {
        let mut params = Params::new();
        match self {
            Self::Interfaces | Self::Attributes => {
                let (outer, name) = raw.split_once(':').ok_or_else(|| {
                    CoreError::usage(format!(
                        "invalid {} key '{raw}'; expected {}",
                        self.singular(),
                        self.compound_format()
                    ))
                })?;
                if outer.is_empty() || name.is_empty() {
                    return Err(CoreError::usage(format!(
                        "invalid {} key '{raw}'; expected {}",
                        self.singular(),
                        self.compound_format()
                    )));
                }
                let outer_field = if self == Self::Interfaces {
                    "device"
                } else {
                    "resource_name"
                };
                params.insert(outer_field.into(), Value::String(outer.into()));
                params.insert("name".into(), Value::String(name.into()));
            }
            _ => match self.natural_keys() {
                [field] => {
                    params.insert((*field).into(), Value::String(raw.into()));
                }
                _ => {
                    return Err(CoreError::usage(format!(
                        "{self} cannot be addressed by natural key"
                    )));
                }
            },
        }
        Ok(params)
    }

    fn compound_format(self) -> &'static str {
        match self {
            Self::Attributes => "resource_name:name",
            _ => "device:name",
        }
    }
}
