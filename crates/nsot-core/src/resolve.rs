// ── Identifier resolution ──
//
// Turns whatever a command was given (a numeric id or natural-key fields)
// into one concrete object, after scoping the request path to a site.
//
// START -> rebase -> numeric id? -> RESOLVED
//                 -> natural-key lookup -> RESOLVED | AMBIGUOUS | NOT_FOUND

use serde_json::Value;
use tracing::debug;

use nsot_api::{ObjectId, Params, SiteId, Transport};

use crate::error::CoreError;
use crate::model::{NaturalKeyLookup, ResolvedIdentifier, ResourceType, numeric_id, object_id};

// ── Rebase ───────────────────────────────────────────────────────────

/// Site scoping for one logical operation.
///
/// The `/sites/{id}` segment is appended at most once; later calls to
/// [`RebaseState::rebase`] are no-ops, so a list followed by a nested
/// lookup in the same command shares one scoped base path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebaseState {
    site_id: Option<SiteId>,
    base_path: String,
    done: bool,
}

impl RebaseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn site_id(&self) -> Option<SiteId> {
        self.site_id
    }

    /// Base path relative to the API root, e.g. `/sites/1`.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Scope the base path to a site.
    ///
    /// An explicit `site_id` popped from `params` wins over `default_site`.
    /// Fails with `MissingSiteScope` when neither is available, before any
    /// request is made. The sites collection is never scoped.
    pub fn rebase(
        &mut self,
        resource: ResourceType,
        params: &mut Params,
        default_site: Option<SiteId>,
    ) -> Result<(), CoreError> {
        if self.done {
            return Ok(());
        }

        if !resource.is_site_scoped() {
            debug!(%resource, "rebase: unscoped resource");
            self.done = true;
            return Ok(());
        }

        let explicit = match params.remove("site_id") {
            None | Some(Value::Null) => None,
            Some(value) => Some(numeric_id(&value).ok_or_else(|| {
                CoreError::usage(format!("invalid site_id: {value}"))
            })?),
        };

        let site_id = explicit
            .or(default_site)
            .ok_or(CoreError::MissingSiteScope { resource })?;

        debug!(site_id, explicit = explicit.is_some(), "rebase: scoping to site");
        self.site_id = Some(site_id);
        self.base_path.push_str(&format!("/sites/{site_id}"));
        self.done = true;
        Ok(())
    }

    /// Collection path under the current base, e.g. `/sites/1/devices`.
    pub fn collection_path(&self, resource: ResourceType) -> String {
        format!("{}/{}", self.base_path, resource.path_segment())
    }
}

// ── Resolver ─────────────────────────────────────────────────────────

/// A resolved target object.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub id: ObjectId,
    /// The full object, when resolution had to fetch it.
    pub object: Option<Value>,
}

/// Resolves ids and natural keys against one transport.
pub struct IdentifierResolver<'a, T: Transport + ?Sized> {
    transport: &'a T,
}

impl<'a, T: Transport + ?Sized> IdentifierResolver<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// Rebase `state` using the transport's default site as fallback.
    pub fn rebase(
        &self,
        state: &mut RebaseState,
        resource: ResourceType,
        params: &mut Params,
    ) -> Result<(), CoreError> {
        state.rebase(resource, params, self.transport.default_site())
    }

    /// Resolve the object `params` identify.
    ///
    /// Rebases first, so a missing site scope fails before any request.
    /// A numeric `id` resolves without a request; natural keys go through
    /// [`IdentifierResolver::lookup`].
    pub fn resolve(
        &self,
        state: &mut RebaseState,
        resource: ResourceType,
        params: &mut Params,
    ) -> Result<Resolved, CoreError> {
        self.rebase(state, resource, params)?;

        match ResolvedIdentifier::from_params(resource, params)? {
            Some(ResolvedIdentifier::Id(id)) => {
                debug!(%resource, id, "resolve: numeric id");
                Ok(Resolved { id, object: None })
            }
            Some(ResolvedIdentifier::NaturalKey(lookup)) => {
                let path = state.collection_path(resource);
                let object = self.lookup(&path, &lookup)?;
                let id = object_id(&object).ok_or_else(|| CoreError::NotFound {
                    resource,
                    identifier: lookup.describe(),
                })?;
                Ok(Resolved {
                    id,
                    object: Some(object),
                })
            }
            None => Err(CoreError::usage(format!(
                "no id or natural key ({}) given for {resource}",
                resource.natural_keys().join(", ")
            ))),
        }
    }

    /// Fetch the single object matching a natural key under `path`.
    ///
    /// An HTTP error answer counts as "not found"; a failure where the server
    /// never answered keeps its own variant. A list response must hold
    /// exactly one match; a detail response (no `count`) is returned as-is.
    pub fn lookup(&self, path: &str, lookup: &NaturalKeyLookup) -> Result<Value, CoreError> {
        debug!(path, key = %lookup.describe(), "lookup: natural key");
        match self.transport.get(path, &lookup.query()) {
            Ok(response) => classify_lookup(response, lookup),
            Err(err) if err.status().is_some() => {
                debug!(error = %err, "lookup: server rejected the lookup");
                Err(CoreError::NotFound {
                    resource: lookup.resource,
                    identifier: lookup.describe(),
                })
            }
            Err(err) => Err(CoreError::from(err)),
        }
    }
}

/// Apply the lookup decision table to a response.
pub fn classify_lookup(response: Value, lookup: &NaturalKeyLookup) -> Result<Value, CoreError> {
    let Some(count) = response
        .get("count")
        .map(|count| count.as_u64().unwrap_or_default())
    else {
        debug!("lookup: detail response");
        return Ok(response);
    };

    let not_found = || CoreError::NotFound {
        resource: lookup.resource,
        identifier: lookup.describe(),
    };

    if count > 1 {
        debug!(count, "lookup: more than one object found");
        return Err(CoreError::AmbiguousNaturalKey {
            resource: lookup.resource,
            key: lookup.describe(),
            count,
        });
    }

    match unwrap_results(response) {
        Value::Array(mut items) if items.len() == 1 => Ok(items.swap_remove(0)),
        Value::Array(items) if items.len() > 1 => Err(CoreError::AmbiguousNaturalKey {
            resource: lookup.resource,
            key: lookup.describe(),
            count: u64::try_from(items.len()).unwrap_or(u64::MAX),
        }),
        _ => Err(not_found()),
    }
}

/// Unwrap a list envelope: `results` when present, else the payload itself.
pub fn unwrap_results(response: Value) -> Value {
    match response {
        Value::Object(mut map) if map.contains_key("results") => {
            map.remove("results").unwrap_or(Value::Null)
        }
        other => other,
    }
}
