// ── Resource controller ──
//
// Generic CRUD sequencing for one resource type: rebase, resolve the
// target, fetch current state, reconcile attributes, then mutate. All
// calls are blocking and made in order; one controller serves one
// logical command, so its rebase state is shared by every step.

use serde_json::Value;
use tracing::debug;

use nsot_api::{ObjectId, Params, Transport};

use crate::error::CoreError;
use crate::model::{
    AttributeEdit, AttributeSet, ReconciliationAction, ResolvedIdentifier, ResourceType,
    object_id,
};
use crate::reconcile::reconcile;
use crate::resolve::{IdentifierResolver, RebaseState, Resolved, unwrap_results};

/// Attribute edits to fold into the target object on update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeUpdate {
    pub action: ReconciliationAction,
    /// Treat every edited key as list-valued.
    pub multi: bool,
    pub edits: Vec<AttributeEdit>,
}

/// A PUT against one object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateRequest {
    /// Identifying fields (`id` or natural key), optional `site_id`, and
    /// field overrides. `null` values leave the stored field alone.
    pub params: Params,
    pub attributes: Option<AttributeUpdate>,
}

/// CRUD controller for one resource type.
pub struct ResourceController<'a, T: Transport + ?Sized> {
    transport: &'a T,
    resource: ResourceType,
    rebase: RebaseState,
}

impl<'a, T: Transport + ?Sized> ResourceController<'a, T> {
    pub fn new(transport: &'a T, resource: ResourceType) -> Self {
        Self {
            transport,
            resource,
            rebase: RebaseState::new(),
        }
    }

    pub fn resource(&self) -> ResourceType {
        self.resource
    }

    pub fn rebase_state(&self) -> &RebaseState {
        &self.rebase
    }

    /// Collection path under the current base.
    pub fn path(&self) -> String {
        self.rebase.collection_path(self.resource)
    }

    fn resolver(&self) -> IdentifierResolver<'a, T> {
        IdentifierResolver::new(self.transport)
    }

    /// Scope to a site, then drop any `site_id` left over from a repeat call
    /// so it never leaks into a query or payload.
    fn rebase(&mut self, params: &mut Params) -> Result<(), CoreError> {
        let resolver = self.resolver();
        resolver.rebase(&mut self.rebase, self.resource, params)?;
        params.remove("site_id");
        Ok(())
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Resolve the object `params` identify to its id (and object, when
    /// a lookup fetched it).
    pub fn resolve(&mut self, mut params: Params) -> Result<Resolved, CoreError> {
        self.rebase(&mut params)?;
        let resolver = self.resolver();
        resolver.resolve(&mut self.rebase, self.resource, &mut params)
    }

    /// List objects.
    ///
    /// A numeric id fetches one object. Natural-key fields try a
    /// single-object lookup first and fall back to a filtered list when
    /// that lookup is ambiguous or empty. Anything else is a filtered list.
    pub fn list(&mut self, mut params: Params) -> Result<Vec<Value>, CoreError> {
        self.rebase(&mut params)?;
        let path = self.path();

        match ResolvedIdentifier::from_params(self.resource, &params)? {
            Some(ResolvedIdentifier::Id(id)) => {
                debug!(resource = %self.resource, id, "list: by id");
                let object = self
                    .transport
                    .get_by_id(&path, id)
                    .map_err(|err| self.not_found_or(err, &id.to_string()))?;
                return Ok(vec![unwrap_results(object)]);
            }
            Some(ResolvedIdentifier::NaturalKey(lookup)) => {
                match self.resolver().lookup(&path, &lookup) {
                    Ok(object) => return Ok(vec![object]),
                    Err(
                        err @ (CoreError::NotFound { .. } | CoreError::AmbiguousNaturalKey { .. }),
                    ) => debug!(error = %err, "list: falling back to filtered list"),
                    Err(err) => return Err(err),
                }
            }
            None => {}
        }

        params.remove("id");
        debug!(resource = %self.resource, "list: by params");
        let response = self.transport.get(&path, &params)?;
        Ok(into_objects(unwrap_results(response)))
    }

    /// Run a set query (`<resource>/query/?query=<expr>`).
    pub fn set_query(&mut self, query: &str, mut params: Params) -> Result<Vec<Value>, CoreError> {
        self.rebase(&mut params)?;
        params.insert("query".into(), Value::String(query.to_owned()));
        let path = format!("{}/query", self.path());
        debug!(path, query, "set query");
        let response = self.transport.get(&path, &params)?;
        Ok(into_objects(unwrap_results(response)))
    }

    /// GET a sub-resource of one object, e.g. `networks/5/supernets/` or
    /// the `next_address` detail endpoint.
    ///
    /// The parent is resolved by id or natural key. Without an id, a
    /// non-empty `query` param resolves it through a set query that the
    /// server must answer with exactly one object. The identifying fields
    /// are stripped and the remaining params become the child query.
    pub fn nested(&mut self, child: &str, mut params: Params) -> Result<Value, CoreError> {
        let by_query = params
            .get("id")
            .is_none_or(Value::is_null)
            .then(|| params.get("query").and_then(Value::as_str))
            .flatten()
            .filter(|query| !query.is_empty())
            .map(str::to_owned);

        let parent_id = match by_query {
            Some(query) => self.resolve_by_query(&query, params.clone())?,
            None => self.resolve(params.clone())?.id,
        };

        for key in ["id", "site_id", "query", "unique"] {
            params.remove(key);
        }
        for key in self.resource.natural_keys() {
            params.remove(*key);
        }

        let path = format!("{}/{parent_id}/{}", self.path(), child.trim_matches('/'));
        debug!(path, "nested: fetching");
        let response = self.transport.get(&path, &params)?;
        Ok(unwrap_results(response))
    }

    /// GET a collection-level sub-endpoint with no parent lookup, e.g.
    /// `networks/reserved/`.
    pub fn collection_child(&mut self, child: &str, mut params: Params) -> Result<Value, CoreError> {
        self.rebase(&mut params)?;
        params.remove("id");

        let path = format!("{}/{}", self.path(), child.trim_matches('/'));
        debug!(path, "collection child: fetching");
        let response = self.transport.get(&path, &params)?;
        Ok(unwrap_results(response))
    }

    fn resolve_by_query(&mut self, query: &str, mut params: Params) -> Result<ObjectId, CoreError> {
        self.rebase(&mut params)?;

        let mut unique = Params::new();
        unique.insert("unique".into(), Value::Bool(true));
        let matched = self.set_query(query, unique)?;

        matched
            .first()
            .and_then(object_id)
            .ok_or_else(|| CoreError::NotFound {
                resource: self.resource,
                identifier: format!("query {query}"),
            })
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// POST one object, or a bulk list of objects.
    ///
    /// Site scoping is taken from the (first) object; `site_id` never
    /// reaches the payload.
    pub fn add(&mut self, mut payload: Value) -> Result<Value, CoreError> {
        match &mut payload {
            Value::Object(object) => self.rebase(object)?,
            Value::Array(objects) => {
                let mut first = objects
                    .first()
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                self.rebase(&mut first)?;
                for object in objects.iter_mut().filter_map(Value::as_object_mut) {
                    object.remove("site_id");
                }
            }
            other => {
                return Err(CoreError::usage(format!(
                    "cannot add {}: payload must be an object or a list, got {other}",
                    self.resource
                )));
            }
        }

        let path = self.path();
        debug!(path, "add");
        self.transport
            .post(&path, &payload)
            .map_err(|err| CoreError::rejected(self.resource, "add", err))
    }

    /// PUT an updated object.
    ///
    /// The current object is fetched first so unspecified fields keep their
    /// stored values; attribute edits are reconciled against the stored
    /// attributes rather than replacing them.
    pub fn update(&mut self, request: UpdateRequest) -> Result<Value, CoreError> {
        let UpdateRequest {
            mut params,
            attributes,
        } = request;

        if attributes.as_ref().is_some_and(|a| a.edits.is_empty()) {
            return Err(CoreError::usage(format!(
                "an attribute action on {} needs at least one key=value",
                self.resource
            )));
        }

        self.rebase(&mut params)?;
        let resolved = self.resolve(params.clone())?;
        let path = self.path();

        let existing = match resolved.object {
            Some(object) => object,
            None => self
                .transport
                .get_by_id(&path, resolved.id)
                .map_err(|err| self.not_found_or(err, &resolved.id.to_string()))?,
        };
        let Value::Object(mut payload) = unwrap_results(existing) else {
            return Err(CoreError::Internal(format!(
                "{} {} is not a JSON object",
                self.resource.singular(),
                resolved.id
            )));
        };
        payload.remove("id");

        for (key, value) in params {
            if key == "id" || value.is_null() {
                continue;
            }
            payload.insert(key, value);
        }

        if let Some(update) = attributes {
            let stored: AttributeSet = match payload.remove("attributes") {
                None | Some(Value::Null) => AttributeSet::new(),
                Some(value) => serde_json::from_value(value).map_err(|e| {
                    CoreError::Internal(format!("unreadable attributes: {e}"))
                })?,
            };
            let merged = reconcile(stored, &update.edits, update.action, update.multi);
            let merged = serde_json::to_value(merged)
                .map_err(|e| CoreError::Internal(format!("unserializable attributes: {e}")))?;
            payload.insert("attributes".into(), merged);
        }

        debug!(path, id = resolved.id, "update");
        self.transport
            .put(&path, resolved.id, &Value::Object(payload))
            .map_err(|err| CoreError::rejected(self.resource, "update", err))
    }

    /// DELETE the object `params` identify.
    pub fn remove(&mut self, params: Params) -> Result<Value, CoreError> {
        let resolved = self.resolve(params)?;
        let path = self.path();
        debug!(path, id = resolved.id, "remove");
        self.transport
            .delete(&path, resolved.id)
            .map_err(|err| CoreError::rejected(self.resource, "remove", err))
    }

    fn not_found_or(&self, err: nsot_api::Error, identifier: &str) -> CoreError {
        if err.is_not_found() {
            CoreError::NotFound {
                resource: self.resource,
                identifier: identifier.to_owned(),
            }
        } else {
            CoreError::from(err)
        }
    }
}

/// Flatten an unwrapped response into a list of objects.
fn into_objects(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}
