// ── Attribute reconciliation ──
//
// Folds a batch of attribute edits into a resource's current attributes,
// producing the full mapping to send back on PUT. Scalar attributes are
// overwritten or dropped; multi attributes behave like ordered sets.

use std::collections::HashSet;

use tracing::debug;

use crate::model::{AttributeEdit, AttributeSet, AttributeValue, ReconciliationAction};

/// Apply `edits` to `existing` and return the resulting attribute set.
///
/// Edits apply in order. With `multi`, every key an edit names is treated
/// as list-valued regardless of what is stored now. This never fails:
/// deleting absent keys or values is a no-op.
pub fn reconcile(
    mut existing: AttributeSet,
    edits: &[AttributeEdit],
    action: ReconciliationAction,
    multi: bool,
) -> AttributeSet {
    debug!(%action, multi, edits = edits.len(), "reconciling attributes");

    // Keys already reset by a multi replace in this call.
    let mut reset: HashSet<&str> = HashSet::new();

    for edit in edits {
        if multi {
            apply_list(&mut existing, edit, action, &mut reset);
        } else {
            apply_scalar(&mut existing, edit, action);
        }
    }

    existing
}

fn apply_scalar(attrs: &mut AttributeSet, edit: &AttributeEdit, action: ReconciliationAction) {
    match action {
        ReconciliationAction::Add | ReconciliationAction::Replace => {
            debug!(key = %edit.key, value = edit.value_or_empty(), "[single] setting");
            attrs.insert(
                edit.key.clone(),
                AttributeValue::Scalar(edit.value_or_empty().to_owned()),
            );
        }
        ReconciliationAction::Delete => {
            debug!(key = %edit.key, "[single] removing");
            attrs.shift_remove(&edit.key);
        }
    }
}

fn apply_list<'e>(
    attrs: &mut AttributeSet,
    edit: &'e AttributeEdit,
    action: ReconciliationAction,
    reset: &mut HashSet<&'e str>,
) {
    match action {
        ReconciliationAction::Add => {
            debug!(key = %edit.key, value = edit.value_or_empty(), "[multi] adding");
            push_unique(attrs, &edit.key, edit.value_or_empty());
        }
        ReconciliationAction::Replace => {
            if reset.insert(edit.key.as_str()) {
                debug!(key = %edit.key, "[multi] resetting before replace");
                attrs.insert(edit.key.clone(), AttributeValue::List(Vec::new()));
            }
            debug!(key = %edit.key, value = edit.value_or_empty(), "[multi] replacing");
            push_unique(attrs, &edit.key, edit.value_or_empty());
        }
        ReconciliationAction::Delete => {
            debug!(key = %edit.key, value = ?edit.value, "[multi] removing");
            remove_value(attrs, &edit.key, edit.non_empty_value());
        }
    }
}

/// Append `value` to the list at `key` unless already present.
fn push_unique(attrs: &mut AttributeSet, key: &str, value: &str) {
    match attrs.get_mut(key) {
        Some(slot) => {
            let mut items = std::mem::replace(slot, AttributeValue::List(Vec::new())).into_list();
            if !items.iter().any(|item| item == value) {
                items.push(value.to_owned());
            }
            *slot = AttributeValue::List(items);
        }
        None => {
            attrs.insert(key.to_owned(), AttributeValue::List(vec![value.to_owned()]));
        }
    }
}

/// Remove one occurrence of `value` from the list at `key`. With no value,
/// or when the list ends up empty, the key goes away entirely.
fn remove_value(attrs: &mut AttributeSet, key: &str, value: Option<&str>) {
    let Some(value) = value else {
        attrs.shift_remove(key);
        return;
    };
    let Some(slot) = attrs.get_mut(key) else {
        return;
    };

    let mut items = std::mem::replace(slot, AttributeValue::List(Vec::new())).into_list();
    if let Some(pos) = items.iter().position(|item| item == value) {
        items.remove(pos);
    }

    if items.is_empty() {
        attrs.shift_remove(key);
    } else {
        *slot = AttributeValue::List(items);
    }
}
