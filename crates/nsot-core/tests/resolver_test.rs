#![allow(clippy::unwrap_used)]
// Natural-key resolution and site scoping against a recording transport.

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{Call, FakeTransport, api_error, params};
use nsot_core::{
    AttributeEdit, AttributeUpdate, CoreError, ReconciliationAction, ResourceController,
    ResourceType, UpdateRequest, exit_code,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn tag_update(hostname: &str) -> UpdateRequest {
    UpdateRequest {
        params: params(json!({ "hostname": hostname })),
        attributes: Some(AttributeUpdate {
            action: ReconciliationAction::Add,
            multi: false,
            edits: vec![AttributeEdit::set("owner", "bob")],
        }),
    }
}

// ── Lookup outcomes ─────────────────────────────────────────────────

#[test]
fn test_ambiguous_natural_key_blocks_mutation() {
    let transport = FakeTransport::new(Some(1));
    transport.respond(json!({
        "count": 2,
        "results": [{ "id": 1, "hostname": "foo-bar1" }, { "id": 2, "hostname": "foo-bar1" }],
    }));

    let mut devices = ResourceController::new(&transport, ResourceType::Devices);
    let err = devices.update(tag_update("foo-bar1")).unwrap_err();

    assert!(
        matches!(err, CoreError::AmbiguousNaturalKey { count: 2, .. }),
        "expected AmbiguousNaturalKey, got: {err:?}"
    );
    assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
    assert_eq!(
        transport.calls(),
        vec![Call::Get {
            path: "/sites/1/devices".into(),
            params: params(json!({ "hostname": "foo-bar1", "limit": 1 })),
        }]
    );
    assert!(!transport.calls().iter().any(Call::is_mutating));
}

#[test]
fn test_single_match_resolves_to_its_id() {
    let transport = FakeTransport::new(Some(1));
    transport.respond(json!({ "count": 1, "results": [{ "id": 42, "hostname": "foo-bar1" }] }));

    let mut devices = ResourceController::new(&transport, ResourceType::Devices);
    let resolved = devices
        .resolve(params(json!({ "hostname": "foo-bar1" })))
        .unwrap();

    assert_eq!(resolved.id, 42);
    assert_eq!(
        resolved.object,
        Some(json!({ "id": 42, "hostname": "foo-bar1" }))
    );
}

#[test]
fn test_numeric_id_skips_lookup() {
    let transport = FakeTransport::new(Some(1));
    let mut devices = ResourceController::new(&transport, ResourceType::Devices);

    let resolved = devices.resolve(params(json!({ "id": "42" }))).unwrap();

    assert_eq!(resolved.id, 42);
    assert_eq!(resolved.object, None);
    assert!(transport.calls().is_empty());
}

#[test]
fn test_empty_results_are_not_found() {
    let transport = FakeTransport::new(Some(1));
    transport.respond(json!({ "count": 0, "results": [] }));

    let mut devices = ResourceController::new(&transport, ResourceType::Devices);
    let err = devices
        .remove(params(json!({ "hostname": "ghost" })))
        .unwrap_err();

    assert!(matches!(err, CoreError::NotFound { .. }));
    assert_eq!(err.to_string(), "No matching device found for hostname=ghost");
    assert_eq!(transport.calls().len(), 1);
}

#[test]
fn test_lookup_http_error_is_not_found() {
    let transport = FakeTransport::new(Some(1));
    transport.fail(api_error(500, "boom"));

    let mut devices = ResourceController::new(&transport, ResourceType::Devices);
    let err = devices
        .remove(params(json!({ "hostname": "foo-bar1" })))
        .unwrap_err();

    assert!(
        matches!(err, CoreError::NotFound { .. }),
        "expected NotFound, got: {err:?}"
    );
    assert!(!transport.calls().iter().any(Call::is_mutating));
}

#[test]
fn test_lookup_connection_failure_keeps_its_variant() {
    let transport = FakeTransport::new(Some(1));
    transport.fail(nsot_api::Error::Tls("handshake failed".into()));

    let mut devices = ResourceController::new(&transport, ResourceType::Devices);
    let err = devices
        .remove(params(json!({ "hostname": "foo-bar1" })))
        .unwrap_err();

    assert!(
        matches!(err, CoreError::ConnectionFailed { .. }),
        "expected ConnectionFailed, got: {err:?}"
    );
    assert_eq!(err.exit_code(), exit_code::CONNECTION);
    assert!(!transport.calls().iter().any(Call::is_mutating));
}

#[test]
fn test_invalid_id_is_usage_error_before_any_request() {
    let transport = FakeTransport::new(Some(1));
    let mut devices = ResourceController::new(&transport, ResourceType::Devices);

    let err = devices
        .remove(params(json!({ "id": "abc", "hostname": "foo-bar1" })))
        .unwrap_err();

    assert!(matches!(err, CoreError::Usage { .. }), "got: {err:?}");
    assert_eq!(err.to_string(), "Usage error: invalid device id: \"abc\"");
    assert!(transport.calls().is_empty());
}

#[test]
fn test_detail_response_passes_through() {
    let transport = FakeTransport::new(Some(1));
    transport.respond(json!({ "id": 5, "cidr": "10.0.0.0/8", "parent_id": null }));

    let mut networks = ResourceController::new(&transport, ResourceType::Networks);
    let resolved = networks
        .resolve(params(json!({ "cidr": "10.0.0.0/8" })))
        .unwrap();

    assert_eq!(resolved.id, 5);
}

#[test]
fn test_composite_natural_key_queries_every_field() {
    let transport = FakeTransport::new(Some(1));
    transport.respond(json!({ "count": 1, "results": [{ "id": 9, "name": "ae0", "device": 3 }] }));

    let key = ResourceType::Interfaces
        .split_natural_key("foo-bar1:ae0")
        .unwrap();
    let mut interfaces = ResourceController::new(&transport, ResourceType::Interfaces);
    let resolved = interfaces.resolve(key).unwrap();

    assert_eq!(resolved.id, 9);
    assert_eq!(
        transport.calls(),
        vec![Call::Get {
            path: "/sites/1/interfaces".into(),
            params: params(json!({ "name": "ae0", "device": "foo-bar1", "limit": 1 })),
        }]
    );
}

// ── Site scoping ────────────────────────────────────────────────────

#[test]
fn test_missing_site_fails_before_any_request() {
    let transport = FakeTransport::new(None);
    let mut devices = ResourceController::new(&transport, ResourceType::Devices);

    let err = devices.list(params(json!({ "hostname": "foo-bar1" }))).unwrap_err();

    assert!(matches!(err, CoreError::MissingSiteScope { .. }));
    assert_eq!(err.exit_code(), exit_code::USAGE);
    assert!(transport.calls().is_empty());
}

#[test]
fn test_explicit_site_overrides_default() {
    let transport = FakeTransport::new(Some(1));
    transport.respond(json!({ "count": 0, "results": [] }));

    let mut devices = ResourceController::new(&transport, ResourceType::Devices);
    let listed = devices.list(params(json!({ "site_id": 2 }))).unwrap();

    assert!(listed.is_empty());
    assert_eq!(
        transport.calls(),
        vec![Call::Get {
            path: "/sites/2/devices".into(),
            params: params(json!({})),
        }]
    );
}

#[test]
fn test_rebase_appends_site_segment_once() {
    let transport = FakeTransport::new(None);
    transport
        .respond(json!({ "count": 1, "results": [{ "id": 5, "cidr": "10.0.0.0/8" }] }))
        .respond(json!([{ "id": 1, "cidr": "10.0.0.0/6" }]));

    let mut networks = ResourceController::new(&transport, ResourceType::Networks);
    networks.list(params(json!({ "site_id": 2 }))).unwrap();
    let supernets = networks
        .nested("supernets", params(json!({ "id": 5, "site_id": 2 })))
        .unwrap();

    assert_eq!(networks.path(), "/sites/2/networks");
    assert_eq!(supernets, json!([{ "id": 1, "cidr": "10.0.0.0/6" }]));
    assert_eq!(
        transport.calls()[1],
        Call::Get {
            path: "/sites/2/networks/5/supernets".into(),
            params: params(json!({})),
        }
    );
}

#[test]
fn test_sites_are_never_scoped() {
    let transport = FakeTransport::new(None);
    transport.respond(json!([{ "id": 1, "name": "Default Site" }]));

    let mut sites = ResourceController::new(&transport, ResourceType::Sites);
    let listed = sites.list(params(json!({}))).unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(
        transport.calls(),
        vec![Call::Get {
            path: "/sites".into(),
            params: params(json!({})),
        }]
    );
}
