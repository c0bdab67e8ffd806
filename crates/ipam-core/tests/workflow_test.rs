#![allow(clippy::unwrap_used)]
// End-to-end workflow tests for `ObjectManager` against a wiremock appliance.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ipam_core::{
    ConnectionConfig, CoreError, Credentials, HostConfig, IpAllocation, NetworkSpec,
    ObjectManager, Observed, RoleEffect, Scheme, ServerRole, observe,
};

const ROLES: &str = "/api/v1/configurations/prod/views/default/zones/example.com/deployment_roles/";
const HOST_RECORDS: &str = "/api/v1/configurations/prod/views/default/zones/example.com/host_records/";

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ObjectManager) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t0k"})))
        .mount(&server)
        .await;

    let addr = server.address();
    let config = ConnectionConfig::new(
        HostConfig::new(Scheme::Http, addr.ip().to_string(), addr.port()),
        Credentials::new("admin", SecretString::from("pw".to_owned())),
    );
    let manager = ObjectManager::connect(&config).await.unwrap();
    (server, manager)
}

async fn mount(server: &MockServer, verb: &str, at: &str, reply: ResponseTemplate) {
    Mock::given(method(verb))
        .and(path(at))
        .respond_with(reply)
        .mount(server)
        .await;
}

fn ok_json(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

// ── IP allocation ───────────────────────────────────────────────────

#[tokio::test]
async fn test_allocation_without_zone_sets_mac_and_skips_host_record() {
    let (server, manager) = setup().await;

    Mock::given(method("POST"))
        .and(path(
            "/api/v1/configurations/prod/ipv4_networks/10.0.0.0/24/get_next_ip/",
        ))
        .and(body_partial_json(json!({
            "name": "alloc",
            "action": "MAKE_STATIC",
            "properties": "|excludeDHCPRange=true",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 11, "address": "10.0.0.5"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/configurations/prod/ipv4_addresses/10.0.0.5/"))
        .and(body_partial_json(json!({"mac_address": "00:11:22:33:44:55"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    mount(
        &server,
        "GET",
        "/api/v1/configurations/prod/ipv4_addresses/10.0.0.5/",
        ok_json(json!({
            "id": 11,
            "address": "10.0.0.5",
            "mac_address": "00:11:22:33:44:55",
            "properties": "state=STATIC|",
        })),
    )
    .await;

    Mock::given(method("POST"))
        .and(path(HOST_RECORDS))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let req = IpAllocation {
        configuration: "prod".into(),
        name: "alloc".into(),
        network: "10.0.0.0/24".into(),
        mac_address: Some("00-11-22-33-44-55".into()),
        ..IpAllocation::default()
    };
    let allocated = manager
        .allocate_ip_resource(&req, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(allocated.identifier, "10.0.0.5");
    assert!(allocated.host_record.is_none());
    assert_eq!(allocated.address.current_mac(), "00:11:22:33:44:55");
}

#[tokio::test]
async fn test_allocation_with_zone_publishes_host_record() {
    let (server, manager) = setup().await;

    mount(
        &server,
        "POST",
        "/api/v1/configurations/prod/ipv4_networks/10.0.0.0/24/get_next_ip/",
        ResponseTemplate::new(201).set_body_json(json!({"id": 12, "address": "10.0.0.6"})),
    )
    .await;

    Mock::given(method("POST"))
        .and(path(HOST_RECORDS))
        .and(body_partial_json(json!({
            "absolute_name": "allocation.example.com",
            "addresses": "10.0.0.6",
            "ttl": -1,
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    mount(
        &server,
        "GET",
        &format!("{HOST_RECORDS}allocation.example.com/"),
        ok_json(json!({
            "id": 30,
            "absolute_name": "allocation.example.com",
            "addresses": "10.0.0.6",
            "ttl": -1,
            "properties": "",
        })),
    )
    .await;
    mount(
        &server,
        "GET",
        "/api/v1/configurations/prod/ipv4_addresses/10.0.0.6/",
        ok_json(json!({"id": 12, "address": "10.0.0.6", "properties": "state=STATIC|"})),
    )
    .await;

    let req = IpAllocation {
        configuration: "prod".into(),
        view: "default".into(),
        zone: "example.com".into(),
        name: "allocation".into(),
        network: "10.0.0.0/24".into(),
        ..IpAllocation::default()
    };
    let allocated = manager
        .allocate_ip_resource(&req, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(allocated.identifier, "allocation.example.com");
    assert_eq!(allocated.zone, "example.com");
    let host = allocated.host_record.unwrap();
    assert_eq!(host.address_list(), vec!["10.0.0.6".to_owned()]);
}

#[tokio::test]
async fn test_allocation_releases_address_when_host_record_fails() {
    let (server, manager) = setup().await;

    mount(
        &server,
        "POST",
        "/api/v1/configurations/prod/ipv4_networks/10.0.0.0/24/get_next_ip/",
        ResponseTemplate::new(201).set_body_json(json!({"id": 13, "address": "10.0.0.7"})),
    )
    .await;
    mount(
        &server,
        "POST",
        HOST_RECORDS,
        ResponseTemplate::new(409).set_body_string("Duplicate of another item"),
    )
    .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/configurations/prod/ipv4_addresses/10.0.0.7/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let req = IpAllocation {
        configuration: "prod".into(),
        view: "default".into(),
        zone: "example.com".into(),
        name: "allocation".into(),
        network: "10.0.0.0/24".into(),
        ..IpAllocation::default()
    };
    let err = manager
        .allocate_ip_resource(&req, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.rollback().unwrap().is_applied(), "got {err}");
}

#[tokio::test]
async fn test_cancelled_allocation_claims_nothing() {
    let (server, manager) = setup().await;

    Mock::given(method("POST"))
        .and(path(
            "/api/v1/configurations/prod/ipv4_networks/10.0.0.0/24/get_next_ip/",
        ))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let req = IpAllocation {
        configuration: "prod".into(),
        name: "alloc".into(),
        network: "10.0.0.0/24".into(),
        ..IpAllocation::default()
    };
    let err = manager.allocate_ip_resource(&req, &cancel).await.unwrap_err();
    assert!(err.is_cancelled());
}

// ── Block hierarchy ─────────────────────────────────────────────────

#[tokio::test]
async fn test_block_hierarchy_nests_under_parent() {
    let (server, manager) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/configurations/prod/ipv4_blocks/"))
        .and(body_partial_json(json!({"address": "10.0.0.0", "cidr": 8})))
        .respond_with(ResponseTemplate::new(201).set_body_string("101"))
        .expect(1)
        .mount(&server)
        .await;
    mount(
        &server,
        "GET",
        "/api/v1/configurations/prod/ipv4_blocks/10.0.0.0/8/",
        ok_json(json!({"id": 101, "name": "root", "properties": "CIDR=10.0.0.0/8|"})),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/configurations/prod/ipv4_blocks/10.0.0.0/8/ipv4_blocks/"))
        .and(body_partial_json(json!({"address": "10.1.0.0", "cidr": 16})))
        .respond_with(ResponseTemplate::new(201).set_body_string("102"))
        .expect(1)
        .mount(&server)
        .await;
    mount(
        &server,
        "GET",
        "/api/v1/configurations/prod/ipv4_blocks/10.1.0.0/16/",
        ok_json(json!({"id": 102, "name": "child", "properties": "CIDR=10.1.0.0/16|"})),
    )
    .await;

    Mock::given(method("POST"))
        .and(path(
            "/api/v1/configurations/prod/ipv4_blocks/10.1.0.0/16/ipv4_networks/",
        ))
        .and(body_partial_json(json!({"cidr": "10.1.2.0/24"})))
        .respond_with(ResponseTemplate::new(201).set_body_string("103"))
        .expect(1)
        .mount(&server)
        .await;
    mount(
        &server,
        "GET",
        "/api/v1/configurations/prod/ipv4_networks/10.1.2.0/24/",
        ok_json(json!({"id": 103, "name": "leaf", "properties": "gateway=10.1.2.1|"})),
    )
    .await;

    let root = manager
        .create_block("prod", "10.0.0.0/8", None, "root", "")
        .await
        .unwrap();
    assert_eq!(root.cidr_notation(), "10.0.0.0/8");

    let child = manager
        .create_block("prod", "10.1.0.0/16", Some("10.0.0.0/8"), "child", "")
        .await
        .unwrap();
    assert_eq!(child.cidr_notation(), "10.1.0.0/16");

    let spec = NetworkSpec {
        configuration: "prod".into(),
        parent_block: "10.1.0.0/16".into(),
        cidr: "10.1.2.0/24".into(),
        name: "leaf".into(),
        gateway: "10.1.2.1".into(),
        ..NetworkSpec::default()
    };
    let network = manager.create_network(&spec).await.unwrap();
    assert_eq!(network.cidr_notation(), "10.1.2.0/24");
    assert_eq!(network.gateway, "10.1.2.1");
}

#[tokio::test]
async fn test_block_rejects_mixed_families_before_any_request() {
    let (_server, manager) = setup().await;

    let err = manager
        .create_block("prod", "10.1.0.0/16", Some("2001:db8::/32"), "child", "")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }), "got {err:?}");
}

// ── PTR ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_ptr_updates_host_record() {
    let (server, manager) = setup().await;
    let record = format!("{HOST_RECORDS}a.example.com/");

    Mock::given(method("GET"))
        .and(path(record.as_str()))
        .respond_with(ok_json(json!({
            "id": 40,
            "absolute_name": "a.example.com",
            "addresses": "10.0.0.9",
            "properties": "reverseRecord=false|ttl=300|",
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(record.as_str()))
        .and(body_partial_json(json!({"ttl": 300})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    mount(
        &server,
        "GET",
        &record,
        ok_json(json!({
            "id": 40,
            "absolute_name": "a.example.com",
            "addresses": "10.0.0.9",
            "properties": "reverseRecord=true|ttl=300|",
        })),
    )
    .await;

    let host = manager
        .set_ptr("prod", "default", "a.example.com", "True", &CancellationToken::new())
        .await
        .unwrap();
    assert!(host.reverse_record());
}

#[tokio::test]
async fn test_set_ptr_already_in_place_writes_nothing() {
    let (server, manager) = setup().await;
    let record = format!("{HOST_RECORDS}a.example.com/");

    mount(
        &server,
        "GET",
        &record,
        ok_json(json!({
            "id": 40,
            "absolute_name": "a.example.com",
            "properties": "reverseRecord=true|ttl=300|",
        })),
    )
    .await;
    Mock::given(method("PATCH"))
        .and(path(record.as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let host = manager
        .set_ptr("prod", "default", "a.example.com", "yes", &CancellationToken::new())
        .await
        .unwrap();
    assert!(host.reverse_record());
}

#[tokio::test]
async fn test_set_ptr_without_host_record_is_validation_error() {
    let (server, manager) = setup().await;
    mount(
        &server,
        "GET",
        &format!("{HOST_RECORDS}missing.example.com/"),
        ResponseTemplate::new(404).set_body_string("Object was not found"),
    )
    .await;

    let err = manager
        .set_ptr("prod", "default", "missing.example.com", "true", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_clear_ptr_keeps_host_record() {
    let (server, manager) = setup().await;
    let record = format!("{HOST_RECORDS}a.example.com/");

    Mock::given(method("GET"))
        .and(path(record.as_str()))
        .respond_with(ok_json(json!({
            "id": 40,
            "absolute_name": "a.example.com",
            "addresses": "10.0.0.9",
            "properties": "reverseRecord=true|ttl=300|",
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(record.as_str()))
        .and(body_partial_json(json!({
            "ttl": 300,
            "properties": "ttl=300|reverseRecord=false|",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(record.as_str()))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    mount(
        &server,
        "GET",
        &record,
        ok_json(json!({
            "id": 40,
            "absolute_name": "a.example.com",
            "addresses": "10.0.0.9",
            "properties": "ttl=300|reverseRecord=false|",
        })),
    )
    .await;

    let host = manager
        .clear_ptr("prod", "default", "a.example.com", &CancellationToken::new())
        .await
        .unwrap();
    assert!(!host.reverse_record());
    assert_eq!(host.address_list(), vec!["10.0.0.9".to_owned()]);
}

// ── Allocation update and release ───────────────────────────────────

#[tokio::test]
async fn test_update_with_zone_appends_address_and_keeps_ttl() {
    let (server, manager) = setup().await;
    let record = format!("{HOST_RECORDS}h.example.com/");
    let ip = "/api/v1/configurations/prod/ipv4_addresses/10.0.0.16/";

    mount(
        &server,
        "GET",
        ip,
        ok_json(json!({"id": 16, "address": "10.0.0.16", "properties": "state=STATIC|"})),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(record.as_str()))
        .respond_with(ok_json(json!({
            "id": 41,
            "absolute_name": "h.example.com",
            "addresses": "10.0.0.15",
            "properties": "absoluteName=h.example.com|addresses=10.0.0.15|ttl=600|parentId=3|",
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // One address list in the body: the field and the property agree.
    Mock::given(method("PATCH"))
        .and(path(record.as_str()))
        .and(body_partial_json(json!({
            "addresses": "10.0.0.15,10.0.0.16",
            "ttl": 600,
            "properties": "absoluteName=h.example.com|ttl=600|addresses=10.0.0.15,10.0.0.16|",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(ip))
        .and(body_partial_json(json!({
            "name": "h",
            "action": "MAKE_STATIC",
            "properties": "",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    mount(
        &server,
        "GET",
        &record,
        ok_json(json!({
            "id": 41,
            "absolute_name": "h.example.com",
            "addresses": "10.0.0.15,10.0.0.16",
            "ttl": 600,
            "properties": "absoluteName=h.example.com|addresses=10.0.0.15,10.0.0.16|ttl=600|",
        })),
    )
    .await;

    let req = IpAllocation {
        configuration: "prod".into(),
        view: "default".into(),
        zone: "example.com".into(),
        name: "h".into(),
        ip_address: Some("10.0.0.16".into()),
        ..IpAllocation::default()
    };
    let updated = manager
        .update_allocated_resource(&req, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(updated.identifier, "h.example.com");
    let host = updated.host_record.unwrap();
    assert_eq!(host.address_list(), vec!["10.0.0.15".to_owned(), "10.0.0.16".to_owned()]);
    assert_eq!(host.effective_ttl(), 600);
}

#[tokio::test]
async fn test_update_without_zone_strips_appliance_keys() {
    let (server, manager) = setup().await;
    let ip = "/api/v1/configurations/prod/ipv4_addresses/10.0.0.20/";

    mount(
        &server,
        "GET",
        ip,
        ok_json(json!({
            "id": 20,
            "address": "10.0.0.20",
            "properties": "state=STATIC|address=10.0.0.20|macAddress=aa:bb:cc:dd:ee:ff|custom=1|parentId=9|",
        })),
    )
    .await;
    Mock::given(method("PATCH"))
        .and(path(ip))
        .and(body_partial_json(json!({
            "name": "plain",
            "mac_address": "aa:bb:cc:dd:ee:ff",
            "properties": "custom=2|owner=ops|",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(HOST_RECORDS))
        .respond_with(ok_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let req = IpAllocation {
        configuration: "prod".into(),
        name: "plain".into(),
        ip_address: Some("10.0.0.20".into()),
        properties: "custom=2|owner=ops|".into(),
        ..IpAllocation::default()
    };
    let updated = manager
        .update_allocated_resource(&req, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(updated.identifier, "10.0.0.20");
    assert!(updated.host_record.is_none());
}

#[tokio::test]
async fn test_release_of_missing_address_is_quiet() {
    let (server, manager) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/configurations/prod/ipv4_addresses/10.0.0.30/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Object was not found"))
        .expect(1)
        .mount(&server)
        .await;

    let req = IpAllocation {
        configuration: "prod".into(),
        name: "gone".into(),
        ..IpAllocation::default()
    };
    manager.release_ip_resource(&req, "10.0.0.30").await.unwrap();
}

#[tokio::test]
async fn test_release_with_zone_deletes_host_record_only() {
    let (server, manager) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(format!("{HOST_RECORDS}gone.example.com/").as_str()))
        .respond_with(ResponseTemplate::new(404).set_body_string("Object was not found"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/configurations/prod/ipv4_addresses/10.0.0.31/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let req = IpAllocation {
        configuration: "prod".into(),
        view: "default".into(),
        zone: "example.com".into(),
        name: "gone".into(),
        ..IpAllocation::default()
    };
    manager.release_ip_resource(&req, "10.0.0.31").await.unwrap();
}

// ── Zone server roles ───────────────────────────────────────────────

#[tokio::test]
async fn test_role_reconcile_rolls_back_on_failed_create() {
    let (server, manager) = setup().await;

    mount(
        &server,
        "GET",
        "/api/v1/configurations/prod/servers/ns2.example.com/",
        ok_json(json!({"id": 5, "name": "ns2"})),
    )
    .await;
    mount(
        &server,
        "GET",
        ROLES,
        ok_json(json!([
            {"id": 1, "server_fqdn": "ns1.example.com", "role": "MASTER", "role_type": "DNS", "properties": ""}
        ])),
    )
    .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{ROLES}ns1.example.com/").as_str()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ROLES))
        .and(body_partial_json(json!({"server_fqdn": "ns2.example.com", "role": "MASTER"})))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ROLES))
        .and(body_partial_json(json!({"server_fqdn": "ns1.example.com", "role": "MASTER"})))
        .respond_with(ResponseTemplate::new(201).set_body_string("77"))
        .expect(1)
        .mount(&server)
        .await;

    let err = manager
        .reconcile_server_roles(
            "prod",
            "default",
            "example.com",
            &["PRIMARY, ns2.example.com".to_owned()],
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(err.rollback().unwrap().is_applied(), "got {err}");
}

#[tokio::test]
async fn test_role_reconcile_changes_role_in_place() {
    let (server, manager) = setup().await;

    mount(
        &server,
        "GET",
        "/api/v1/configurations/prod/servers/ns1.example.com/",
        ok_json(json!({"id": 4, "name": "ns1"})),
    )
    .await;
    mount(
        &server,
        "GET",
        ROLES,
        ok_json(json!({"data": [
            {"id": 1, "server_fqdn": "ns1.example.com", "role": "SLAVE", "properties": ""}
        ]})),
    )
    .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{ROLES}ns1.example.com/").as_str()))
        .and(body_partial_json(json!({"role": "SLAVE_STEALTH"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let effects = manager
        .reconcile_server_roles(
            "prod",
            "default",
            "example.com",
            &["secondary_stealth, ns1.example.com".to_owned()],
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        effects,
        vec![RoleEffect::Updated {
            server: "ns1.example.com".into(),
            previous: ServerRole::Secondary,
        }]
    );
}

#[tokio::test]
async fn test_role_reconcile_unknown_server_changes_nothing() {
    let (server, manager) = setup().await;

    mount(
        &server,
        "GET",
        "/api/v1/configurations/prod/servers/ghost.example.com/",
        ResponseTemplate::new(404).set_body_string("Server does not exist"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(ROLES))
        .respond_with(ok_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let err = manager
        .reconcile_server_roles(
            "prod",
            "default",
            "example.com",
            &["PRIMARY, ghost.example.com".to_owned()],
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_role_reconcile_rollback_inverts_every_applied_step() {
    let (server, manager) = setup().await;

    for fqdn in ["s1.example.com", "s3.example.com"] {
        mount(
            &server,
            "GET",
            &format!("/api/v1/configurations/prod/servers/{fqdn}/"),
            ok_json(json!({"id": 6, "name": fqdn})),
        )
        .await;
    }
    mount(
        &server,
        "GET",
        ROLES,
        ok_json(json!([
            {"id": 1, "server_fqdn": "s1.example.com", "role": "MASTER", "properties": ""},
            {"id": 2, "server_fqdn": "s2.example.com", "role": "SLAVE", "properties": ""}
        ])),
    )
    .await;
    let s1 = format!("{ROLES}s1.example.com/");

    // Forward: delete s2, demote s1, create s3 (fails).
    Mock::given(method("DELETE"))
        .and(path(format!("{ROLES}s2.example.com/").as_str()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(s1.as_str()))
        .and(body_partial_json(json!({"role": "SLAVE"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ROLES))
        .and(body_partial_json(json!({"server_fqdn": "s3.example.com", "role": "MASTER"})))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    // Inverse, newest first: promote s1 back, recreate s2.
    Mock::given(method("PATCH"))
        .and(path(s1.as_str()))
        .and(body_partial_json(json!({"role": "MASTER"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ROLES))
        .and(body_partial_json(json!({"server_fqdn": "s2.example.com", "role": "SLAVE"})))
        .respond_with(ResponseTemplate::new(201).set_body_string("78"))
        .expect(1)
        .mount(&server)
        .await;

    let err = manager
        .reconcile_server_roles(
            "prod",
            "default",
            "example.com",
            &[
                "SECONDARY, s1.example.com".to_owned(),
                "PRIMARY, s3.example.com".to_owned(),
            ],
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(!err.is_cancelled());
    assert!(err.rollback().unwrap().is_applied(), "got {err}");
}

#[tokio::test]
async fn test_cancelled_role_reconcile_still_rolls_back() {
    let (server, manager) = setup().await;

    mount(
        &server,
        "GET",
        "/api/v1/configurations/prod/servers/ns2.example.com/",
        ok_json(json!({"id": 5, "name": "ns2"})),
    )
    .await;
    mount(
        &server,
        "GET",
        ROLES,
        ok_json(json!([
            {"id": 1, "server_fqdn": "ns1.example.com", "role": "MASTER", "properties": ""}
        ])),
    )
    .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{ROLES}ns1.example.com/").as_str()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    // The create hangs until the caller gives up.
    Mock::given(method("POST"))
        .and(path(ROLES))
        .and(body_partial_json(json!({"server_fqdn": "ns2.example.com"})))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ROLES))
        .and(body_partial_json(json!({"server_fqdn": "ns1.example.com", "role": "MASTER"})))
        .respond_with(ResponseTemplate::new(201).set_body_string("79"))
        .expect(1)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let err = manager
        .reconcile_server_roles(
            "prod",
            "default",
            "example.com",
            &["PRIMARY, ns2.example.com".to_owned()],
            &cancel,
        )
        .await
        .unwrap_err();

    assert!(err.is_cancelled(), "got {err:?}");
    assert!(err.rollback().unwrap().is_applied(), "got {err}");
}

// ── Drift ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_vanished_host_record_clears_identifier() {
    let (server, manager) = setup().await;
    mount(
        &server,
        "GET",
        &format!("{HOST_RECORDS}a2.example.com/"),
        ResponseTemplate::new(404).set_body_string("Object was not found"),
    )
    .await;

    let mut identifier = Some("a2.example.com".to_owned());
    let observed = observe(
        &mut identifier,
        "",
        manager.get_host_record("prod", "default", "example.com", "a2.example.com"),
    )
    .await
    .unwrap();

    assert!(matches!(observed, Observed::Drifted));
    assert!(identifier.is_none());
}

#[tokio::test]
async fn test_id_zero_reply_counts_as_drift() {
    let (server, manager) = setup().await;
    mount(
        &server,
        "GET",
        "/api/v1/configurations/prod/ipv4_addresses/10.0.0.8/",
        ok_json(json!({"id": 0, "properties": ""})),
    )
    .await;

    let mut identifier = Some("10.0.0.8".to_owned());
    let observed = observe(
        &mut identifier,
        "",
        manager.get_ip_address("prod", "10.0.0.8"),
    )
    .await
    .unwrap();
    assert!(observed.present().is_none());
    assert!(identifier.is_none());
}
