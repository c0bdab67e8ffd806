#![allow(clippy::unwrap_used)]
// Integration tests for `Connector` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ipam_api::entity::{
    ApiObject, Cidr, Configuration, DeploymentRole, DhcpRange, HostRecord, Network, Zone,
};
use ipam_api::{Connector, Credentials, Error, HostConfig, Scheme, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

fn host_for(server: &MockServer) -> HostConfig {
    let addr = server.address();
    HostConfig::new(Scheme::Http, addr.ip().to_string(), addr.port())
}

fn credentials() -> Credentials {
    Credentials::new("admin", SecretString::from("s3cret".to_owned()))
}

async fn mount_login(server: &MockServer, reply: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(reply)
        .mount(server)
        .await;
}

async fn setup() -> (MockServer, Connector) {
    let server = MockServer::start().await;
    mount_login(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"access_token": "abc123"})),
    )
    .await;
    let connector = Connector::connect(host_for(&server), &credentials(), &TransportConfig::default())
        .await
        .unwrap();
    (server, connector)
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_posts_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_json(json!({
            "username": "admin",
            "password": "s3cret",
            "encrypt_password": false,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "abc123"})))
        .expect(1)
        .mount(&server)
        .await;

    Connector::connect(host_for(&server), &credentials(), &TransportConfig::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_raw_token_reply_is_used_verbatim() {
    let server = MockServer::start().await;
    let raw = "Session Token-> BAMAuthToken: XyZ <- for User : admin";
    mount_login(&server, ResponseTemplate::new(200).set_body_json(json!(raw))).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/configurations/prod/"))
        .and(header("Auth", format!("Basic {raw}").as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 7, "name": "prod", "type": "Configuration"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let connector = Connector::connect(host_for(&server), &credentials(), &TransportConfig::default())
        .await
        .unwrap();
    let cfg: Configuration = connector
        .get_object(&Configuration::existing("prod"))
        .await
        .unwrap();
    assert_eq!(cfg.id, 7);
}

#[tokio::test]
async fn test_login_failure_is_authentication_error() {
    let server = MockServer::start().await;
    mount_login(&server, ResponseTemplate::new(401).set_body_string("Invalid credentials")).await;

    let result =
        Connector::connect(host_for(&server), &credentials(), &TransportConfig::default()).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error"
    );
}

#[tokio::test]
async fn test_unrecognised_token_reply_is_rejected() {
    let server = MockServer::start().await;
    mount_login(&server, ResponseTemplate::new(200).set_body_json(json!({"detail": "?"}))).await;

    let result =
        Connector::connect(host_for(&server), &credentials(), &TransportConfig::default()).await;
    assert!(matches!(result, Err(Error::Authentication { .. })));
}

// ── CRUD ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_returns_raw_reply_and_sends_auth() {
    let (server, connector) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/configurations/"))
        .and(header("Auth", "Basic abc123"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"name": "terraform_test", "properties": ""})))
        .respond_with(ResponseTemplate::new(201).set_body_string("{\"id\": 11}"))
        .expect(1)
        .mount(&server)
        .await;

    let raw = connector
        .create_object(&Configuration::new("terraform_test", ""))
        .await
        .unwrap();
    assert_eq!(raw, "{\"id\": 11}");
}

#[tokio::test]
async fn test_get_with_zero_id_is_not_found() {
    let (server, connector) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/configurations/missing/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 0, "name": null, "properties": null})),
        )
        .mount(&server)
        .await;

    let err = connector
        .get_object::<ApiObject, _>(&Configuration::existing("missing"))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
}

#[tokio::test]
async fn test_get_404_is_not_found() {
    let (server, connector) = setup().await;

    Mock::given(method("GET"))
        .and(path(
            "/api/v1/configurations/cfg/views/internal/zones/example.com/host_records/a2.example.com/",
        ))
        .respond_with(ResponseTemplate::new(404).set_body_string("Object not found"))
        .mount(&server)
        .await;

    let err = connector
        .get_object::<HostRecord, _>(&HostRecord::existing(
            "cfg",
            "internal",
            "example.com",
            "a2.example.com",
        ))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_rejected_status_carries_body() {
    let (server, connector) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/configurations/"))
        .respond_with(ResponseTemplate::new(409).set_body_string("Duplicate of another item"))
        .mount(&server)
        .await;

    let err = connector
        .create_object(&Configuration::new("dup", ""))
        .await
        .unwrap_err();
    match err {
        Error::Http { status, body, .. } => {
            assert_eq!(status, 409);
            assert_eq!(body, "Duplicate of another item");
        }
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_update_uses_patch_and_decodes() {
    let (server, connector) = setup().await;
    let cidr = Cidr::parse("10.0.0.0/24").unwrap();

    Mock::given(method("PATCH"))
        .and(path("/api/v1/configurations/cfg/ipv4_networks/10.0.0.0/24/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 55,
            "name": "lan",
            "type": "IP4Network",
            "properties": "CIDR=10.0.0.0/24|gateway=10.0.0.1|",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut net = Network::existing("cfg", &cidr);
    net.name = "lan".into();
    let updated: Network = connector.update_object(&net).await.unwrap();
    assert_eq!(updated.id, 55);
    assert_eq!(updated.gateway(), "10.0.0.1");
}

#[tokio::test]
async fn test_delete_accepts_no_content() {
    let (server, connector) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/configurations/cfg/views/internal/zones/example.com/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let raw = connector
        .delete_object(&Zone::existing("cfg", "internal", "example.com"))
        .await
        .unwrap();
    assert!(raw.is_empty());
}

#[tokio::test]
async fn test_ipv6_range_path_has_no_trailing_slash() {
    let (server, connector) = setup().await;
    let net = Cidr::parse("2001:db8::/64").unwrap();

    Mock::given(method("DELETE"))
        .and(path(
            "/api/v1/configurations/cfg/ipv6_networks/2001:db8::/64/dhcp_range/start/2001:db8::10/end/2001:db8::20",
        ))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    connector
        .delete_object(&DhcpRange::existing("cfg", &net, "2001:db8::10", "2001:db8::20"))
        .await
        .unwrap();
}

// ── Listing, deploy, logout ─────────────────────────────────────────

#[tokio::test]
async fn test_list_accepts_bare_and_wrapped_arrays() {
    let (server, connector) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/configurations/cfg/views/internal/zones/example.com/deployment_roles/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": 1, "server_fqdn": "s1.example.com", "role": "MASTER"},
                {"id": 2, "server_fqdn": "s2.example.com", "role": "SLAVE"},
            ]
        })))
        .mount(&server)
        .await;

    let roles: Vec<DeploymentRole> = connector
        .list_objects(&DeploymentRole::listing("cfg", "internal", "example.com"))
        .await
        .unwrap();
    assert_eq!(roles.len(), 2);
    assert_eq!(roles[1].fqdn(), "s2.example.com");
}

#[tokio::test]
async fn test_deploy_posts_batch_mode() {
    let (server, connector) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/configurations/cfg/views/internal/zones/example.com/deploy/"))
        .and(body_json(json!({"batch_mode": true})))
        .respond_with(ResponseTemplate::new(201).set_body_string("queued"))
        .expect(1)
        .mount(&server)
        .await;

    let reply = connector
        .deploy_object(&Zone::existing("cfg", "internal", "example.com"), true)
        .await
        .unwrap();
    assert_eq!(reply, "queued");
}

#[tokio::test]
async fn test_logout_is_best_effort() {
    let (server, connector) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    connector.logout().await;
}
