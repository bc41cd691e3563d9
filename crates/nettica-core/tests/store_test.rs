#![allow(clippy::unwrap_used)]
// Integration tests for the resource stores using wiremock.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nettica_core::model::Limits;
use nettica_core::store::PLACEHOLDER_PNG_BASE64;
use nettica_core::{
    Account, Console, ConsoleConfig, CoreError, CredentialSlot, CredentialStore, Device, Feedback,
    Liveness, MemoryCredentialStore, Net,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Arc<MemoryCredentialStore>, Console) {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryCredentialStore::new());
    store.save(CredentialSlot::Server, &server.uri());
    store.save(CredentialSlot::Token, "primary-token");
    let console = Console::new(ConsoleConfig::default(), store.clone()).unwrap();
    (server, store, console)
}

fn api(suffix: &str) -> String {
    format!("/api/v1.0{suffix}")
}

fn seen_ago(secs: i64) -> String {
    (Utc::now() - TimeDelta::seconds(secs)).to_rfc3339()
}

async fn mount_devices(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(api("/device")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn device(id: &str, name: &str) -> Device {
    Device {
        id: id.into(),
        name: name.into(),
        ..Device::default()
    }
}

fn ids(devices: &[Arc<Device>]) -> Vec<&str> {
    devices.iter().map(|d| d.id.as_str()).collect()
}

// ── Devices ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_read_all_classifies_liveness() {
    let (server, _store, console) = setup().await;
    mount_devices(
        &server,
        json!([
            { "id": "phone", "name": "phone", "platform": "iOS", "lastSeen": seen_ago(40) },
            { "id": "srv", "name": "srv", "platform": "Linux", "lastSeen": seen_ago(40) },
            { "id": "lap", "name": "lap", "platform": "Linux", "lastSeen": seen_ago(3) },
            { "id": "new", "name": "new", "platform": "Linux", "lastSeen": null }
        ]),
    )
    .await;

    let devices = console.devices().read_all().await.unwrap();

    let status: Vec<Option<Liveness>> = devices.iter().map(|d| d.status).collect();
    assert_eq!(
        status,
        [
            Some(Liveness::Native),
            Some(Liveness::Offline),
            Some(Liveness::Online),
            None
        ]
    );
    assert_eq!(console.devices().feedback(), None);

    let native = console
        .devices()
        .subscribe()
        .filtered(|d| d.status == Some(Liveness::Native));
    assert_eq!(native.len(), 1);
    assert_eq!(native[0].id, "phone");
}

#[tokio::test]
async fn test_create_caches_echo_exactly_once() {
    let (server, _store, console) = setup().await;
    mount_devices(&server, json!([{ "id": "d1", "name": "laptop" }])).await;
    Mock::given(method("POST"))
        .and(path(api("/device")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "d1", "name": "laptop-2" })),
        )
        .mount(&server)
        .await;

    let devices = console.devices();
    devices.read_all().await.unwrap();
    let created = devices.create(&device("", "laptop-2")).await.unwrap();

    assert_eq!(created.name, "laptop-2");
    assert_eq!(devices.len(), 1);
    assert_eq!(devices.get("d1").unwrap().name, "laptop-2");
    assert_eq!(
        devices.feedback(),
        Some(Feedback::Notice("Device created".into()))
    );
}

#[tokio::test]
async fn test_update_replaces_in_place() {
    let (server, _store, console) = setup().await;
    mount_devices(
        &server,
        json!([
            { "id": "d1", "name": "a" },
            { "id": "d2", "name": "b" },
            { "id": "d3", "name": "c" }
        ]),
    )
    .await;
    Mock::given(method("PATCH"))
        .and(path(api("/device/d2")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "d2", "name": "B" })))
        .mount(&server)
        .await;

    let devices = console.devices();
    devices.read_all().await.unwrap();
    devices.update(&device("d2", "B")).await.unwrap();

    let snap = devices.snapshot();
    assert_eq!(ids(&snap), ["d1", "d2", "d3"]);
    assert_eq!(snap[1].name, "B");
    assert_eq!(
        devices.feedback(),
        Some(Feedback::Notice("Device updated".into()))
    );
}

#[tokio::test]
async fn test_update_of_uncached_id_reports_not_found() {
    let (server, _store, console) = setup().await;
    mount_devices(&server, json!([{ "id": "d1", "name": "a" }])).await;
    Mock::given(method("PATCH"))
        .and(path(api("/device/d9")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "d9", "name": "z" })))
        .mount(&server)
        .await;

    let devices = console.devices();
    devices.read_all().await.unwrap();
    let err = devices.update(&device("d9", "z")).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(ids(&devices.snapshot()), ["d1"]);
    assert_eq!(
        devices.last_error().as_deref(),
        Some("update device failed, d9 not in list")
    );
}

#[tokio::test]
async fn test_delete_removes_one_entry() {
    let (server, _store, console) = setup().await;
    mount_devices(
        &server,
        json!([{ "id": "d1", "name": "a" }, { "id": "d2", "name": "b" }]),
    )
    .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let devices = console.devices();
    devices.read_all().await.unwrap();
    devices.delete(&device("d1", "a")).await.unwrap();
    assert_eq!(ids(&devices.snapshot()), ["d2"]);

    let err = devices.delete(&device("d1", "a")).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(ids(&devices.snapshot()), ["d2"]);
    assert_eq!(
        devices.last_error().as_deref(),
        Some("delete device failed, d1 not in list")
    );
}

#[tokio::test]
async fn test_server_error_lands_in_feedback() {
    let (server, _store, console) = setup().await;
    mount_devices(&server, json!([{ "id": "d1", "name": "a" }])).await;
    Mock::given(method("POST"))
        .and(path(api("/device")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "name taken" })))
        .mount(&server)
        .await;

    let devices = console.devices();
    devices.read_all().await.unwrap();
    let err = devices.create(&device("", "a")).await.unwrap_err();

    assert!(matches!(err, CoreError::Api { status: Some(400), .. }));
    assert_eq!(devices.last_error().as_deref(), Some("name taken"));
    assert_eq!(devices.len(), 1);
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let (server, store, console) = setup().await;
    Mock::given(method("GET"))
        .and(path(api("/device")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "d1", "name": "a" },
            { "id": "d2", "name": "b" }
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("/device")))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "db down" })))
        .mount(&server)
        .await;

    let devices = console.devices();
    devices.read_all().await.unwrap();

    let err = devices.read_all().await.unwrap_err();
    assert!(matches!(err, CoreError::Api { status: Some(500), .. }));
    assert_eq!(ids(&devices.snapshot()), ["d1", "d2"]);
    assert_eq!(devices.last_error().as_deref(), Some("db down"));

    // Nothing listens on port 1, so the request never reaches a server.
    store.save(CredentialSlot::Server, "http://127.0.0.1:1");
    assert!(devices.read_all().await.is_err());
    assert_eq!(ids(&devices.snapshot()), ["d1", "d2"]);
    assert!(devices.last_error().is_some());
}

#[tokio::test]
async fn test_qrcode_fetch_replaces_cached_artifact() {
    let (server, _store, console) = setup().await;
    Mock::given(method("GET"))
        .and(path(api("/device/d1/config")))
        .and(query_param("qrcode", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"old".to_vec()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("/device/d1/config")))
        .and(query_param("qrcode", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
        .mount(&server)
        .await;

    let devices = console.devices();
    assert_eq!(
        devices.qrcode_base64_or_placeholder("d1"),
        PLACEHOLDER_PNG_BASE64
    );

    let d1 = device("d1", "a");
    devices.read_qrcode(&d1).await.unwrap();
    devices.read_qrcode(&d1).await.unwrap();

    assert_eq!(devices.qrcode("d1").unwrap().as_ref(), b"new");
    assert_eq!(devices.qrcode_base64_or_placeholder("d1"), "bmV3");
    assert_eq!(devices.config("d1"), None);
}

#[tokio::test]
async fn test_read_configs_covers_every_cached_device() {
    let (server, _store, console) = setup().await;
    mount_devices(
        &server,
        json!([{ "id": "d1", "name": "a" }, { "id": "d2", "name": "b" }]),
    )
    .await;
    Mock::given(method("GET"))
        .and(query_param("qrcode", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"[Interface]".to_vec()))
        .expect(2)
        .mount(&server)
        .await;

    let devices = console.devices();
    devices.read_all().await.unwrap();
    devices.read_configs().await.unwrap();

    assert_eq!(devices.config("d2").unwrap().as_ref(), b"[Interface]");
}

// ── VPNs and networks ───────────────────────────────────────────────

#[tokio::test]
async fn test_vpn_read_all_classifies_liveness() {
    let (server, _store, console) = setup().await;
    Mock::given(method("GET"))
        .and(path(api("/vpn")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "v1", "name": "stale", "lastSeen": seen_ago(45) },
            { "id": "v2", "name": "fresh", "lastSeen": seen_ago(2) },
            { "id": "v3", "name": "never" }
        ])))
        .mount(&server)
        .await;

    let vpns = console.vpns().read_all().await.unwrap();

    let status: Vec<Option<Liveness>> = vpns.iter().map(|v| v.status).collect();
    assert_eq!(
        status,
        [Some(Liveness::Offline), Some(Liveness::Online), None]
    );
    assert_eq!(console.vpns().feedback(), None);
}

#[tokio::test]
async fn test_vpn_email_and_network_notices() {
    let (server, _store, console) = setup().await;
    Mock::given(method("GET"))
        .and(path(api("/vpn/v1/email")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api("/net")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "n1", "netName": "lan" })),
        )
        .mount(&server)
        .await;

    let vpn = nettica_core::Vpn {
        id: "v1".into(),
        ..Default::default()
    };
    console.vpns().email(&vpn).await.unwrap();

    let net = Net {
        id: String::new(),
        net_name: "lan".into(),
        ..Net::default()
    };
    console.nets().create(&net).await.unwrap();
    assert_eq!(
        console.nets().feedback(),
        Some(Feedback::Notice("Network lan created".into()))
    );
}

#[tokio::test]
async fn test_wild_nets_use_wild_server_and_token() {
    let (primary, store, console) = setup().await;
    let wild = MockServer::start().await;
    store.save(CredentialSlot::WildToken, "wild-token");

    Mock::given(method("GET"))
        .and(path(api("/net")))
        .and(header("authorization", "Bearer wild-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": "n1", "netName": "shared" }])),
        )
        .expect(1)
        .mount(&wild)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&primary)
        .await;

    let wild_nets = console.wild_nets();
    assert_eq!(wild_nets.server(), None);
    wild_nets.set_server(&wild.uri());
    assert_eq!(wild_nets.server(), Some(wild.uri()));

    let nets = wild_nets.read_all().await.unwrap();
    assert_eq!(nets[0].net_name, "shared");
    assert!(console.nets().is_empty());

    wild_nets.set_server_error(Some("unreachable".into()));
    assert_eq!(wild_nets.server_error().as_deref(), Some("unreachable"));
}

// ── Accounts ────────────────────────────────────────────────────────

fn account(id: &str, parent: &str, email: &str) -> Account {
    Account {
        id: id.into(),
        parent: parent.into(),
        email: email.into(),
        ..Account::default()
    }
}

#[tokio::test]
async fn test_members_and_limits_are_keyed_by_account() {
    let (server, _store, console) = setup().await;
    Mock::given(method("GET"))
        .and(path(api("/accounts/a1/users")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "m1", "parent": "a1", "email": "bob@example.com" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("/accounts/a1/limits")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "l1", "accountid": "a1", "devices": 2, "maxdevices": 5
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("/accounts/a2/limits")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "no limits" })))
        .mount(&server)
        .await;

    let accounts = console.accounts();
    accounts.read_members("a1").await.unwrap();
    accounts.read_members("a1").await.unwrap();
    assert_eq!(accounts.subscribe_members().current().len(), 1);
    assert_eq!(accounts.members("a1").unwrap()[0].email, "bob@example.com");

    accounts.read_limits("a1").await.unwrap();
    accounts.read_limits("a1").await.unwrap();
    assert_eq!(accounts.limits("a1").unwrap().max_devices, 5);
    assert_eq!(accounts.subscribe_limits().current().len(), 1);

    assert!(accounts.read_limits("a2").await.is_err());
    assert_eq!(accounts.last_error(), None);
}

#[tokio::test]
async fn test_account_update_reconciles_every_list() {
    let (server, _store, console) = setup().await;
    Mock::given(method("GET"))
        .and(path(api("/accounts/a1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "a1", "parent": "a1", "email": "root@example.com" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("/accounts/a1/users")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "m1", "parent": "a1", "email": "bob@example.com", "role": "User" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(api("/accounts/m1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "m1", "parent": "a1", "email": "bob@example.com", "role": "Admin"
        })))
        .mount(&server)
        .await;

    let accounts = console.accounts();
    accounts.read_all("a1").await.unwrap();
    accounts.read_members("a1").await.unwrap();
    accounts.read_users("a1").await.unwrap();

    let mut bob = account("m1", "a1", "bob@example.com");
    bob.role = "Admin".into();
    accounts.update(&bob).await.unwrap();

    assert_eq!(accounts.members("a1").unwrap()[0].role, "Admin");
    assert_eq!(accounts.users()[0].role, "Admin");
    assert_eq!(accounts.accounts().len(), 1);
    assert_eq!(
        accounts.feedback(),
        Some(Feedback::Notice("bob@example.com updated".into()))
    );
}

#[tokio::test]
async fn test_update_of_created_member_replaces_it() {
    let (server, _store, console) = setup().await;
    Mock::given(method("POST"))
        .and(path(api("/accounts/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "m2", "parent": "a1", "email": "carol@example.com", "role": "User"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(api("/accounts/m2")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "m2", "parent": "a1", "email": "carol@example.com", "role": "Admin"
        })))
        .mount(&server)
        .await;

    let accounts = console.accounts();
    let created = accounts
        .create(&account("", "a1", "carol@example.com"))
        .await
        .unwrap();
    assert_eq!(accounts.accounts()[0].role, "User");

    let mut carol = Account::clone(&created);
    carol.role = "Admin".into();
    accounts.update(&carol).await.unwrap();

    assert_eq!(accounts.accounts().len(), 1);
    assert_eq!(accounts.accounts()[0].role, "Admin");
    assert_eq!(accounts.last_error(), None);
    assert_eq!(
        accounts.feedback(),
        Some(Feedback::Notice("carol@example.com updated".into()))
    );
}

#[tokio::test]
async fn test_update_limit_after_read_limits() {
    let (server, _store, console) = setup().await;
    Mock::given(method("GET"))
        .and(path(api("/accounts/a1/limits")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "l1", "accountid": "a1", "devices": 2, "maxdevices": 5
        })))
        .mount(&server)
        .await;

    let accounts = console.accounts();
    let mut limits = accounts.read_limits("a1").await.unwrap();
    limits.max_devices = 10;
    accounts.update_limit(limits).unwrap();

    assert_eq!(accounts.limits("a1").unwrap().max_devices, 10);
    assert_eq!(accounts.subscribe_limits().current().len(), 1);

    let unread = Limits {
        account_id: "a9".into(),
        ..Limits::default()
    };
    assert!(accounts.update_limit(unread).unwrap_err().is_not_found());
    assert_eq!(
        accounts.last_error().as_deref(),
        Some("update limit failed, a9 not in list")
    );
}

#[tokio::test]
async fn test_local_reconcile_operations() {
    let (server, _store, console) = setup().await;
    Mock::given(method("GET"))
        .and(path(api("/accounts/a1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "a1", "parent": "a1", "email": "root@example.com" }
        ])))
        .mount(&server)
        .await;

    let accounts = console.accounts();
    accounts.read_all("a1").await.unwrap();

    // Non-root accounts are skipped without touching the tree.
    accounts
        .update_account(account("m1", "a1", "bob@example.com"))
        .unwrap();
    assert_eq!(accounts.accounts().len(), 1);

    let mut root = account("a1", "a1", "root@example.com");
    root.name = "Root".into();
    accounts.update_account(root).unwrap();
    assert_eq!(accounts.accounts()[0].name, "Root");

    let err = accounts
        .update_user(account("u9", "a1", "x@example.com"))
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(accounts.update_member(&account("m9", "a1", "x")).is_err());
    assert!(accounts.delete_member("m9").is_err());
    assert!(accounts.delete_user("u9").is_err());
    assert_eq!(
        accounts.last_error().as_deref(),
        Some("delete user failed, u9 not in list")
    );

    accounts.delete_account("a1").unwrap();
    assert!(accounts.accounts().is_empty());
}

#[tokio::test]
async fn test_account_create_and_invite() {
    let (server, _store, console) = setup().await;
    Mock::given(method("POST"))
        .and(path(api("/accounts/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "m2", "parent": "a1", "email": "carol@example.com", "status": "Pending"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("/accounts/m2/invite")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let accounts = console.accounts();
    let created = accounts
        .create(&account("", "a1", "carol@example.com"))
        .await
        .unwrap();
    assert_eq!(accounts.account().unwrap().id, "m2");
    assert_eq!(
        accounts.feedback(),
        Some(Feedback::Notice("Account for carol@example.com created".into()))
    );

    accounts.email(&created).await.unwrap();
    assert_eq!(
        accounts.feedback(),
        Some(Feedback::Notice("Email to carol@example.com sent".into()))
    );
}

// ── Join ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_activate_remembers_account() {
    let (server, _store, console) = setup().await;
    Mock::given(method("POST"))
        .and(path(api("/accounts/m2/activate")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "m2", "parent": "a1", "email": "carol@example.com", "status": "Active"
        })))
        .mount(&server)
        .await;

    let account = console.join().activate("m2").await.unwrap();
    assert_eq!(account.status, "Active");
    assert_eq!(console.join().account().unwrap().id, "m2");
}
