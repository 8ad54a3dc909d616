// Session and dispatcher tests against a wiremock device.
#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex, mpsc};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{basic_auth, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use f5os_api::teem::{BoxError, UsageEvent, UsageReporter};
use f5os_api::{ApiRoot, ClientConfig, Error, F5osClient, PlatformKind, RetryPolicy, SecretString};

const LOGIN: &str = "/restconf/data/openconfig-system:system/aaa";
const VLANS: &str = "/restconf/data/openconfig-vlan:vlans";

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer) -> ClientConfig {
    let mut config = ClientConfig::new(server.uri(), "admin", SecretString::from("secret"));
    config.retry = RetryPolicy {
        max_attempts: 3,
        delay: Duration::from_millis(10),
    };
    config
}

fn login_ok(token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("X-Auth-Token", token)
        .set_body_json(json!({ "openconfig-system:aaa": {} }))
}

async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path(LOGIN))
        .and(basic_auth("admin", "secret"))
        .respond_with(login_ok(token))
        .mount(server)
        .await;
}

async fn logged_in(server: &MockServer) -> F5osClient {
    mount_login(server, "tok-1").await;
    let client = F5osClient::new(config(server)).unwrap();
    client.login().await.unwrap();
    client
}

fn device_error(message: &str) -> serde_json::Value {
    json!({
        "ietf-restconf:errors": {
            "error": [{
                "error-type": "application",
                "error-tag": "invalid-value",
                "error-path": "/openconfig-vlan:vlans",
                "error-message": message
            }]
        }
    })
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_stores_token_and_sends_it() {
    let server = MockServer::start().await;
    let client = logged_in(&server).await;
    assert!(client.has_token());

    Mock::given(method("GET"))
        .and(path(format!("{VLANS}/vlan=444")))
        .and(header("X-Auth-Token", "tok-1"))
        .and(header("Content-Type", "application/yang-data+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "openconfig-vlan:vlan": [{ "vlan-id": 444, "config": { "vlan-id": 444, "name": "ext" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let vlan = client.get_vlan(444).await.unwrap().unwrap();
    assert_eq!(vlan.vlan_id, 444);
    assert_eq!(vlan.name.as_deref(), Some("ext"));
}

#[tokio::test]
async fn test_login_401_decodes_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "ietf-restconf:errors": { "error": [{
                "error-type": "protocol",
                "error-tag": "access-denied",
                "error-message": "Authentication failed"
            }]}
        })))
        .mount(&server)
        .await;

    let err = F5osClient::connect(config(&server)).await.unwrap_err();
    match err {
        Error::Authentication {
            ref message,
            ref error_tag,
            ref body,
        } => {
            assert_eq!(message, "Authentication failed");
            assert_eq!(error_tag.as_deref(), Some("access-denied"));
            assert!(body.contains("access-denied"));
        }
        other => panic!("expected Authentication, got {other:?}"),
    }
    assert!(err.is_auth_failure());
}

#[tokio::test]
async fn test_login_challenge_page_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LOGIN))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Auth-Token", "bogus")
                .set_body_string("<html><script>window.location='/login'</script></html>"),
        )
        .mount(&server)
        .await;

    let client = F5osClient::new(config(&server)).unwrap();
    let err = client.login().await.unwrap_err();
    assert!(matches!(err, Error::ChallengePage { status: 200, .. }), "{err:?}");
    assert!(!client.has_token());
}

#[tokio::test]
async fn test_login_without_token_header_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = F5osClient::new(config(&server)).unwrap();
    let err = client.login().await.unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }), "{err:?}");
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let mut config = ClientConfig::new("http://127.0.0.1:1", "admin", SecretString::from("x"));
    config.retry = RetryPolicy::none();
    let err = F5osClient::connect(config).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "{err:?}");
    assert!(!err.is_transient());
}

// ── Re-authentication ───────────────────────────────────────────────

#[tokio::test]
async fn test_401_triggers_single_relogin_and_new_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LOGIN))
        .respond_with(login_ok("tok-1"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LOGIN))
        .respond_with(login_ok("tok-2"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("{VLANS}/vlan=10")))
        .and(header("X-Auth-Token", "tok-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{VLANS}/vlan=10")))
        .and(header("X-Auth-Token", "tok-2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = F5osClient::new(config(&server)).unwrap();
    client.login().await.unwrap();
    client.delete_vlan(10).await.unwrap();
}

#[tokio::test]
async fn test_concurrent_401s_share_one_relogin() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LOGIN))
        .respond_with(login_ok("tok-1"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(LOGIN))
        .respond_with(login_ok("tok-2").set_delay(Duration::from_millis(50)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(VLANS))
        .and(header("X-Auth-Token", "tok-1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(VLANS))
        .and(header("X-Auth-Token", "tok-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "openconfig-vlan:vlans": { "vlan": [{ "vlan-id": 1 }] }
        })))
        .mount(&server)
        .await;

    let client = F5osClient::new(config(&server)).unwrap();
    client.login().await.unwrap();

    let (a, b) = tokio::join!(client.list_vlans(), client.list_vlans());
    assert_eq!(a.unwrap().len(), 1);
    assert_eq!(b.unwrap().len(), 1);
}

// ── Dispatcher status handling ──────────────────────────────────────

#[tokio::test]
async fn test_404_is_success_and_reads_as_none() {
    let server = MockServer::start().await;
    let client = logged_in(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("{VLANS}/vlan=999")))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.get_vlan(999).await.unwrap().is_none());
}

#[tokio::test]
async fn test_persistent_error_surfaces_device_message() {
    let server = MockServer::start().await;
    let client = logged_in(&server).await;

    Mock::given(method("PATCH"))
        .and(path(VLANS))
        .respond_with(ResponseTemplate::new(400).set_body_json(device_error("vlan-id out of range")))
        .expect(3)
        .mount(&server)
        .await;

    let err = client.upsert_vlan(5000, None).await.unwrap_err();
    match err {
        Error::Device {
            status,
            ref message,
            ref error_tag,
            ..
        } => {
            assert_eq!(status, 400);
            assert_eq!(message, "vlan-id out of range");
            assert_eq!(error_tag.as_deref(), Some("invalid-value"));
        }
        other => panic!("expected Device, got {other:?}"),
    }
    assert_eq!(err.device_message(), Some("vlan-id out of range"));
}

#[tokio::test]
async fn test_undecodable_error_falls_back_to_status() {
    let server = MockServer::start().await;
    let client = logged_in(&server).await;

    Mock::given(method("PATCH"))
        .and(path(VLANS))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = client.upsert_vlan(10, Some("v10")).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert!(err.to_string().contains("503"), "{err}");
}

#[tokio::test]
async fn test_transient_error_recovers_on_retry() {
    let server = MockServer::start().await;
    let client = logged_in(&server).await;

    Mock::given(method("PATCH"))
        .and(path(VLANS))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(VLANS))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.upsert_vlan(10, Some("v10")).await.unwrap();
}

#[tokio::test]
async fn test_timeouts_are_retried_until_attempts_run_out() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1").await;
    let mut cfg = config(&server);
    cfg.transport.timeout = Duration::from_millis(200);
    let client = F5osClient::new(cfg).unwrap();
    client.login().await.unwrap();

    Mock::given(method("GET"))
        .and(path(VLANS))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(600)))
        .expect(3)
        .mount(&server)
        .await;

    let err = client.list_vlans().await.unwrap_err();
    assert!(matches!(err, Error::Timeout { attempts: 3, .. }), "{err:?}");
}

#[tokio::test]
async fn test_timeout_recovers_on_retry() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1").await;
    let mut cfg = config(&server);
    cfg.transport.timeout = Duration::from_millis(200);
    let client = F5osClient::new(cfg).unwrap();
    client.login().await.unwrap();

    Mock::given(method("GET"))
        .and(path(VLANS))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(600)))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(VLANS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "openconfig-vlan:vlans": { "vlan": [{ "vlan-id": 10, "config": { "vlan-id": 10, "name": "v10" } }] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let vlans = client.list_vlans().await.unwrap();
    assert_eq!(vlans.len(), 1);
}

#[tokio::test]
async fn test_tenant_calls_are_not_retried() {
    let server = MockServer::start().await;
    let client = logged_in(&server).await;

    Mock::given(method("GET"))
        .and(path("/restconf/data/f5-tenants:tenants/tenant=t1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(device_error("tenant service down")))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.get_tenant("t1").await.unwrap_err();
    let text = err.to_string();
    assert!(text.contains("HTTP 500"), "{text}");
    assert!(text.contains("tenant service down"), "{text}");
}

#[tokio::test]
async fn test_shutdown_cancels_retry_delay() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1").await;
    let mut cfg = config(&server);
    cfg.retry.delay = Duration::from_secs(60);
    let client = F5osClient::new(cfg).unwrap();
    client.login().await.unwrap();

    Mock::given(method("PATCH"))
        .and(path(VLANS))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let handle = {
        let client = client.clone();
        tokio::spawn(async move { client.upsert_vlan(1, None).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    client.shutdown();

    let err = handle.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Cancelled { .. }), "{err:?}");
}

// ── Connect ─────────────────────────────────────────────────────────

struct CountingReporter {
    calls: AtomicU32,
    platform: Mutex<Option<String>>,
    fail: bool,
}

impl CountingReporter {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            platform: Mutex::new(None),
            fail,
        })
    }
}

impl UsageReporter for CountingReporter {
    fn report(&self, event: &UsageEvent) -> Result<(), BoxError> {
        *self.platform.lock().unwrap() = Some(event.platform_type.clone());
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err("collector unreachable".into())
        } else {
            Ok(())
        }
    }
}

/// Reports run detached from `connect`; wait for `n` of them to land.
async fn wait_for_reports(reporter: &CountingReporter, n: u32) {
    for _ in 0..200 {
        if reporter.calls.load(Ordering::SeqCst) >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {n} usage report(s), saw {}", reporter.calls.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_failing_usage_report_does_not_fail_connect() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1").await;

    let reporter = CountingReporter::new(true);
    let mut cfg = config(&server);
    cfg.teem = true;

    let client = F5osClient::connect_with_reporter(cfg, reporter.clone())
        .await
        .unwrap();
    assert_eq!(client.platform().kind, PlatformKind::Unknown);

    wait_for_reports(&reporter, 1).await;
    assert_eq!(reporter.calls.load(Ordering::SeqCst), 1);
    assert_eq!(reporter.platform.lock().unwrap().as_deref(), Some("Unknown"));
}

#[tokio::test]
async fn test_reporter_skipped_when_teem_disabled() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1").await;

    let reporter = CountingReporter::new(false);
    F5osClient::connect_with_reporter(config(&server), reporter.clone())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(reporter.calls.load(Ordering::SeqCst), 0);
}

/// Blocks until the test releases it.
struct StalledReporter {
    release: Mutex<mpsc::Receiver<()>>,
    done: AtomicU32,
}

impl UsageReporter for StalledReporter {
    fn report(&self, _event: &UsageEvent) -> Result<(), BoxError> {
        self.release.lock().unwrap().recv()?;
        self.done.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_slow_reporter_does_not_delay_connect() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1").await;

    let (release, rx) = mpsc::channel();
    let reporter = Arc::new(StalledReporter {
        release: Mutex::new(rx),
        done: AtomicU32::new(0),
    });
    let mut cfg = config(&server);
    cfg.teem = true;

    let client = tokio::time::timeout(
        Duration::from_secs(2),
        F5osClient::connect_with_reporter(cfg, reporter.clone()),
    )
    .await
    .expect("connect waited on the usage reporter")
    .unwrap();
    assert!(client.has_token());
    assert_eq!(reporter.done.load(Ordering::SeqCst), 0);

    release.send(()).unwrap();
    for _ in 0..200 {
        if reporter.done.load(Ordering::SeqCst) == 1 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("usage report never completed");
}

#[test]
fn test_api_root_follows_port() {
    let cfg = |host: &str, port: Option<u16>| {
        let mut c = ClientConfig::new(host, "admin", SecretString::from("x"));
        c.port = port;
        F5osClient::new(c).unwrap()
    };

    let client = cfg("10.1.1.5", Some(443));
    assert_eq!(client.api_root(), ApiRoot::Api);
    assert_eq!(
        client.data_url("/openconfig-vlan:vlans").unwrap().as_str(),
        "https://10.1.1.5/api/data/openconfig-vlan:vlans"
    );

    let client = cfg("10.1.1.5", Some(8888));
    assert_eq!(client.api_root(), ApiRoot::Restconf);
    assert_eq!(
        client.data_url("/openconfig-vlan:vlans").unwrap().as_str(),
        "https://10.1.1.5:8888/restconf/data/openconfig-vlan:vlans"
    );

    let client = cfg("https://10.1.1.5:443", None);
    assert_eq!(client.api_root(), ApiRoot::Api);

    let client = cfg("10.1.1.5", None);
    assert_eq!(client.api_root(), ApiRoot::Restconf);
}
