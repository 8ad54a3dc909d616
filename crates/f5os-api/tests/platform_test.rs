// Platform detection run end-to-end through `connect`.
#![allow(clippy::unwrap_used)]

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use f5os_api::{ClientConfig, F5osClient, PlatformKind, SecretString};

const ROOT: &str = "/restconf/data";

async fn device(components: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{ROOT}/openconfig-system:system/aaa")))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Auth-Token", "tok"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{ROOT}/openconfig-platform:components")))
        .respond_with(ResponseTemplate::new(200).set_body_json(components))
        .mount(&server)
        .await;
    server
}

async fn connect(server: &MockServer) -> F5osClient {
    let config = ClientConfig::new(server.uri(), "admin", SecretString::from("secret"));
    F5osClient::connect(config).await.unwrap()
}

#[tokio::test]
async fn test_rseries_platform_with_image_version() {
    let server = device(json!({
        "openconfig-platform:components": { "component": [
            { "name": "platform", "state": { "description": "R10900" } },
            { "name": "psu-1", "state": { "description": "PSU" } }
        ]}
    }))
    .await;
    Mock::given(method("GET"))
        .and(path(format!(
            "{ROOT}/openconfig-system:system/f5-system-image:image/state/install"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "f5-system-image:install": { "install-os-version": "1.7.0-1234" }
        })))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let platform = client.platform();
    assert_eq!(platform.kind, PlatformKind::RseriesPlatform);
    assert_eq!(platform.platform_type(), "R10900");
    assert_eq!(platform.version.as_deref(), Some("1.7.0-1234"));
}

#[tokio::test]
async fn test_velos_controller_keeps_last_successful_controller() {
    let server = device(json!({
        "openconfig-platform:components": { "component": [
            { "name": "chassis", "state": { "description": "CX410" } },
            { "name": "controller-1" }
        ]}
    }))
    .await;
    Mock::given(method("GET"))
        .and(path(format!(
            "{ROOT}/openconfig-system:system/f5-system-controller-image:image/state/controllers"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "f5-system-controller-image:controllers": { "controller": [
                { "number": 1, "os-version": "1.6.0", "install-status": "success" },
                { "number": 2, "os-version": "1.6.1", "install-status": "success" },
                { "number": 3, "os-version": "1.7.0", "install-status": "in-progress" }
            ]}
        })))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    assert!(client.platform().is_velos_controller());
    assert_eq!(client.platform().version.as_deref(), Some("1.6.1"));
}

#[tokio::test]
async fn test_velos_partition_adopts_blade_os_version() {
    let server = device(json!({
        "openconfig-platform:components": { "component": [{
            "name": "blade-1",
            "f5-platform:software": { "state": { "software-components": {
                "software-component": [
                    { "software-index": "blade-os", "state": { "version": "1.5.1-5621" } }
                ]
            }}}
        }]}
    }))
    .await;

    let client = connect(&server).await;
    assert!(client.platform().is_velos_partition());
    assert_eq!(client.platform().version.as_deref(), Some("1.5.1-5621"));
}

#[tokio::test]
async fn test_unexpected_shape_is_unknown_not_fatal() {
    let server = device(json!({ "openconfig-platform:components": "not-a-list" })).await;
    let client = connect(&server).await;
    assert_eq!(client.platform().kind, PlatformKind::Unknown);
    assert!(client.platform().version.is_none());
}
