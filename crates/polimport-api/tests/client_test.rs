//! Tests for the management API client — session handling, command calls,
//! pagination and failure-body parsing.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use polimport_api::{ApiError, MgmtClient};

async fn logged_in_client(server: &MockServer) -> MgmtClient {
    Mock::given(method("POST"))
        .and(path("/web_api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sid": "sid-abc" })))
        .mount(server)
        .await;

    let mut client = MgmtClient::with_http_client(&server.uri(), reqwest::Client::new());
    client.login("admin", "secret", None).await.unwrap();
    client
}

#[tokio::test]
async fn login_stores_session_and_replays_it() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/web_api/show-hosts"))
        .and(header("X-chkp-sid", "sid-abc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "objects": [], "total": 0 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    client.call("show-hosts", &json!({})).await.unwrap();
}

#[tokio::test]
async fn login_without_sid_is_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/web_api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "OK" })))
        .mount(&server)
        .await;

    let mut client = MgmtClient::with_http_client(&server.uri(), reqwest::Client::new());
    let err = client.login("admin", "secret", None).await.unwrap_err();
    assert!(matches!(err, ApiError::AuthFailed(_)));
}

#[tokio::test]
async fn failed_call_parses_structured_failure_body() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/web_api/add-host"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "err_validation_failed",
            "message": "Validation failed with 1 error",
            "errors": [
                { "message": "More than one object named 'Srv1' exists." }
            ],
            "warnings": []
        })))
        .mount(&server)
        .await;

    let err = client
        .call("add-host", &json!({ "name": "Srv1", "ip-address": "10.1.1.5" }))
        .await
        .unwrap_err();

    let failure = err.as_failure().expect("structured failure");
    assert_eq!(failure.code.as_deref(), Some("err_validation_failed"));
    assert_eq!(
        failure.errors[0].message,
        "More than one object named 'Srv1' exists."
    );
}

#[tokio::test]
async fn failed_call_with_unparseable_body_keeps_raw_text() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/web_api/publish"))
        .respond_with(ResponseTemplate::new(500).set_body_string("gateway exploded"))
        .mount(&server)
        .await;

    let err = client.publish().await.unwrap_err();
    let failure = err.as_failure().expect("structured failure");
    assert_eq!(failure.message, "gateway exploded");
}

#[tokio::test]
async fn show_all_follows_offset_pagination() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/web_api/show-address-ranges"))
        .and(body_partial_json(json!({ "offset": 0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": (0..500)
                .map(|i| json!({ "name": format!("r{i}"), "uid": format!("u{i}") }))
                .collect::<Vec<_>>(),
            "total": 501
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/web_api/show-address-ranges"))
        .and(body_partial_json(json!({ "offset": 500 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [{ "name": "r500", "uid": "u500" }],
            "total": 501
        })))
        .mount(&server)
        .await;

    let objects = client.show_all("show-address-ranges").await.unwrap();
    assert_eq!(objects.len(), 501);
    assert_eq!(objects[500].name, "r500");
}

#[tokio::test]
async fn query_objects_sends_ip_only_filter() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/web_api/show-objects"))
        .and(body_partial_json(json!({
            "filter": "10.1.1.5",
            "ip-only": true,
            "type": "host"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [{
                "name": "ExistingSrv",
                "uid": "uid-1",
                "ipv4-address": "10.1.1.5",
                "domain": { "domain-type": "domain" }
            }],
            "total": 1
        })))
        .mount(&server)
        .await;

    let objects = client.query_objects("10.1.1.5", "host").await.unwrap();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].name, "ExistingSrv");
    assert!(objects[0].is_local());
}
