//! Mock management server using wiremock for integration testing.
//!
//! Wraps a `MockServer` with the command-path conventions of the web API
//! and canned failure bodies for the collision scenarios.

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use polimport_api::MgmtClient;

/// The listing commands every pipeline run issues while building indexes.
const LISTING_COMMANDS: [&str; 6] = [
    "show-address-ranges",
    "show-services-tcp",
    "show-services-udp",
    "show-services-sctp",
    "show-services-icmp",
    "show-services-other",
];

pub struct MockMgmtServer {
    server: MockServer,
}

impl MockMgmtServer {
    /// Start a mock server with login already mocked.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/web_api/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sid": "test-sid" })))
            .mount(&server)
            .await;
        Self { server }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// A logged-in client pointed at this server.
    pub async fn client(&self) -> MgmtClient {
        let mut client = MgmtClient::with_http_client(&self.uri(), reqwest::Client::new());
        client
            .login("admin", "secret", None)
            .await
            .expect("mock login");
        client
    }

    /// Mount empty listings for every index-building command a pipeline
    /// run issues. Mount kind-specific listings before calling this; the
    /// earlier mock wins.
    pub async fn mock_empty_listings(&self) {
        for command in LISTING_COMMANDS {
            self.mock_success(command, Self::listing(&[])).await;
        }
    }

    /// Mount a publish mock asserting the exact number of publishes.
    pub async fn mock_publish_expect(&self, times: u64) {
        Mock::given(method("POST"))
            .and(path("/web_api/publish"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// 200 response for a command.
    pub async fn mock_success(&self, command: &str, body: Value) {
        Mock::given(method("POST"))
            .and(path(format!("/web_api/{command}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// 200 response for a command whose request body contains `needle`.
    pub async fn mock_success_when(&self, command: &str, needle: &str, body: Value) {
        Mock::given(method("POST"))
            .and(path(format!("/web_api/{command}")))
            .and(body_string_contains(needle))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Failure response for a command whose request body contains `needle`.
    pub async fn mock_failure_when(&self, command: &str, needle: &str, failure: Value) {
        Mock::given(method("POST"))
            .and(path(format!("/web_api/{command}")))
            .and(body_string_contains(needle))
            .respond_with(ResponseTemplate::new(500).set_body_json(failure))
            .mount(&self.server)
            .await;
    }

    /// Failure response that expires after one match; mount before a
    /// broader mock to script a retry sequence.
    pub async fn mock_failure_once(&self, command: &str, failure: Value) {
        Mock::given(method("POST"))
            .and(path(format!("/web_api/{command}")))
            .respond_with(ResponseTemplate::new(500).set_body_json(failure))
            .up_to_n_times(1)
            .mount(&self.server)
            .await;
    }

    /// Failure response for every call to a command, asserting call count.
    pub async fn mock_failure_expect(&self, command: &str, failure: Value, times: u64) {
        Mock::given(method("POST"))
            .and(path(format!("/web_api/{command}")))
            .respond_with(ResponseTemplate::new(500).set_body_json(failure))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Assert a command is never called.
    pub async fn mock_never(&self, command: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/web_api/{command}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&self.server)
            .await;
    }

    /// The failure body the server produces for a taken object name.
    pub fn name_collision(name: &str) -> Value {
        json!({
            "code": "err_validation_failed",
            "message": "Validation failed with 1 error",
            "errors": [
                { "message": format!("More than one object named '{name}' exists.") }
            ]
        })
    }

    /// The failure body the server produces for a duplicate IP identity.
    pub fn identity_warning(ip: &str) -> Value {
        json!({
            "code": "err_validation_failed",
            "message": "Validation failed with 1 warning",
            "warnings": [
                { "message": format!("Multiple objects have the same IP address {ip}") }
            ]
        })
    }

    /// A generic, non-retryable rejection.
    pub fn generic_rejection(detail: &str) -> Value {
        json!({
            "code": "generic_error",
            "message": detail,
        })
    }

    /// A `show-*` listing body.
    pub fn listing(objects: &[Value]) -> Value {
        json!({
            "objects": objects,
            "total": objects.len(),
            "from": 0,
            "to": objects.len(),
        })
    }
}
