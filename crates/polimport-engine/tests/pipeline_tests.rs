//! End-to-end pipeline tests against a mock management server.
//!
//! Each test parses a small interchange bundle, runs the full pipeline,
//! and asserts on the decision report plus the exact calls the server saw.

use serde_json::json;

use polimport_engine::{Migration, MigrationOptions};
use polimport_model::PolicyBundle;

mod helpers;
use helpers::mock_mgmt_server::MockMgmtServer;

fn bundle(content: &str) -> PolicyBundle {
    PolicyBundle::from_json_str(content).expect("valid bundle")
}

#[tokio::test]
async fn host_identity_merge_reuses_server_object() {
    let server = MockMgmtServer::start().await;
    server.mock_empty_listings().await;
    server.mock_success("publish", json!({})).await;

    // The only add-host attempt trips the identity warning; the lookup
    // resolves to the pre-existing server object.
    server
        .mock_failure_expect(
            "add-host",
            MockMgmtServer::identity_warning("10.1.1.5"),
            1,
        )
        .await;
    server
        .mock_success(
            "show-objects",
            MockMgmtServer::listing(&[json!({
                "name": "ExistingSrv",
                "uid": "u-1",
                "domain": { "domain-type": "domain" },
                "ipv4-address": "10.1.1.5"
            })]),
        )
        .await;
    // The group referencing the host by its source name must arrive with
    // the server object's name instead.
    server
        .mock_success_when(
            "add-group",
            "ExistingSrv",
            json!({ "name": "SrvGroup", "uid": "g-1" }),
        )
        .await;

    let bundle = bundle(
        r#"[
            {"TypeName": "CheckPoint_Host", "Name": "Srv1", "IpAddress": "10.1.1.5"},
            {"TypeName": "CheckPoint_NetworkGroup", "Name": "SrvGroup", "Members": ["Srv1"]}
        ]"#,
    );
    let client = server.client().await;
    let report = Migration::new(MigrationOptions::default())
        .run(&client, &bundle)
        .await
        .expect("run succeeds");

    assert!(report.contains("CP object ExistingSrv is used instead of Srv1"));
    assert!(report.contains("SrvGroup is added as SrvGroup"));
}

#[tokio::test]
async fn name_collisions_rename_in_sequence() {
    let server = MockMgmtServer::start().await;
    server.mock_empty_listings().await;
    server.mock_success("publish", json!({})).await;

    for taken in ["A", "A_1", "A_2"] {
        server
            .mock_failure_when(
                "add-dns-domain",
                &format!("\"name\":\"{taken}\""),
                MockMgmtServer::name_collision(taken),
            )
            .await;
    }
    server
        .mock_success_when(
            "add-dns-domain",
            "\"name\":\"A_3\"",
            json!({ "name": "A_3", "uid": "d-1" }),
        )
        .await;

    let bundle = bundle(r#"[{"TypeName": "CheckPoint_Domain", "Name": "A"}]"#);
    let client = server.client().await;
    let report = Migration::new(MigrationOptions::default())
        .run(&client, &bundle)
        .await
        .expect("run succeeds");

    assert!(report.contains("A is added as A_3"));
}

#[tokio::test]
async fn publishes_at_threshold_and_at_pass_end() {
    let server = MockMgmtServer::start().await;
    server.mock_empty_listings().await;
    server
        .mock_success("add-security-zone", json!({ "name": "z" }))
        .await;
    // Three creations at threshold 2: one threshold publish after the
    // second zone, one forced publish at pass end.
    server.mock_publish_expect(2).await;

    let bundle = bundle(
        r#"[
            {"TypeName": "CheckPoint_Zone", "Name": "inside"},
            {"TypeName": "CheckPoint_Zone", "Name": "outside"},
            {"TypeName": "CheckPoint_Zone", "Name": "dmz"}
        ]"#,
    );
    let client = server.client().await;
    let options = MigrationOptions {
        threshold: 2,
        ..MigrationOptions::default()
    };
    let report = Migration::new(options)
        .run(&client, &bundle)
        .await
        .expect("run succeeds");

    assert_eq!(
        report.lines().iter().filter(|l| l.contains("is added as")).count(),
        3
    );
}

#[tokio::test]
async fn package_failure_short_circuits_layers_and_nat() {
    let server = MockMgmtServer::start().await;
    server.mock_empty_listings().await;
    server.mock_success("publish", json!({})).await;
    server
        .mock_failure_expect(
            "add-package",
            MockMgmtServer::generic_rejection("invalid package"),
            1,
        )
        .await;
    server.mock_never("add-access-layer").await;
    server.mock_never("add-access-rule").await;
    server.mock_never("add-nat-rule").await;

    let bundle = bundle(
        r#"[
            {"TypeName": "CheckPoint_Package", "Name": "Corp",
             "SubPolicies": [{"Name": "Dmz", "Rules": [
                {"Layer": "Dmz", "Action": 0}
             ]}]},
            {"TypeName": "CheckPoint_NAT_Rule", "Package": "Corp", "Method": 1}
        ]"#,
    );
    let client = server.client().await;
    let report = Migration::new(MigrationOptions::default())
        .run(&client, &bundle)
        .await
        .expect("run succeeds");

    assert!(report
        .lines()
        .iter()
        .any(|l| l.ends_with("package is not added")));
    assert!(report.contains("nat rule is not added"));
}

#[tokio::test]
async fn rename_exhaustion_gives_the_object_up() {
    let server = MockMgmtServer::start().await;
    server.mock_empty_listings().await;
    server.mock_success("publish", json!({})).await;
    server
        .mock_failure_expect(
            "add-security-zone",
            MockMgmtServer::name_collision("Edge"),
            3,
        )
        .await;

    let bundle = bundle(r#"[{"TypeName": "CheckPoint_Zone", "Name": "Edge"}]"#);
    let client = server.client().await;
    let options = MigrationOptions {
        max_rename_attempts: 3,
        ..MigrationOptions::default()
    };
    let report = Migration::new(options)
        .run(&client, &bundle)
        .await
        .expect("run succeeds");

    assert!(report.contains("Edge is not added."));
}

#[tokio::test]
async fn existing_service_resolves_references_to_its_uid() {
    let server = MockMgmtServer::start().await;
    // The tcp listing already holds a service on port 443; mounted before
    // the empty listings so it wins.
    server
        .mock_success(
            "show-services-tcp",
            MockMgmtServer::listing(&[json!({
                "name": "https",
                "uid": "uid-443",
                "port": 443,
                "protocol": "HTTP",
                "domain": { "domain-type": "domain" }
            })]),
        )
        .await;
    server.mock_empty_listings().await;
    server.mock_success("publish", json!({})).await;
    server.mock_never("add-service-tcp").await;
    server
        .mock_success_when(
            "add-service-group",
            "uid-443",
            json!({ "name": "SG", "uid": "sg-1" }),
        )
        .await;

    let bundle = bundle(
        r#"[
            {"TypeName": "CheckPoint_TcpService", "Name": "web", "Port": "443"},
            {"TypeName": "CheckPoint_ServiceGroup", "Name": "SG", "Members": ["web"]}
        ]"#,
    );
    let client = server.client().await;
    let report = Migration::new(MigrationOptions::default())
        .run(&client, &bundle)
        .await
        .expect("run succeeds");

    assert!(report.contains("CP object https is used instead of web"));
    assert!(report.contains("SG is added as SG"));
}

#[tokio::test]
async fn rejected_identity_lookup_skips_only_that_object() {
    let server = MockMgmtServer::start().await;
    server.mock_empty_listings().await;
    server.mock_success("publish", json!({})).await;

    // The first host trips the identity warning but the lookup itself is
    // rejected; the pass gives that host up and carries on.
    server
        .mock_failure_when(
            "add-host",
            "\"name\":\"Srv1\"",
            MockMgmtServer::identity_warning("10.1.1.5"),
        )
        .await;
    server
        .mock_failure_expect(
            "show-objects",
            MockMgmtServer::generic_rejection("search is temporarily unavailable"),
            1,
        )
        .await;
    server
        .mock_success_when(
            "add-host",
            "\"name\":\"Srv2\"",
            json!({ "name": "Srv2", "uid": "h-2" }),
        )
        .await;

    let bundle = bundle(
        r#"[
            {"TypeName": "CheckPoint_Host", "Name": "Srv1", "IpAddress": "10.1.1.5"},
            {"TypeName": "CheckPoint_Host", "Name": "Srv2", "IpAddress": "10.2.2.2"}
        ]"#,
    );
    let client = server.client().await;
    let report = Migration::new(MigrationOptions::default())
        .run(&client, &bundle)
        .await
        .expect("run succeeds");

    assert!(report.contains("Srv1 is not added."));
    assert!(report.contains("Srv2 is added as Srv2"));
}

#[tokio::test]
async fn spurious_identity_warning_is_suppressed_on_retry() {
    let server = MockMgmtServer::start().await;
    server.mock_empty_listings().await;
    server.mock_success("publish", json!({})).await;

    // First attempt warns, but the lookup finds nothing; the retry carries
    // ignore-warnings and succeeds.
    server
        .mock_failure_once("add-host", MockMgmtServer::identity_warning("10.9.9.9"))
        .await;
    server
        .mock_success_when(
            "add-host",
            "\"ignore-warnings\":true",
            json!({ "name": "Srv2", "uid": "h-1" }),
        )
        .await;
    server
        .mock_success("show-objects", MockMgmtServer::listing(&[]))
        .await;

    let bundle = bundle(
        r#"[{"TypeName": "CheckPoint_Host", "Name": "Srv2", "IpAddress": "10.9.9.9"}]"#,
    );
    let client = server.client().await;
    let report = Migration::new(MigrationOptions::default())
        .run(&client, &bundle)
        .await
        .expect("run succeeds");

    assert!(report.contains("Srv2 is added as Srv2"));
}

#[tokio::test]
async fn package_layers_and_rules_are_created_under_suffixed_names() {
    let server = MockMgmtServer::start().await;
    server.mock_empty_listings().await;
    server.mock_success("publish", json!({})).await;
    server
        .mock_success("add-package", json!({ "name": "Corp", "uid": "p-1" }))
        .await;
    server
        .mock_success("add-access-layer", json!({ "name": "Dmz", "uid": "l-1" }))
        .await;
    server
        .mock_success("add-access-rule", json!({ "uid": "r-1" }))
        .await;
    // Both sub-layer rules plus the parent rule, with the parent's
    // trailing clean-up rule skipped.
    server
        .mock_success("add-nat-rule", json!({ "uid": "n-1" }))
        .await;

    let bundle = bundle(
        r#"[
            {"TypeName": "CheckPoint_Package", "Name": "Corp",
             "SubPolicies": [{"Name": "Dmz", "Rules": [
                {"Name": "allow web", "Layer": "Dmz", "Action": 0, "Track": 1},
                {"Name": "deny rest", "Layer": "Dmz", "Action": 1}
             ]}],
             "ParentLayer": {"Rules": [
                {"Name": "to dmz", "Layer": "Corp Network", "Action": 3, "SubPolicyName": "Dmz"},
                {"Name": "cleanup", "Layer": "Corp Network", "Action": 1}
             ]}},
            {"TypeName": "CheckPoint_NAT_Rule", "Package": "Corp", "Method": 0}
        ]"#,
    );
    let client = server.client().await;
    let report = Migration::new(MigrationOptions::default())
        .run(&client, &bundle)
        .await
        .expect("run succeeds");

    assert!(report
        .lines()
        .iter()
        .any(|l| l.starts_with("Corp_") && l.ends_with("package is added")));
    assert!(report
        .lines()
        .iter()
        .any(|l| l.starts_with("Dmz_") && l.ends_with("layer is added")));
    // Two sub-layer rules + one parent rule; the clean-up rule is skipped.
    assert_eq!(
        report
            .lines()
            .iter()
            .filter(|l| *l == "access rule is added")
            .count(),
        3
    );
    assert!(report.contains("nat rule is added"));
}
