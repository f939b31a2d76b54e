//! Deployment workflows driven against a mock cloud
//!
//! The HTTP side is the real `ApiClient` talking to `wiremock`; only the
//! ssh invocation is replaced with `FakeRemoteShell`.

mod common;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vstats::api::ApiClient;
use vstats::config::Session;
use vstats::deploy::{
    deploy_agent, deploy_web, find_server_by_name_or_id, AgentRequest, FakeRemoteShell, SshTarget,
    WebRequest,
};
use vstats::error::kind_of;
use vstats::VstatsError;

use common::{server_json, web_instance_json};

fn session(server: &MockServer) -> Session {
    Session {
        cloud_url: server.uri(),
        token: "test-token".to_string(),
        username: "tester".to_string(),
    }
}

fn client(server: &MockServer) -> ApiClient {
    ApiClient::from_session(&session(server)).expect("valid client")
}

async fn mount_plan(server: &MockServer, current: i64, max: i64, is_pro: bool) {
    Mock::given(method("GET"))
        .and(path("/api/user/plan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "plan": if is_pro { "pro" } else { "free" },
            "max_web_apps": max,
            "current_count": current,
            "is_pro": is_pro
        })))
        .mount(server)
        .await;
}

async fn mount_instances(server: &MockServer, instances: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/web/instances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(instances))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_resolution_by_id_skips_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/servers/srv-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_json("srv-1", "alpha")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let found = find_server_by_name_or_id(&client(&server), "srv-1")
        .await
        .expect("resolve");
    assert_eq!(found.name, "alpha");
}

#[tokio::test]
async fn test_resolution_by_name_after_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/servers/beta"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            server_json("srv-1", "alpha"),
            server_json("srv-2", "beta")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let found = find_server_by_name_or_id(&client(&server), "beta")
        .await
        .expect("resolve");
    assert_eq!(found.id, "srv-2");
}

#[tokio::test]
async fn test_resolution_miss_reports_reference() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([server_json(
            "srv-1", "alpha"
        )])))
        .mount(&server)
        .await;

    let err = find_server_by_name_or_id(&client(&server), "gamma")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "server not found: gamma");
}

#[tokio::test]
async fn test_agent_deploy_creates_then_installs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/servers"))
        .respond_with(ResponseTemplate::new(201).set_body_json(server_json("srv-5", "10.0.0.5")))
        .expect(1)
        .mount(&server)
        .await;

    let shell = FakeRemoteShell::succeeding();
    let request = AgentRequest {
        target: SshTarget::new("10.0.0.5", None, Some(2222), None),
        name: None,
        server: None,
    };

    let deployment = deploy_agent(&client(&server), &shell, &session(&server), &request)
        .await
        .expect("deploy");
    assert_eq!(deployment.server_id, "srv-5");
    assert_eq!(deployment.agent_key, "key-srv-5");

    let runs = shell.invocations();
    assert_eq!(runs.len(), 1);
    assert_eq!(&runs[0][..3], &["-p", "2222", "root@10.0.0.5"]);
    assert!(runs[0][3].contains(&format!("--server {}", server.uri())));
}

#[tokio::test]
async fn test_web_deploy_quota_blocks_registration() {
    let server = MockServer::start().await;
    mount_plan(&server, 1, 1, false).await;
    mount_instances(
        &server,
        json!([web_instance_json("web-1", "home", "online")]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/web/instances"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let shell = FakeRemoteShell::succeeding();
    let request = WebRequest {
        target: SshTarget::new("dash", None, None, None),
        name: None,
        port: 3001,
        domain: None,
        ssl: false,
    };

    let err = deploy_web(&client(&server), &shell, &session(&server), &request)
        .await
        .unwrap_err();
    assert!(matches!(
        kind_of(&err),
        Some(VstatsError::QuotaExceeded { .. })
    ));
    assert!(shell.invocations().is_empty());
}

#[tokio::test]
async fn test_web_deploy_failure_removes_registration() {
    let server = MockServer::start().await;
    mount_plan(&server, 0, 1, false).await;
    mount_instances(&server, json!([])).await;
    Mock::given(method("POST"))
        .and(path("/api/web/instances"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(web_instance_json("web-3", "web-dash", "pending")),
        )
        .expect(1)
        .mount(&server)
        .await;
    // Cleanup itself fails; the deployment error must still surface
    Mock::given(method("DELETE"))
        .and(path("/api/web/instances/web-3"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/web/instances/web-3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let shell = FakeRemoteShell::failing("exit status: 1");
    let request = WebRequest {
        target: SshTarget::new("dash", None, None, None),
        name: None,
        port: 3001,
        domain: None,
        ssl: false,
    };

    let err = deploy_web(&client(&server), &shell, &session(&server), &request)
        .await
        .unwrap_err();
    assert!(matches!(kind_of(&err), Some(VstatsError::Deployment(_))));
}

#[tokio::test]
async fn test_web_deploy_success_pushes_online_status() {
    let server = MockServer::start().await;
    mount_plan(&server, 3, -1, false).await;
    mount_instances(&server, json!([])).await;
    Mock::given(method("POST"))
        .and(path("/api/web/instances"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(web_instance_json("web-4", "web-dash", "pending")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/web/instances/web-4"))
        .and(wiremock::matchers::body_partial_json(json!({"status": "online"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let shell = FakeRemoteShell::succeeding();
    let request = WebRequest {
        target: SshTarget::new("dash", None, None, None),
        name: None,
        port: 3001,
        domain: None,
        ssl: false,
    };

    let deployment = deploy_web(&client(&server), &shell, &session(&server), &request)
        .await
        .expect("deploy");
    assert!(deployment.status_synced);
    assert_eq!(deployment.instance.id, "web-4");
}
