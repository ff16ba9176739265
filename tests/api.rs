// ABOUTME: HTTP API tests driving the axum router in-process.
// ABOUTME: Uses the scripted runtime so no container engine is needed.

mod support;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use shopstack::api::create_router;
use shopstack::config::Config;
use shopstack::runtime::HealthState;
use std::sync::Arc;
use std::time::Duration;
use support::fake_runtime::ExecReply;
use support::{FakeProbe, FakeRuntime, fast_config, provisioner};
use tempfile::TempDir;
use tower::ServiceExt;

struct Harness {
    _tmp: TempDir,
    runtime: Arc<FakeRuntime>,
    app: Router,
}

fn harness(runtime: FakeRuntime, probe: FakeProbe) -> Harness {
    harness_with(runtime, probe, |_| {})
}

fn harness_with(runtime: FakeRuntime, probe: FakeProbe, tune: impl FnOnce(&mut Config)) -> Harness {
    let tmp = tempfile::tempdir().unwrap();
    let runtime = Arc::new(runtime);
    let mut config = fast_config(tmp.path());
    tune(&mut config);
    let provisioner = provisioner(runtime.clone(), Arc::new(probe), config);
    Harness {
        app: create_router(Arc::new(provisioner)),
        runtime,
        _tmp: tmp,
    }
}

fn healthy_runtime() -> FakeRuntime {
    let runtime = FakeRuntime::new();
    runtime.script_health("tenant1_db", vec![HealthState::Healthy]);
    runtime.script_health("tenant1_shop", vec![HealthState::Healthy]);
    runtime.script_exec("ls", vec![ExecReply::Stdout("admin5kq1/\n".into())]);
    runtime
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn store_body() -> Value {
    json!({ "email": "owner@example.com", "password": "s3cret-pass" })
}

/// Database reports `starting` for `ticks` polls before turning healthy.
fn slow_database_runtime(ticks: usize) -> FakeRuntime {
    let runtime = healthy_runtime();
    let mut states = vec![HealthState::Starting; ticks];
    states.push(HealthState::Healthy);
    runtime.script_health("tenant1_db", states);
    runtime
}

/// Poll a status URL until the record leaves `processing`.
async fn wait_for_outcome(app: &Router, url: &str) -> Value {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let (status, record) = send(app, get(url)).await;
            if status == StatusCode::OK && record["status"] != "processing" {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("provisioning did not finish")
}

#[tokio::test]
async fn health_reports_healthy() {
    let h = harness(FakeRuntime::new(), FakeProbe::answering(200));
    let (status, body) = send(&h.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy" }));
}

mod create_store {
    use super::*;

    #[tokio::test]
    async fn returns_report_when_store_is_ready() {
        let h = harness(healthy_runtime(), FakeProbe::answering(200));
        let (status, body) = send(&h.app, post_json("/create-store", store_body())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tenant_id"], "tenant1");
        assert_eq!(body["port"], 8081);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["admin_folder"], "admin5kq1");
        assert_eq!(body["admin_url"], "http://203.0.113.7:8081/admin5kq1");
        assert_eq!(body["admin_password"], "s3cret-pass");
    }

    #[tokio::test]
    async fn pending_storefront_answers_accepted() {
        let runtime = FakeRuntime::new();
        runtime.script_health("tenant1_db", vec![HealthState::Healthy]);
        runtime.script_health("tenant1_shop", vec![HealthState::Starting]);
        let h = harness(runtime, FakeProbe::refusing());

        let (status, body) = send(&h.app, post_json("/create-store", store_body())).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["status"], "pending");
    }

    #[tokio::test]
    async fn database_timeout_maps_to_gateway_timeout() {
        let runtime = FakeRuntime::new();
        runtime.script_health("tenant1_db", vec![HealthState::Unhealthy]);
        let h = harness(runtime, FakeProbe::answering(200));

        let (status, body) = send(&h.app, post_json("/create-store", store_body())).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["kind"], "dependency_timed_out");
        assert_eq!(body["tenant_id"], "tenant1");
        assert!(body["error"].as_str().unwrap().contains("database"));
    }

    #[tokio::test]
    async fn missing_password_is_bad_request() {
        let h = harness(FakeRuntime::new(), FakeProbe::answering(200));
        let (status, body) = send(
            &h.app,
            post_json("/create-store", json!({ "email": "owner@example.com" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "bad_request");
        assert_eq!(h.runtime.count("up"), 0);
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let h = harness(FakeRuntime::new(), FakeProbe::answering(200));
        let request = Request::post("/create-store")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "bad_request");
    }

    #[tokio::test]
    async fn client_disconnect_does_not_stop_the_run() {
        let h = harness_with(slow_database_runtime(10), FakeProbe::answering(200), |config| {
            config.database.max_attempts = 100;
        });

        let request = h.app.clone().oneshot(post_json("/create-store", store_body()));
        let dropped = tokio::time::timeout(Duration::from_millis(10), request).await;
        assert!(dropped.is_err(), "run finished before the client went away");

        let record = wait_for_outcome(&h.app, "/status/tenant1").await;
        assert_eq!(record["status"], "completed");
        assert_eq!(record["result"]["admin_folder"], "admin5kq1");
    }

    #[tokio::test]
    async fn exhausted_ports_are_service_unavailable() {
        let runtime = FakeRuntime::new();
        for port in 8081..=8181 {
            runtime.publish(port);
        }
        let h = harness(runtime, FakeProbe::answering(200));

        let (status, body) = send(&h.app, post_json("/create-store", store_body())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["kind"], "allocation_exhausted");
        assert!(body.get("tenant_id").is_none());
    }
}

mod status {
    use super::*;

    #[tokio::test]
    async fn unknown_tenant_is_not_found() {
        let h = harness(FakeRuntime::new(), FakeProbe::answering(200));
        let (status, body) = send(&h.app, get("/status/tenant42")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");
    }

    #[tokio::test]
    async fn malformed_id_is_not_found() {
        let h = harness(FakeRuntime::new(), FakeProbe::answering(200));
        let (status, _) = send(&h.app, get("/status/shop1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn background_run_is_observable_until_completion() {
        let h = harness(healthy_runtime(), FakeProbe::answering(200));

        let (status, body) = send(&h.app, post_json("/stores", store_body())).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["tenant_id"], "tenant1");
        assert_eq!(body["port"], 8081);
        let status_url = body["status_url"].as_str().unwrap().to_string();
        assert_eq!(status_url, "/status/tenant1");

        let mut last_percent = 0;
        let record = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let (status, record) = send(&h.app, get(&status_url)).await;
                assert_eq!(status, StatusCode::OK);
                let percent = record["percent"].as_u64().unwrap();
                assert!(percent >= last_percent, "percent went backwards");
                last_percent = percent;
                if record["status"] != "processing" {
                    return record;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("background provisioning did not finish");

        assert_eq!(record["status"], "completed");
        assert_eq!(record["percent"], 100);
        assert_eq!(record["stage"], "completed");
        assert_eq!(record["result"]["admin_folder"], "admin5kq1");
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn delete_unknown_tenant_is_not_found() {
        let h = harness(FakeRuntime::new(), FakeProbe::answering(200));
        let request = Request::delete("/stores/tenant9").body(Body::empty()).unwrap();

        let (status, body) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "unknown_tenant");
        assert_eq!(body["tenant_id"], "tenant9");
    }

    #[tokio::test]
    async fn delete_tears_down_existing_store() {
        let h = harness(healthy_runtime(), FakeProbe::answering(200));
        let (status, _) = send(&h.app, post_json("/create-store", store_body())).await;
        assert_eq!(status, StatusCode::OK);

        let request = Request::delete("/stores/tenant1").body(Body::empty()).unwrap();
        let (status, body) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "removed");
        assert!(h.runtime.count("down tenant1") >= 1);
    }

    #[tokio::test]
    async fn redeploy_rejects_malformed_id() {
        let h = harness(FakeRuntime::new(), FakeProbe::answering(200));
        let (status, body) =
            send(&h.app, post_json("/stores/shop1/redeploy", store_body())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "bad_request");
    }

    #[tokio::test]
    async fn redeploy_during_active_run_is_conflict() {
        let h = harness_with(slow_database_runtime(40), FakeProbe::answering(200), |config| {
            config.database.max_attempts = 200;
        });

        let (status, _) = send(&h.app, post_json("/stores", store_body())).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let (status, body) =
            send(&h.app, post_json("/stores/tenant1/redeploy", store_body())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "tenant_busy");
        assert_eq!(body["tenant_id"], "tenant1");

        let record = wait_for_outcome(&h.app, "/status/tenant1").await;
        assert_eq!(record["status"], "completed");
        assert_eq!(record["result"]["port"], 8081);
    }

    #[tokio::test]
    async fn redeploy_of_existing_store_is_accepted() {
        let h = harness(healthy_runtime(), FakeProbe::answering(200));
        let (status, _) = send(&h.app, post_json("/create-store", store_body())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) =
            send(&h.app, post_json("/stores/tenant1/redeploy", store_body())).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["tenant_id"], "tenant1");
        assert_eq!(body["status_url"], "/status/tenant1");
    }
}
