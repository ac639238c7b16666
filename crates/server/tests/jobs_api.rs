//! End-to-end API tests against the spawned server binary.
//!
//! The server runs with a filesystem store backend rooted in a temp
//! directory, so the full intake -> schedule -> pipeline -> manifest path
//! is exercised without external services. The conversion engine is never
//! reached in these tests; the end-to-end job fails at input fetch, which
//! is itself part of the pipeline contract under test.

use std::net::TcpListener;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::time::sleep;

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

struct TestServer {
    port: u16,
    store_root: std::path::PathBuf,
    _dir: TempDir,
    child: tokio::process::Child,
}

impl TestServer {
    async fn spawn() -> Self {
        let dir = TempDir::new().unwrap();
        let port = get_available_port();
        let store_root = dir.path().join("store");
        let config = format!(
            r#"
[server]
host = "127.0.0.1"
port = {port}

[store]
backend = "filesystem"

[store.filesystem]
root = "{store_root}"

[converter]
soffice_path = "/nonexistent/soffice"
timeout_secs = 10

[pipeline]
concurrency = 1
max_input_size_mb = 10
scratch_dir = "{scratch}"
"#,
            store_root = store_root.display(),
            scratch = dir.path().join("scratch").display(),
        );
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, config).unwrap();

        let child = tokio::process::Command::new(env!("CARGO_BIN_EXE_slidepress"))
            .env("SLIDEPRESS_CONFIG", &config_path)
            .env("RUST_LOG", "error") // Quiet logs during tests
            .kill_on_drop(true)
            .spawn()
            .expect("Failed to spawn server");

        let server = Self {
            port,
            store_root,
            _dir: dir,
            child,
        };
        assert!(server.wait_ready(60).await, "Server did not start in time");
        server
    }

    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    async fn wait_ready(&self, max_attempts: u32) -> bool {
        let client = Client::new();
        for _ in 0..max_attempts {
            if client.get(self.url("/health")).send().await.is_ok() {
                return true;
            }
            sleep(Duration::from_millis(50)).await;
        }
        false
    }

    async fn submit_job(&self, client: &Client, tenant: &str, job_id: &str) -> reqwest::Response {
        client
            .post(self.url("/v1/jobs"))
            .json(&json!({
                "tenantId": tenant,
                "jobId": job_id,
                "input": {"bucket": "decks", "key": format!("{tenant}/{job_id}.pptx")},
                "output": {"bucket": "out", "key": format!("jobs/{job_id}/")},
            }))
            .send()
            .await
            .expect("Failed to send request")
    }

    async fn poll_terminal(&self, client: &Client, tenant: &str, job_id: &str) -> Value {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let response = client
                .get(self.url(&format!("/v1/jobs/{job_id}")))
                .query(&[("tenantId", tenant)])
                .send()
                .await
                .expect("Failed to send request");
            assert!(response.status().is_success());
            let body: Value = response.json().await.unwrap();
            let status = body["status"].as_str().unwrap().to_string();
            if status == "succeeded" || status == "failed" {
                return body;
            }
            assert!(
                Instant::now() < deadline,
                "job {job_id} did not reach a terminal state"
            );
            sleep(Duration::from_millis(50)).await;
        }
    }
}

#[tokio::test]
async fn test_health_and_ready_endpoints() {
    let mut server = TestServer::spawn().await;
    let client = Client::new();

    let response = client.get(server.url("/health")).send().await.unwrap();
    assert!(response.status().is_success());
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["status"], "ok");

    let response = client.get(server.url("/ready")).send().await.unwrap();
    assert!(response.status().is_success());

    server.child.kill().await.ok();
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_prometheus_format() {
    let mut server = TestServer::spawn().await;
    let client = Client::new();

    let response = client.get(server.url("/metrics")).send().await.unwrap();
    assert!(response.status().is_success());
    let body = response.text().await.unwrap();
    assert!(body.contains("slidepress_http_requests_total"));

    server.child.kill().await.ok();
}

#[tokio::test]
async fn test_malformed_submission_rejected_synchronously() {
    let mut server = TestServer::spawn().await;
    let client = Client::new();

    let response = client
        .post(server.url("/v1/jobs"))
        .json(&json!({
            "tenantId": "",
            "jobId": "job-1",
            "input": {"bucket": "decks", "key": "deck.pptx"},
            "output": {"bucket": "out", "key": "jobs/job-1/"},
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_REQUEST");
    assert!(body["error"].as_str().unwrap().contains("tenantId"));

    server.child.kill().await.ok();
}

#[tokio::test]
async fn test_unknown_job_returns_404() {
    let mut server = TestServer::spawn().await;
    let client = Client::new();

    let response = client
        .get(server.url("/v1/jobs/no-such-job"))
        .query(&[("tenantId", "acme")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    server.child.kill().await.ok();
}

#[tokio::test]
async fn test_submission_is_accepted_and_idempotent() {
    let mut server = TestServer::spawn().await;
    let client = Client::new();

    let response = server.submit_job(&client, "acme", "job-dup").await;
    assert_eq!(response.status(), 202);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["jobId"], "job-dup");
    assert_eq!(body["status"], "queued");

    // Resubmission returns the current state instead of a second run.
    let response = server.submit_job(&client, "acme", "job-dup").await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["jobId"], "job-dup");

    server.child.kill().await.ok();
}

#[tokio::test]
async fn test_tenant_mismatch_looks_like_unknown_job() {
    let mut server = TestServer::spawn().await;
    let client = Client::new();

    let response = server.submit_job(&client, "acme", "job-secret").await;
    assert_eq!(response.status(), 202);

    let response = client
        .get(server.url("/v1/jobs/job-secret"))
        .query(&[("tenantId", "globex")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    server.child.kill().await.ok();
}

#[tokio::test]
async fn test_missing_input_job_fails_with_manifest() {
    let mut server = TestServer::spawn().await;
    let client = Client::new();

    // No input object is seeded, so the job fails at fetch with a
    // permanent storage error.
    let response = server.submit_job(&client, "acme", "job-e2e").await;
    assert_eq!(response.status(), 202);

    let body = server.poll_terminal(&client, "acme", "job-e2e").await;
    assert_eq!(body["status"], "failed");
    assert_eq!(body["userId"], "acme");
    assert_eq!(body["manifest"]["bucket"], "out");
    assert_eq!(body["manifest"]["key"], "jobs/job-e2e/manifest.json");

    // The failure manifest was published to the store.
    let manifest_path = server.store_root.join("out/jobs/job-e2e/manifest.json");
    let manifest: Value =
        serde_json::from_slice(&std::fs::read(&manifest_path).unwrap()).unwrap();
    assert_eq!(manifest["status"], "failed");
    assert_eq!(manifest["jobId"], "job-e2e");
    assert_eq!(manifest["error"]["code"], "OBJECT_NOT_FOUND");

    server.child.kill().await.ok();
}
