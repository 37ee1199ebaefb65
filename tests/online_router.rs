use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use cert_ledger::routes::{self, AppState};
use cert_ledger::settings::Preferences;
use cert_ledger::storage::{KvStore, MemoryStore};
use cert_ledger::{Connectivity, Mode, OfflineChainStore, RequestRouter, RouterError};

async fn spawn_backend(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn router_for(base_url: &str) -> (Preferences, RequestRouter) {
    let kv: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let prefs = Preferences::new(kv.clone());
    prefs.save_base_url(base_url).unwrap();
    prefs.save_mode(Mode::Online).unwrap();
    let router = RequestRouter::new(prefs.clone(), OfflineChainStore::new(kv));
    (prefs, router)
}

#[tokio::test]
async fn alice_scenario_against_backend() {
    let base = spawn_backend(routes::app(AppState::default())).await;
    let (_prefs, router) = router_for(&base);

    let chain = router.get_chain().await.unwrap();
    assert_eq!(chain.status, 200);
    assert_eq!(chain.data["length"], json!(1));
    assert_eq!(chain.data["is_valid"], json!(true));

    let issued = router.issue_certificate("Alice completed Course X").await.unwrap();
    assert_eq!(issued.status, 201);
    assert_eq!(issued.data["block_index"], json!(2));
    assert_eq!(issued.data["mode"], json!("online"));
    assert_eq!(router.status(), Connectivity::Connected);

    let hit = router.verify_certificate("  Alice completed   Course X").await.unwrap();
    assert_eq!(hit.data["valid"], json!(true));
    let miss = router.verify_certificate("Alice completed Course Y").await.unwrap();
    assert_eq!(miss.status, 200);
    assert_eq!(miss.data["valid"], json!(false));

    let again = router.issue_certificate("Alice completed Course X").await.unwrap();
    assert_eq!(again.status, 200);
    assert_eq!(again.data["certificate_hash"], issued.data["certificate_hash"]);

    let chain = router.get_chain().await.unwrap();
    assert_eq!(chain.data["length"], json!(2));
    assert_eq!(chain.data["chain"][1]["previous_hash"], chain.data["chain"][0]["hash"]);
}

#[tokio::test]
async fn error_status_is_a_response() {
    let base = spawn_backend(routes::app(AppState::default())).await;
    let (_prefs, router) = router_for(&base);

    let r = router.issue_certificate("   ").await.unwrap();
    assert_eq!(r.status, 400);
    assert_eq!(r.data, json!({"error": "Certificate cannot be empty"}));
    assert_eq!(router.status(), Connectivity::ResponseError);

    assert_eq!(router.get_chain().await.unwrap().data["length"], json!(1));
    assert_eq!(router.status(), Connectivity::Connected);
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (_prefs, router) = router_for(&format!("http://{addr}"));
    let err = router.issue_certificate("Bob").await.unwrap_err();
    assert!(matches!(err, RouterError::Unreachable { .. }));
    assert_eq!(router.status(), Connectivity::Unreachable);

    let err = router.test_connection().await.unwrap_err();
    assert!(matches!(err, RouterError::Unreachable { .. }));
}

#[tokio::test]
async fn non_json_body_is_unreachable() {
    let app = Router::new().route("/chain", get(|| async { "definitely not json" }));
    let base = spawn_backend(app).await;
    let (_prefs, router) = router_for(&base);

    let err = router.get_chain().await.unwrap_err();
    match err {
        RouterError::Unreachable { url, .. } => assert_eq!(url, format!("{base}/chain")),
        other => panic!("expected unreachable, got {other:?}"),
    }
    assert_eq!(router.status(), Connectivity::Unreachable);
}

#[tokio::test]
async fn connection_test_reports_chain() {
    let base = spawn_backend(routes::app(AppState::default())).await;
    let (_prefs, router) = router_for(&format!("{base}/"));

    let report = router.test_connection().await.unwrap();
    assert_eq!(report.status, "ok");
    assert_eq!(report.base_url.as_deref(), Some(base.as_str()));
    assert_eq!(report.http_status, Some(200));
    assert_eq!(report.chain_length, Some(1));
    assert_eq!(report.is_valid, Some(true));
}

#[tokio::test]
async fn indicator_shows_requesting_while_a_call_is_in_flight() {
    let release = Arc::new(Notify::new());
    let gate = release.clone();
    let backend = Router::new().route(
        "/chain",
        get(move || {
            let gate = gate.clone();
            async move {
                gate.notified().await;
                axum::Json(json!({
                    "length": 1,
                    "is_valid": true,
                    "pending_certificates": [],
                    "chain": []
                }))
            }
        }),
    );
    let base = spawn_backend(backend).await;
    let (_prefs, router) = router_for(&base);
    let router = Arc::new(router);
    let mut status = router.subscribe();

    let call = tokio::spawn({
        let router = router.clone();
        async move { router.get_chain().await }
    });

    tokio::time::timeout(
        std::time::Duration::from_secs(5),
        status.wait_for(|s| *s == Connectivity::Requesting),
    )
    .await
    .expect("status never reached requesting")
    .unwrap();
    assert_eq!(router.status(), Connectivity::Requesting);

    release.notify_one();
    let response = call.await.unwrap().unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(router.status(), Connectivity::Connected);
}

#[tokio::test]
async fn switching_mode_between_calls_changes_target() {
    let base = spawn_backend(routes::app(AppState::default())).await;
    let (prefs, router) = router_for(&base);

    prefs.save_mode(Mode::Offline).unwrap();
    let local = router.issue_certificate("Frank").await.unwrap();
    assert_eq!(local.status, 201);
    assert_eq!(local.data["mode"], json!("offline"));
    assert_eq!(router.status(), Connectivity::Offline);

    prefs.save_mode(Mode::Online).unwrap();
    let remote = router.verify_certificate("Frank").await.unwrap();
    assert_eq!(remote.data["valid"], json!(false));
    assert_eq!(remote.data["mode"], json!("online"));
}

#[tokio::test]
async fn backend_accepts_missing_and_malformed_bodies() {
    let base = spawn_backend(routes::app(AppState::default())).await;
    let client = reqwest::Client::new();

    let r = client
        .post(format!("{base}/verify"))
        .body("{oops")
        .send()
        .await
        .unwrap();
    assert_eq!(r.status().as_u16(), 400);
    let body: serde_json::Value = r.json().await.unwrap();
    assert_eq!(body, json!({"error": "Certificate must be a string"}));

    let health: serde_json::Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({"status": "ok"}));

    let version = client.get(format!("{base}/version")).send().await.unwrap();
    assert_eq!(version.status().as_u16(), 404);
}
