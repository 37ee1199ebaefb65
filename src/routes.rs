//! HTTP routes of the reference backend: issue, verify and inspect certificates.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{ApiResponse, IssueBody, Mode, VerifyBody};
use crate::ledger::Ledger;
use crate::model::hash_concat;
use crate::normalize::require_certificate;

/// Shared application state passed to Axum handlers.
#[derive(Clone, Default)]
pub struct AppState {
    pub ledger: Arc<Mutex<Ledger>>,
}

/// Router with permissive CORS so a browser front-end on any origin can call it.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/issue", post(issue_certificate))
        .route("/verify", post(verify_certificate))
        .route("/chain", get(full_chain))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn reply(r: ApiResponse) -> Response {
    let status = StatusCode::from_u16(r.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(r.data)).into_response()
}

/// Malformed or non-object bodies read as `{}`.
fn certificate_field(body: &Bytes) -> Option<Value> {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("certificate").cloned())
}

/// Normalized text to lowercase hex SHA-256.
pub fn certificate_hash(normalized: &str) -> String {
    hash_concat(&[normalized.as_bytes()])
}

/// POST /issue
pub async fn issue_certificate(State(state): State<AppState>, body: Bytes) -> Response {
    let normalized = match require_certificate(certificate_field(&body).as_ref()) {
        Ok(text) => text,
        Err(e) => return reply(ApiResponse::error(400, e.to_string())),
    };
    let cert_hash = certificate_hash(&normalized);

    let mut ledger = state.ledger.lock();
    if !ledger.add_certificate(&cert_hash) {
        return reply(ApiResponse::new(
            200,
            IssueBody {
                message: "Certificate already exists".into(),
                certificate_hash: cert_hash,
                block_index: None,
                mode: Some(Mode::Online),
            },
        ));
    }
    let block = ledger.mine_pending();
    drop(ledger);

    let block_index = block.map(|b| b.index);
    info!(certificate_hash = %cert_hash, ?block_index, "issued certificate");
    reply(ApiResponse::new(
        201,
        IssueBody {
            message: "Certificate issued and stored on blockchain".into(),
            certificate_hash: cert_hash,
            block_index,
            mode: Some(Mode::Online),
        },
    ))
}

/// POST /verify
pub async fn verify_certificate(State(state): State<AppState>, body: Bytes) -> Response {
    let normalized = match require_certificate(certificate_field(&body).as_ref()) {
        Ok(text) => text,
        Err(e) => return reply(ApiResponse::error(400, e.to_string())),
    };
    let cert_hash = certificate_hash(&normalized);

    let ledger = state.ledger.lock();
    let verdict = |valid: bool, explanation: &str| VerifyBody {
        valid,
        explanation: explanation.into(),
        mode: Some(Mode::Online),
    };

    if !ledger.is_valid() {
        return reply(ApiResponse::new(
            500,
            verdict(false, "Blockchain integrity check failed. Data may have been tampered with."),
        ));
    }
    if ledger.certificate_exists(&cert_hash) {
        return reply(ApiResponse::new(
            200,
            verdict(true, "This certificate exists on the blockchain and has not been altered."),
        ));
    }
    reply(ApiResponse::new(
        200,
        verdict(false, "Certificate not found. It may be fake or altered."),
    ))
}

/// GET /chain
pub async fn full_chain(State(state): State<AppState>) -> Response {
    let snapshot = state.ledger.lock().snapshot();
    reply(ApiResponse::new(200, snapshot))
}

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
}

/// GET /health
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certificate_hash_is_sha256_hex_of_normalized_text() {
        assert_eq!(
            certificate_hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn unreadable_bodies_have_no_certificate() {
        assert_eq!(certificate_field(&Bytes::from_static(b"not json")), None);
        assert_eq!(certificate_field(&Bytes::from_static(b"[1,2]")), None);
        assert_eq!(
            certificate_field(&Bytes::from_static(br#"{"certificate":"x"}"#)),
            Some(Value::String("x".into()))
        );
    }
}
