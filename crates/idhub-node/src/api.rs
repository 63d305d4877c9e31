//! HTTP API for the hub node.
//!
//! `POST {base_path}` accepts a hub request envelope and answers with the
//! response envelope; `GET {base_path}/health` reports liveness.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

use idhub_core::{IncomingRequest, ResponseEnvelope};

use crate::endpoint::HubProtocolEndpoint;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

// --- Handlers ---

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

async fn handle_request(
    State(endpoint): State<Arc<HubProtocolEndpoint>>,
    body: Bytes,
) -> Result<Json<ResponseEnvelope>, (StatusCode, Json<ErrorResponse>)> {
    // Only the envelope shape is checked here; each message is decoded on its
    // own so one bad message cannot fail the rest.
    let request: IncomingRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "rejecting malformed request envelope");
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("invalid request envelope: {}", e),
            }),
        )
    })?;

    Ok(Json(endpoint.handle_incoming(request)))
}

// --- Server ---

pub fn build_router(endpoint: Arc<HubProtocolEndpoint>, base_path: &str) -> Router {
    let base = base_path.trim_end_matches('/');
    let root = if base.is_empty() { "/" } else { base };
    Router::new()
        .route(root, post(handle_request))
        .route(&format!("{}/health", base), get(handle_health))
        .with_state(endpoint)
}

pub async fn start_api_server(
    listener: tokio::net::TcpListener,
    endpoint: Arc<HubProtocolEndpoint>,
    base_path: &str,
) -> anyhow::Result<()> {
    let app = build_router(endpoint, base_path);
    let listen_addr: SocketAddr = listener.local_addr()?;
    tracing::info!(%listen_addr, base_path, "HTTP API server started");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::MessageProcessorRegistry;
    use crate::store::MessageStore;
    use axum::body::Body;
    use axum::http::{header, Request};
    use base64::engine::general_purpose::URL_SAFE;
    use base64::Engine;
    use tower::ServiceExt;

    const BASE: &str = "/api/identity-hub";

    fn router() -> Router {
        let store = Arc::new(MessageStore::new());
        let registry = Arc::new(MessageProcessorRegistry::with_defaults(store));
        build_router(Arc::new(HubProtocolEndpoint::new(registry)), BASE)
    }

    fn post_json(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(BASE)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn envelope(method: &str, data: Option<&str>) -> serde_json::Value {
        serde_json::json!({
            "requestId": format!("req-{}", method),
            "target": "did:web:y",
            "messages": [{
                "descriptor": {"method": method, "nonce": format!("nonce-{}", method)},
                "data": data.map(|d| URL_SAFE.encode(d)),
            }]
        })
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri(format!("{}/health", BASE))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_query_empty_store() {
        let response = router()
            .oneshot(post_json(envelope("CollectionsQuery", None)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["requestId"], "req-CollectionsQuery");
        assert_eq!(body["status"]["code"], 200);
        assert_eq!(body["replies"][0]["status"]["code"], 200);
        assert_eq!(body["replies"][0]["messageId"], "nonce-CollectionsQuery");
        assert_eq!(body["replies"][0]["entries"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_write_then_query_returns_token_verbatim() {
        let app = router();
        let token = "eyJhbGciOiJFZERTQSJ9.eyJpc3MiOiJkaWQ6eCJ9.c2ln";

        let response = app
            .clone()
            .oneshot(post_json(envelope("CollectionsWrite", Some(token))))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["replies"][0]["status"]["code"], 200);

        let response = app
            .oneshot(post_json(envelope("CollectionsQuery", None)))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["replies"][0]["entries"], serde_json::json!([token]));
    }

    #[tokio::test]
    async fn test_unknown_method_is_not_implemented() {
        let response = router()
            .oneshot(post_json(envelope("PermissionsRequest", None)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["replies"][0]["status"]["code"], 501);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri(BASE)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"messages\": 42"))
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("invalid request envelope"));
    }

    #[tokio::test]
    async fn test_bad_message_does_not_fail_its_siblings() {
        let body = serde_json::json!({
            "requestId": "req-mixed",
            "target": "did:web:y",
            "messages": [
                {"nonce": "no-descriptor"},
                {"descriptor": {"method": 7, "nonce": "numeric-method"}},
                {"descriptor": {"method": "CollectionsQuery", "nonce": "query"}},
                {"descriptor": {"method": "CollectionsWrite"}, "data": 12}
            ]
        });
        let response = router().oneshot(post_json(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["requestId"], "req-mixed");
        assert_eq!(body["status"]["code"], 200);
        let replies = body["replies"].as_array().unwrap();
        let summary: Vec<(&str, u64)> = replies
            .iter()
            .map(|r| {
                (
                    r["messageId"].as_str().unwrap(),
                    r["status"]["code"].as_u64().unwrap(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("messageId", 400),
                ("numeric-method", 400),
                ("query", 200),
                ("messageId", 400),
            ]
        );
        assert_eq!(replies[2]["entries"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_body_without_envelope_fields_is_bad_request() {
        for body in [
            serde_json::json!({"requestId": "r1"}),
            serde_json::json!({"messages": []}),
            serde_json::json!({"requestId": "r1", "messages": {"descriptor": {}}}),
        ] {
            let response = router().oneshot(post_json(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }
}
