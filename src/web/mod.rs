mod api;

use crate::service::SmsService;
use anyhow::Result;
use axum::{
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Builds the HTTP router for the receiver.
pub fn router(service: Arc<SmsService>) -> Router {
    Router::new()
        .route("/sms/receive", post(api::receive_sms))
        .route("/sms/send", post(api::send_sms))
        .route("/sms/stats", get(api::stats))
        .route("/sms/list", get(api::list_sms))
        .route("/health", get(api::health))
        .with_state(service)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serves the API on `addr` until Ctrl-C is received.
pub async fn start_server(service: Arc<SmsService>, addr: &str) -> Result<()> {
    let app = router(service);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("SMS receiver listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("SMS receiver stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Unable to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    debug!("No route for {}", uri.path());
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "status": "error", "message": "not found" })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dhis2::fake::RecordingForwarder;
    use crate::dhis2::SmsForwarder;
    use crate::storage::{MemorySmsStore, SmsStore};
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    struct Harness {
        app: Router,
        store: Arc<MemorySmsStore>,
    }

    fn harness(forwarder: Option<Arc<RecordingForwarder>>) -> Harness {
        let store = Arc::new(MemorySmsStore::new(1000));
        let forwarder = forwarder.map(|f| f as Arc<dyn SmsForwarder + Send + Sync>);
        let service = Arc::new(SmsService::new(store.clone(), forwarder));
        Harness {
            app: router(service),
            store,
        }
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn receive_then_stats() {
        let h = harness(None);

        let (status, body) = call(
            &h.app,
            post_json(
                "/sms/receive",
                json!({ "originator": "+123456789", "message": "test" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert!(body["id"].is_string());

        let (status, body) = call(&h.app, get_req("/sms/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["inbound"], 1);
        assert_eq!(body["outbound"], 0);
        assert_eq!(body["total_sms"], 1);
    }

    #[tokio::test]
    async fn receive_accepts_form_parameters() {
        let h = harness(None);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/sms/receive")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("originator=%2B255700000001&message=ANC+visit"))
            .unwrap();

        let (status, body) = call(&h.app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");

        let stored = h.store.recent(1).await.unwrap();
        assert_eq!(stored[0].phone, "+255700000001");
        assert_eq!(stored[0].message, "ANC visit");
    }

    #[tokio::test]
    async fn receive_missing_field_is_rejected_without_counting() {
        let h = harness(None);

        for payload in [
            json!({ "message": "test" }),
            json!({ "originator": "+123456789" }),
            json!({ "originator": "", "message": "test" }),
        ] {
            let (status, body) = call(&h.app, post_json("/sms/receive", payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["status"], "error");
        }

        let (_, body) = call(&h.app, get_req("/sms/stats")).await;
        assert_eq!(body["total_sms"], 0);
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let h = harness(None);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/sms/receive")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = call(&h.app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn receive_succeeds_when_forwarding_fails() {
        let forwarder = Arc::new(RecordingForwarder::failing());
        let h = harness(Some(forwarder.clone()));

        let (status, body) = call(
            &h.app,
            post_json(
                "/sms/receive",
                json!({ "originator": "+123456789", "message": "test" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["forward_status"], "failed");
        assert_eq!(forwarder.count(), 1);

        let (_, body) = call(&h.app, get_req("/sms/list")).await;
        assert_eq!(body["sms"][0]["forward_status"], "pending");
    }

    #[tokio::test]
    async fn store_outage_skips_forwarding() {
        let forwarder = Arc::new(RecordingForwarder::default());
        let h = harness(Some(forwarder.clone()));
        h.store.set_available(false);

        let (status, _) = call(
            &h.app,
            post_json(
                "/sms/receive",
                json!({ "originator": "+123456789", "message": "test" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(forwarder.count(), 0);
    }

    #[tokio::test]
    async fn receive_accepts_query_parameters_without_body() {
        let h = harness(None);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/sms/receive?originator=%2B1&message=hi")
            .body(Body::empty())
            .unwrap();

        let (status, body) = call(&h.app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");

        let stored = h.store.recent(1).await.unwrap();
        assert_eq!(stored[0].phone, "+1");
        assert_eq!(stored[0].message, "hi");

        let request = Request::builder()
            .method(Method::POST)
            .uri("/sms/receive")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(&h.app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn send_accepts_recipient() {
        let h = harness(None);

        let (status, body) = call(
            &h.app,
            post_json(
                "/sms/send",
                json!({ "recipient": "+123456789", "message": "hi" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");

        let (status, _) = call(
            &h.app,
            post_json("/sms/send", json!({ "message": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn stats_total_is_sum_of_directions() {
        let h = harness(None);
        for i in 0..3 {
            call(
                &h.app,
                post_json(
                    "/sms/receive",
                    json!({ "originator": "+1", "message": format!("in {i}") }),
                ),
            )
            .await;
        }
        for i in 0..2 {
            call(
                &h.app,
                post_json(
                    "/sms/send",
                    json!({ "recipient": "+2", "message": format!("out {i}") }),
                ),
            )
            .await;
        }

        let (_, body) = call(&h.app, get_req("/sms/stats")).await;
        assert_eq!(body["inbound"], 3);
        assert_eq!(body["outbound"], 2);
        assert_eq!(body["total_sms"], 5);
    }

    #[tokio::test]
    async fn list_limits_and_orders_newest_first() {
        let h = harness(None);
        for i in 0..7 {
            call(
                &h.app,
                post_json(
                    "/sms/receive",
                    json!({ "originator": "+1", "message": format!("msg {i}") }),
                ),
            )
            .await;
        }

        let (status, body) = call(&h.app, get_req("/sms/list?limit=5")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["count"], 5);

        let sms = body["sms"].as_array().unwrap();
        assert_eq!(sms.len(), 5);
        assert_eq!(sms[0]["message"], "msg 6");
        assert_eq!(sms[0]["type"], "inbound");
        assert_eq!(sms[4]["message"], "msg 2");
        for entry in sms {
            assert!(entry["phone"].is_string());
            assert!(entry["timestamp"].is_string());
        }
    }

    #[tokio::test]
    async fn list_caps_oversized_limit() {
        let h = harness(None);
        for i in 0..3 {
            call(
                &h.app,
                post_json(
                    "/sms/send",
                    json!({ "recipient": "+1", "message": format!("msg {i}") }),
                ),
            )
            .await;
        }

        let (status, body) = call(&h.app, get_req("/sms/list?limit=99999999999999999999")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 3);
    }

    #[tokio::test]
    async fn list_rejects_bad_limits() {
        let h = harness(None);
        for uri in ["/sms/list?limit=abc", "/sms/list?limit=-3"] {
            let (status, body) = call(&h.app, get_req(uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["status"], "error");
        }
    }

    #[tokio::test]
    async fn health_reports_degraded_store_with_200() {
        let h = harness(None);

        let (status, body) = call(&h.app, get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["redis"], "healthy");

        h.store.set_available(false);
        let (status, body) = call(&h.app, get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["redis"], "unhealthy");
    }

    #[tokio::test]
    async fn store_outage_returns_503() {
        let h = harness(None);
        h.store.set_available(false);

        let (status, body) = call(&h.app, get_req("/sms/stats")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "error");

        let (status, _) = call(
            &h.app,
            post_json("/sms/send", json!({ "recipient": "+1", "message": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let h = harness(None);
        let (status, body) = call(&h.app, get_req("/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "not found");
    }
}
