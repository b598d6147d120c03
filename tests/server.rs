//! Webhook server round trips against the in-process router.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use sage::config::ResponderConfig;
use sage::faq::FaqEntry;
use sage::storage::SqliteStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn router() -> axum::Router {
    let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
    store
        .insert_faq(&FaqEntry {
            id: "hw".into(),
            question: "What is the homework policy?".into(),
            answer: "Late work not accepted.".into(),
            category: "General".into(),
            link: None,
        })
        .expect("seed faq");
    let responder = Arc::new(sage::build_responder(store, &ResponderConfig::default()));
    sage::server::router(responder)
}

fn post(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn message_event_round_trips_to_a_matched_outcome() {
    let app = router();
    let response = app
        .oneshot(post(
            "/v1/messages",
            json!({
                "text": "what is the homework policy",
                "user_id": "u1",
                "user_name": "Alice",
                "channel_id": "general"
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let outcome = body_json(response).await;
    assert_eq!(outcome["outcome"], "matched");
    assert_eq!(outcome["faq"]["id"], "hw");
    assert_eq!(outcome["feedback_window_secs"], 60);
}

#[tokio::test]
async fn unmatched_reaction_acks_without_recording() {
    let app = router();
    let response = app
        .oneshot(post(
            "/v1/reactions",
            json!({
                "user_id": "u1",
                "faq_id": "hw",
                "sentiment": "positive"
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let ack = body_json(response).await;
    assert_eq!(ack["recorded"], false);
}

#[tokio::test]
async fn healthz_responds() {
    let app = router();
    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}
