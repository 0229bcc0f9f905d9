use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use mockito::{Matcher, Mock, ServerGuard};
use replybot_api::{build_app, build_router, AppConfig, ApiState};
use replybot_classifier::{ClassifierConfig, HttpIntentClassifier};
use replybot_core::{ReplyRecord, UnmatchedIntentPolicy, NOT_FOUND_REPLY};
use replybot_observability::AppMetrics;
use replybot_resolver::ReplyResolver;
use replybot_storage::{MemoryStore, ReplyRepository, Store};
use serde_json::{json, Value};
use tower::ServiceExt;

fn seed_fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/replies.json")
}

fn app_for(
    server: &ServerGuard,
    records: &[(&str, &str)],
    policy: UnmatchedIntentPolicy,
) -> (Router, Store) {
    let store = Store::Memory(MemoryStore::with_replies(
        records
            .iter()
            .map(|(intent, reply)| ReplyRecord::new(*intent, *reply)),
    ));
    let classifier =
        HttpIntentClassifier::new(ClassifierConfig::with_base_url(server.url())).unwrap();
    let resolver = ReplyResolver::new(Arc::new(classifier), Arc::new(store.clone()))
        .with_unmatched_policy(policy);

    (
        build_router(ApiState::new(resolver, AppMetrics::shared())),
        store,
    )
}

async fn mock_intents(server: &mut ServerGuard, payload: Value) -> Mock {
    server
        .mock("POST", "/intents")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(payload.to_string())
        .create_async()
        .await
}

fn get_reply_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/getReply")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, parsed)
}

#[tokio::test]
async fn health_is_public() {
    let server = mockito::Server::new_async().await;
    let (app, _) = app_for(&server, &[], UnmatchedIntentPolicy::NotFound);

    let (status, body) = send(
        app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let server = mockito::Server::new_async().await;
    let (app, _) = app_for(&server, &[], UnmatchedIntentPolicy::NotFound);

    let (status, body) = send(
        app,
        Request::builder()
            .uri("/invalid-link")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errors"][0]["message"], "Not found");
}

#[tokio::test]
async fn missing_body_reports_bot_id() {
    let mut server = mockito::Server::new_async().await;
    let classifier = server
        .mock("POST", "/intents")
        .expect(0)
        .create_async()
        .await;
    let (app, _) = app_for(&server, &[], UnmatchedIntentPolicy::NotFound);

    let (status, body) = send(
        app,
        Request::builder()
            .method("POST")
            .uri("/getReply")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0]["message"].as_str().unwrap().contains("botId"));
    classifier.assert_async().await;
}

#[tokio::test]
async fn empty_intents_return_not_found() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_intents(&mut server, json!({ "intents": [] })).await;
    let (app, _) = app_for(&server, &[("Greeting", "Hello!")], UnmatchedIntentPolicy::NotFound);

    let (status, body) = send(
        app,
        get_reply_request(json!({ "botId": "bot-1", "message": "AAAAAAAA---!@AAAKSDKSJFIJI" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "reply": NOT_FOUND_REPLY }));
}

#[tokio::test]
async fn low_confidence_returns_not_found() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_intents(
        &mut server,
        json!({
            "intents": [
                { "name": "A", "confidence": 0.3 },
                { "name": "B", "confidence": 0.2 }
            ]
        }),
    )
    .await;
    let (app, _) = app_for(&server, &[("A", "reply a")], UnmatchedIntentPolicy::NotFound);

    let (_, body) = send(
        app,
        get_reply_request(json!({ "botId": "bot-1", "message": "some_message" })),
    )
    .await;

    assert_eq!(body["reply"], NOT_FOUND_REPLY);
}

#[tokio::test]
async fn selects_highest_confidence_intent() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/intents")
        .match_body(Matcher::Json(json!({ "botId": "bot-1", "message": "hello" })))
        .with_status(200)
        .with_body(
            json!({
                "intents": [
                    { "name": "Farewell", "confidence": 0.7 },
                    { "name": "Greeting", "confidence": 0.9 }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;
    let (app, _) = app_for(
        &server,
        &[("Farewell", "Bye!"), ("Greeting", "Hello!")],
        UnmatchedIntentPolicy::NotFound,
    );

    let (status, body) = send(
        app,
        get_reply_request(json!({ "botId": "bot-1", "message": "hello" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "reply": "Hello!" }));
    mock.assert_async().await;
}

#[tokio::test]
async fn intent_field_alias_is_accepted() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_intents(
        &mut server,
        json!({ "intents": [{ "intent": "some_intent", "confidence": 0.9 }] }),
    )
    .await;
    let (app, _) = app_for(
        &server,
        &[("some_intent", "some_reply")],
        UnmatchedIntentPolicy::NotFound,
    );

    let (_, body) = send(
        app,
        get_reply_request(json!({ "botId": "bot-1", "message": "some_message" })),
    )
    .await;

    assert_eq!(body["reply"], "some_reply");
}

#[tokio::test]
async fn unmatched_intent_returns_not_found_without_writes() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_intents(
        &mut server,
        json!({ "intents": [{ "name": "Greeting", "confidence": 0.9 }] }),
    )
    .await;
    let (app, store) = app_for(&server, &[], UnmatchedIntentPolicy::NotFound);

    let (_, body) = send(
        app,
        get_reply_request(json!({ "botId": "bot-1", "message": "hello" })),
    )
    .await;

    assert_eq!(body["reply"], NOT_FOUND_REPLY);
    assert_eq!(store.count_replies().await.unwrap(), 0);
}

#[tokio::test]
async fn seed_policy_stores_placeholder_for_unmatched_intent() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_intents(
        &mut server,
        json!({ "intents": [{ "name": "Greeting", "confidence": 0.9 }] }),
    )
    .await;
    let (app, store) = app_for(&server, &[], UnmatchedIntentPolicy::Seed);

    let (_, body) = send(
        app,
        get_reply_request(json!({ "botId": "bot-1", "message": "hello" })),
    )
    .await;

    assert_eq!(body["reply"], NOT_FOUND_REPLY);
    assert_eq!(
        store.list_replies().await.unwrap(),
        vec![ReplyRecord::new("Greeting", "")]
    );
}

#[tokio::test]
async fn classifier_failure_returns_generic_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/intents")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;
    let (app, _) = app_for(&server, &[], UnmatchedIntentPolicy::NotFound);

    let (status, body) = send(
        app,
        get_reply_request(json!({ "botId": "bot-1", "message": "hello" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "errors": [{ "message": "Something went wrong" }] })
    );
}

#[tokio::test]
async fn malformed_classifier_payload_returns_generic_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_intents(
        &mut server,
        json!({ "intents": [{ "name": "Greeting" }] }),
    )
    .await;
    let (app, _) = app_for(&server, &[("Greeting", "Hello!")], UnmatchedIntentPolicy::NotFound);

    let (status, _) = send(
        app,
        get_reply_request(json!({ "botId": "bot-1", "message": "hello" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn build_app_seeds_sqlite_store_from_file() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_intents(
        &mut server,
        json!({
            "intents": [
                { "name": "Goodbye", "confidence": 0.55 },
                { "name": "Greeting", "confidence": 0.81 }
            ]
        }),
    )
    .await;

    let config = AppConfig {
        database_url: Some("sqlite::memory:".to_string()),
        seed_file: Some(seed_fixture()),
        classifier: ClassifierConfig::with_base_url(server.url()),
        ..AppConfig::default()
    };
    let app = build_app(config).await.expect("app should build");

    let (status, body) = send(
        app.clone(),
        get_reply_request(json!({ "botId": "bot-1", "message": "hi there" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "Hello :) How can I help you?");

    let (_, health) = send(
        app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(health["store"], "sqlite");
    assert_eq!(health["metrics"]["replies_found_total"], 1);
}

#[tokio::test]
async fn json_sent_as_plain_text_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    let classifier = server
        .mock("POST", "/intents")
        .expect(0)
        .create_async()
        .await;
    let (app, _) = app_for(&server, &[], UnmatchedIntentPolicy::NotFound);

    let (status, body) = send(
        app,
        Request::builder()
            .method("POST")
            .uri("/getReply")
            .header("content-type", "text/plain")
            .body(Body::from(
                json!({ "botId": "bot-1", "message": "hello" }).to_string(),
            ))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "errors": [{ "message": "must have required property 'botId'" }] })
    );
    classifier.assert_async().await;
}

#[tokio::test]
async fn reply_stored_after_placeholder_is_served() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_intents(
        &mut server,
        json!({ "intents": [{ "name": "Greeting", "confidence": 0.9 }] }),
    )
    .await;
    let (app, store) = app_for(&server, &[], UnmatchedIntentPolicy::Seed);

    let (_, first) = send(
        app.clone(),
        get_reply_request(json!({ "botId": "bot-1", "message": "hello" })),
    )
    .await;
    assert_eq!(first["reply"], NOT_FOUND_REPLY);

    store
        .upsert_reply(ReplyRecord::new("Greeting", "Hello!"))
        .await
        .unwrap();

    let (_, second) = send(
        app,
        get_reply_request(json!({ "botId": "bot-1", "message": "hello" })),
    )
    .await;
    assert_eq!(second, json!({ "reply": "Hello!" }));
    assert_eq!(store.count_replies().await.unwrap(), 1);
}
