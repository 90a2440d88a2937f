use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use bilink_dispatcher::{
    api::{AppState, router},
    clients::{
        auth::Authenticator, fcm::FcmClient, firestore::FirestoreClient, health::HealthChecker,
    },
    config::Config,
};
use serde_json::{Value as JsonValue, json};
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn app_state(fcm_endpoint: &str, firestore_endpoint: &str) -> Arc<AppState> {
    let config = Config {
        gcp_project_id: "test-project".to_string(),
        server_port: 0,
        fcm_endpoint: Some(fcm_endpoint.to_string()),
        firestore_endpoint: Some(firestore_endpoint.to_string()),
    };

    let auth = Authenticator::fixed("test-token");
    let gateway = FcmClient::new(&config, auth.clone());
    let store = FirestoreClient::new(&config, auth.clone());
    let health_checker = HealthChecker::new(auth, store.clone());

    Arc::new(AppState::new(gateway, store, health_checker))
}

fn trigger_request(body: JsonValue) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/events/messages")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn event(tokens: JsonValue) -> JsonValue {
    json!({
        "messageId": "msg_1",
        "message": {
            "tokens": tokens,
            "notification": {
                "title": "New message",
                "body": "You have a new message"
            },
            "userId": "user_1"
        }
    })
}

/// Test: A delivered message answers 204 and writes its status
#[tokio::test]
async fn test_trigger_answers_204_on_success() -> Result<()> {
    let fcm = MockServer::start().await;
    let firestore = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/test-project/messages:send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/test-project/messages/0:1"
        })))
        .expect(1)
        .mount(&fcm)
        .await;

    Mock::given(method("PATCH"))
        .and(path(
            "/v1/projects/test-project/databases/(default)/documents/fcm_messages/msg_1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&firestore)
        .await;

    let app = router(app_state(&fcm.uri(), &firestore.uri()));

    let response = app
        .oneshot(trigger_request(event(json!(["token_a"]))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    Ok(())
}

/// Test: The trigger answers 204 even when the status write fails
#[tokio::test]
async fn test_trigger_answers_204_when_status_write_fails() -> Result<()> {
    let fcm = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/test-project/messages:send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/test-project/messages/0:1"
        })))
        .mount(&fcm)
        .await;

    // Unreachable store: the guard read fails, the send goes out, the
    // status write fails. The trigger still gets its void answer.
    let app = router(app_state(&fcm.uri(), "http://127.0.0.1:1"));

    let response = app
        .oneshot(trigger_request(event(json!(["token_a"]))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    Ok(())
}

/// Test: A document without a tokens field is accepted and marked failed
#[tokio::test]
async fn test_trigger_accepts_document_without_tokens_field() -> Result<()> {
    let fcm = MockServer::start().await;
    let firestore = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(
            "/v1/projects/test-project/databases/(default)/documents/fcm_messages/msg_1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&firestore)
        .await;

    let app = router(app_state(&fcm.uri(), &firestore.uri()));

    let body = json!({
        "messageId": "msg_1",
        "message": {
            "notification": {
                "title": "New message",
                "body": "You have a new message"
            },
            "userId": "user_1"
        }
    });

    let response = app.oneshot(trigger_request(body)).await.unwrap();

    assert_eq!(
        response.status(),
        StatusCode::NO_CONTENT,
        "A malformed document must not bounce at the JSON boundary"
    );

    assert_eq!(fcm.received_requests().await.unwrap().len(), 0);

    let requests = firestore.received_requests().await.unwrap();
    let patch = requests
        .iter()
        .find(|request| request.method.as_str() == "PATCH")
        .expect("A status write must still happen");

    let patch_body: JsonValue = serde_json::from_slice(&patch.body)?;
    assert_eq!(patch_body["fields"]["status"]["stringValue"], "failed");
    assert_eq!(
        patch_body["fields"]["statusMessage"]["stringValue"],
        "No valid tokens provided"
    );

    Ok(())
}
