use std::sync::Arc;

use anyhow::{Error, Result};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{
    clients::{fcm::FcmClient, firestore::FirestoreClient, health::HealthChecker},
    config::Config,
    models::{health::HealthStatus, message::DocumentCreatedEvent},
    utils::process_message,
};

pub struct AppState {
    gateway: FcmClient,
    store: FirestoreClient,
    health_checker: HealthChecker,
}

impl AppState {
    pub fn new(gateway: FcmClient, store: FirestoreClient, health_checker: HealthChecker) -> Self {
        Self {
            gateway,
            store,
            health_checker,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/events/messages", post(message_created))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_api_server(
    config: Config,
    gateway: FcmClient,
    store: FirestoreClient,
    health_checker: HealthChecker,
) -> Result<(), Error> {
    let app = router(Arc::new(AppState::new(gateway, store, health_checker)));

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = TcpListener::bind(&addr).await?;

    info!(address = %addr, "Dispatcher server started");

    axum::serve(listener, app).await?;

    Ok(())
}

/// The trigger system expects a void response regardless of outcome, so this
/// always answers 204; dispatch failures land in the message's status fields
/// and the logs.
async fn message_created(
    State(state): State<Arc<AppState>>,
    Json(event): Json<DocumentCreatedEvent>,
) -> StatusCode {
    if let Err(e) = process_message(
        &event.message_id,
        &event.message,
        &state.gateway,
        &state.store,
    )
    .await
    {
        error!(
            message_id = %event.message_id,
            error = %e,
            "Dispatch failed before the outcome could be recorded"
        );
    }

    StatusCode::NO_CONTENT
}

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_checker.check_all().await;

    let status_code = match health.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}
