use std::{collections::HashMap, time::Instant};

use chrono::Utc;
use tracing::debug;

use crate::{
    clients::{
        auth::{Authenticator, FCM_SCOPES},
        firestore::FirestoreClient,
    },
    models::health::{HealthCheckResponse, HealthStatus, ServiceHealth},
};

pub struct HealthChecker {
    auth: Authenticator,
    store: FirestoreClient,
}

impl HealthChecker {
    pub fn new(auth: Authenticator, store: FirestoreClient) -> Self {
        Self { auth, store }
    }

    pub async fn check_all(&self) -> HealthCheckResponse {
        let mut checks = HashMap::new();

        checks.insert("gcp_auth".to_string(), self.check_credentials().await);
        checks.insert("firestore".to_string(), self.check_firestore().await);

        let healthy = checks
            .values()
            .filter(|check| check.status == HealthStatus::Healthy)
            .count();

        let status = if healthy == checks.len() {
            HealthStatus::Healthy
        } else if healthy == 0 {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Degraded
        };

        debug!(?status, "Health check completed");

        HealthCheckResponse {
            status,
            timestamp: Utc::now(),
            checks,
        }
    }

    async fn check_credentials(&self) -> ServiceHealth {
        let start = Instant::now();

        match self.auth.bearer_token(FCM_SCOPES).await {
            Ok(_) => ServiceHealth::healthy(start.elapsed().as_millis() as u64),
            Err(e) => ServiceHealth::unhealthy(e.to_string()),
        }
    }

    async fn check_firestore(&self) -> ServiceHealth {
        let start = Instant::now();

        match self.store.health_check().await {
            Ok(_) => ServiceHealth::healthy(start.elapsed().as_millis() as u64),
            Err(e) => ServiceHealth::unhealthy(e.to_string()),
        }
    }
}
