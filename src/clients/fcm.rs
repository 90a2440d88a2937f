use std::collections::HashMap;

use anyhow::{Error, Result};
use reqwest::Client;
use tracing::{debug, info};

use crate::{
    clients::auth::{Authenticator, FCM_SCOPES},
    config::Config,
    models::{
        fcm::{
            AndroidConfig, ApnsConfig, FcmErrorBody, FcmMessage, FcmNotification, FcmRequest,
            FcmSendResponse, MulticastOutcome, SendResult,
        },
        message::NotificationContent,
    },
};

const DEFAULT_FCM_ENDPOINT: &str = "https://fcm.googleapis.com";

/// One logical multicast send per notification request. A per-token rejection
/// is a per-recipient failure in the outcome; only a failure that prevents
/// the send as a whole (credentials) surfaces as an error.
#[allow(async_fn_in_trait)]
pub trait PushGateway {
    async fn send_multicast(
        &self,
        tokens: &[String],
        notification: &NotificationContent,
        data: &HashMap<String, String>,
    ) -> Result<MulticastOutcome, Error>;
}

#[derive(Clone)]
pub struct FcmClient {
    http_client: Client,
    endpoint: String,
    project_id: String,
    auth: Authenticator,
}

impl FcmClient {
    pub fn new(config: &Config, auth: Authenticator) -> Self {
        let endpoint = config
            .fcm_endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_FCM_ENDPOINT.to_string());

        info!(project_id = %config.gcp_project_id, "FCM client initialized");

        Self {
            http_client: Client::new(),
            endpoint,
            project_id: config.gcp_project_id.clone(),
            auth,
        }
    }

    fn build_message(
        &self,
        token: &str,
        notification: &NotificationContent,
        data: &HashMap<String, String>,
    ) -> FcmMessage {
        FcmMessage {
            token: token.to_string(),
            notification: FcmNotification::from(notification),
            data: data.clone(),
            android: AndroidConfig::high_importance(),
            apns: ApnsConfig::default_alert(),
        }
    }

    async fn send_one(&self, bearer_token: &str, message: FcmMessage) -> SendResult {
        let token = message.token.clone();
        let url = format!(
            "{}/v1/projects/{}/messages:send",
            self.endpoint, self.project_id
        );

        debug!(device_token = %token, "Sending FCM push notification");

        let response = match self
            .http_client
            .post(&url)
            .bearer_auth(bearer_token)
            .json(&FcmRequest { message })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return SendResult {
                    success: false,
                    message_id: None,
                    error: Some(e.to_string()),
                };
            }
        };

        if response.status().is_success() {
            let message_id = response
                .json::<FcmSendResponse>()
                .await
                .map(|body| body.name)
                .ok();

            SendResult {
                success: true,
                message_id,
                error: None,
            }
        } else {
            let status = response.status();
            let error = match response.json::<FcmErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => format!("FCM request failed with status {}", status),
            };

            debug!(device_token = %token, error = %error, "FCM rejected token");

            SendResult {
                success: false,
                message_id: None,
                error: Some(error),
            }
        }
    }
}

impl PushGateway for FcmClient {
    async fn send_multicast(
        &self,
        tokens: &[String],
        notification: &NotificationContent,
        data: &HashMap<String, String>,
    ) -> Result<MulticastOutcome, Error> {
        let bearer_token = self.auth.bearer_token(FCM_SCOPES).await?;

        let sends = tokens
            .iter()
            .map(|token| self.send_one(&bearer_token, self.build_message(token, notification, data)));

        // join_all preserves input order, keeping results index-aligned
        // with the token list.
        let responses = futures_util::future::join_all(sends).await;
        let outcome = MulticastOutcome::from_responses(responses);

        info!(
            success = outcome.success_count,
            failed = outcome.failure_count,
            "FCM multicast send completed"
        );

        Ok(outcome)
    }
}
