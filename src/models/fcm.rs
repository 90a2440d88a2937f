use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::message::NotificationContent;

#[derive(Debug, Clone, Serialize)]
pub struct FcmRequest {
    pub message: FcmMessage,
}

#[derive(Debug, Clone, Serialize)]
pub struct FcmMessage {
    pub token: String,
    pub notification: FcmNotification,

    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, String>,

    pub android: AndroidConfig,
    pub apns: ApnsConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct FcmNotification {
    pub title: String,
    pub body: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<&NotificationContent> for FcmNotification {
    fn from(content: &NotificationContent) -> Self {
        Self {
            title: content.title.clone(),
            body: content.body.clone(),
            image: content.image.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidConfig {
    pub priority: String,
    pub notification: AndroidNotification,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidNotification {
    pub channel_id: String,
    pub sound: String,
    pub default_sound: bool,
    pub default_vibrate_timings: bool,
    pub default_light_settings: bool,
}

impl AndroidConfig {
    /// Delivery hints are fixed, not configurable.
    pub fn high_importance() -> Self {
        Self {
            priority: "HIGH".to_string(),
            notification: AndroidNotification {
                channel_id: "high_importance_channel".to_string(),
                sound: "default".to_string(),
                default_sound: true,
                default_vibrate_timings: true,
                default_light_settings: true,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApnsConfig {
    pub payload: ApnsPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApnsPayload {
    pub aps: Aps,
}

#[derive(Debug, Clone, Serialize)]
pub struct Aps {
    pub sound: String,
    pub badge: u32,

    #[serde(rename = "content-available")]
    pub content_available: u8,
}

impl ApnsConfig {
    pub fn default_alert() -> Self {
        Self {
            payload: ApnsPayload {
                aps: Aps {
                    sound: "default".to_string(),
                    badge: 1,
                    content_available: 1,
                },
            },
        }
    }
}

/// Success body of a v1 send, `{"name": "projects/.../messages/..."}`.
#[derive(Debug, Clone, Deserialize)]
pub struct FcmSendResponse {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FcmErrorBody {
    pub error: FcmErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FcmErrorDetail {
    pub message: String,

    #[serde(default)]
    pub status: Option<String>,
}

/// Per-token result, index-aligned with the tokens that were sent.
#[derive(Debug, Clone)]
pub struct SendResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MulticastOutcome {
    pub success_count: usize,
    pub failure_count: usize,
    pub responses: Vec<SendResult>,
}

impl MulticastOutcome {
    pub fn from_responses(responses: Vec<SendResult>) -> Self {
        let success_count = responses.iter().filter(|r| r.success).count();
        let failure_count = responses.len() - success_count;

        Self {
            success_count,
            failure_count,
            responses,
        }
    }

    /// Tokens the gateway rejected, matched to the input order by index.
    pub fn failed_tokens(&self, tokens: &[String]) -> Vec<String> {
        self.responses
            .iter()
            .zip(tokens)
            .filter(|(result, _)| !result.success)
            .map(|(_, token)| token.clone())
            .collect()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} successful, {} failed",
            self.success_count, self.failure_count
        )
    }
}
