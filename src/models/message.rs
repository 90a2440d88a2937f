use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A pending notification document from the fcm_messages collection.
/// Created by the app backend; the dispatcher only ever writes the status
/// fields back, so they are not part of this payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    /// Missing on malformed documents; an absent list reads as empty and is
    /// rejected by validation with a status write, never at the JSON boundary.
    #[serde(default)]
    pub tokens: Vec<String>,
    pub notification: NotificationContent,

    #[serde(default)]
    pub data: HashMap<String, String>,

    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Trigger payload delivered once per created fcm_messages document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentCreatedEvent {
    pub message_id: String,
    pub message: NotificationRequest,
}
