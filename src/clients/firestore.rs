use anyhow::{Error, Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{Value as JsonValue, json};
use tracing::{debug, info, warn};

use crate::{
    clients::auth::{Authenticator, FIRESTORE_SCOPES},
    config::Config,
    models::status::MessageStatus,
};

const DEFAULT_FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com";

pub const MESSAGES_COLLECTION: &str = "fcm_messages";
pub const USERS_COLLECTION: &str = "users";

/// Document store the dispatcher writes its outcome through: the message's
/// status fields plus the owning user's device token list.
#[allow(async_fn_in_trait)]
pub trait MessageStore {
    /// Current status of a message document, `None` when the document is
    /// missing or not yet processed.
    async fn message_status(&self, message_id: &str) -> Result<Option<MessageStatus>, Error>;

    async fn update_message_status(
        &self,
        message_id: &str,
        status: MessageStatus,
        detail: &str,
    ) -> Result<(), Error>;

    /// Device tokens of a user document, `None` when the user does not exist.
    /// A user without a deviceTokens field reads as an empty list.
    async fn user_device_tokens(&self, user_id: &str) -> Result<Option<Vec<String>>, Error>;

    async fn replace_user_device_tokens(
        &self,
        user_id: &str,
        tokens: &[String],
    ) -> Result<(), Error>;
}

#[derive(Clone)]
pub struct FirestoreClient {
    http_client: Client,
    endpoint: String,
    project_id: String,
    auth: Authenticator,
}

impl FirestoreClient {
    pub fn new(config: &Config, auth: Authenticator) -> Self {
        let endpoint = config
            .firestore_endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_FIRESTORE_ENDPOINT.to_string());

        info!(project_id = %config.gcp_project_id, "Firestore client initialized");

        Self {
            http_client: Client::new(),
            endpoint,
            project_id: config.gcp_project_id.clone(),
            auth,
        }
    }

    fn document_url(&self, collection: &str, document_id: &str) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}/{}",
            self.endpoint, self.project_id, collection, document_id
        )
    }

    async fn get_document(
        &self,
        collection: &str,
        document_id: &str,
    ) -> Result<Option<JsonValue>, Error> {
        let bearer_token = self.auth.bearer_token(FIRESTORE_SCOPES).await?;

        let response = self
            .http_client
            .get(self.document_url(collection, document_id))
            .bearer_auth(&bearer_token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Firestore read failed with status {}: {}", status, body));
        }

        Ok(Some(response.json::<JsonValue>().await?))
    }

    async fn patch_document(
        &self,
        collection: &str,
        document_id: &str,
        fields: JsonValue,
        field_paths: &[&str],
    ) -> Result<(), Error> {
        let bearer_token = self.auth.bearer_token(FIRESTORE_SCOPES).await?;

        let mask: Vec<(&str, &str)> = field_paths
            .iter()
            .map(|path| ("updateMask.fieldPaths", *path))
            .collect();

        let response = self
            .http_client
            .patch(self.document_url(collection, document_id))
            .query(&mask)
            .bearer_auth(&bearer_token)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Firestore write failed with status {}: {}", status, body));
        }

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), Error> {
        let bearer_token = self.auth.bearer_token(FIRESTORE_SCOPES).await?;

        let url = format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}",
            self.endpoint, self.project_id, MESSAGES_COLLECTION
        );

        let response = self
            .http_client
            .get(&url)
            .query(&[("pageSize", "1")])
            .bearer_auth(&bearer_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Firestore health check failed with status {}",
                response.status()
            ));
        }

        Ok(())
    }
}

impl MessageStore for FirestoreClient {
    async fn message_status(&self, message_id: &str) -> Result<Option<MessageStatus>, Error> {
        let Some(document) = self.get_document(MESSAGES_COLLECTION, message_id).await? else {
            return Ok(None);
        };

        let Some(value) = string_field(&document, "status") else {
            return Ok(None);
        };

        match MessageStatus::parse(value) {
            Some(status) => Ok(Some(status)),
            None => {
                warn!(message_id, status = %value, "Unknown status value on message document");
                Ok(None)
            }
        }
    }

    async fn update_message_status(
        &self,
        message_id: &str,
        status: MessageStatus,
        detail: &str,
    ) -> Result<(), Error> {
        let fields = json!({
            "status": string_value(&status.to_string()),
            "statusMessage": string_value(detail),
            "processedAt": timestamp_value(Utc::now()),
        });

        self.patch_document(
            MESSAGES_COLLECTION,
            message_id,
            fields,
            &["status", "statusMessage", "processedAt"],
        )
        .await?;

        debug!(message_id, status = %status, "Message status updated");

        Ok(())
    }

    async fn user_device_tokens(&self, user_id: &str) -> Result<Option<Vec<String>>, Error> {
        let Some(document) = self.get_document(USERS_COLLECTION, user_id).await? else {
            return Ok(None);
        };

        Ok(Some(
            string_array_field(&document, "deviceTokens").unwrap_or_default(),
        ))
    }

    async fn replace_user_device_tokens(
        &self,
        user_id: &str,
        tokens: &[String],
    ) -> Result<(), Error> {
        let fields = json!({
            "deviceTokens": string_array_value(tokens),
            "tokensUpdatedAt": timestamp_value(Utc::now()),
        });

        self.patch_document(
            USERS_COLLECTION,
            user_id,
            fields,
            &["deviceTokens", "tokensUpdatedAt"],
        )
        .await?;

        debug!(user_id, token_count = tokens.len(), "User device tokens replaced");

        Ok(())
    }
}

// Firestore's typed value JSON for the few field shapes this service writes.

pub fn string_value(value: &str) -> JsonValue {
    json!({ "stringValue": value })
}

pub fn timestamp_value(timestamp: DateTime<Utc>) -> JsonValue {
    json!({ "timestampValue": timestamp.to_rfc3339_opts(SecondsFormat::Micros, true) })
}

pub fn string_array_value(items: &[String]) -> JsonValue {
    let values: Vec<JsonValue> = items.iter().map(|item| string_value(item)).collect();
    json!({ "arrayValue": { "values": values } })
}

pub fn string_field<'a>(document: &'a JsonValue, field: &str) -> Option<&'a str> {
    document
        .get("fields")?
        .get(field)?
        .get("stringValue")?
        .as_str()
}

pub fn string_array_field(document: &JsonValue, field: &str) -> Option<Vec<String>> {
    let values = document
        .get("fields")?
        .get(field)?
        .get("arrayValue")?
        .get("values")?
        .as_array()?;

    Some(
        values
            .iter()
            .filter_map(|value| value.get("stringValue").and_then(JsonValue::as_str))
            .map(str::to_string)
            .collect(),
    )
}
