use std::sync::Arc;

use anyhow::{Error, Result};
use gcp_auth::TokenProvider;
use tracing::info;

pub const FCM_SCOPES: &[&str] = &["https://www.googleapis.com/auth/firebase.messaging"];
pub const FIRESTORE_SCOPES: &[&str] = &["https://www.googleapis.com/auth/datastore"];

/// Source of bearer tokens for the Google APIs. The service runs on ambient
/// application-default credentials; tests substitute a fixed token so the
/// HTTP surface can be exercised against a mock server.
#[derive(Clone)]
pub enum Authenticator {
    Gcp(Arc<dyn TokenProvider>),
    Fixed(String),
}

impl Authenticator {
    pub async fn workload() -> Result<Self, Error> {
        let provider = gcp_auth::provider().await?;

        info!("Application-default credentials resolved");

        Ok(Self::Gcp(provider))
    }

    pub fn fixed(token: impl Into<String>) -> Self {
        Self::Fixed(token.into())
    }

    pub async fn bearer_token(&self, scopes: &[&str]) -> Result<String, Error> {
        match self {
            Self::Gcp(provider) => {
                let token = provider.token(scopes).await?;
                Ok(token.as_str().to_string())
            }
            Self::Fixed(token) => Ok(token.clone()),
        }
    }
}
