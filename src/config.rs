use anyhow::{Error, Result, anyhow};
use dotenvy::dotenv;
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    pub gcp_project_id: String,

    pub server_port: u16,

    /// Override for the FCM endpoint, used with emulators and in tests.
    #[serde(default)]
    pub fcm_endpoint: Option<String>,

    /// Override for the Firestore endpoint, used with emulators and in tests.
    #[serde(default)]
    pub firestore_endpoint: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        dotenv().ok();

        let config = envy::from_env::<Self>()
            .map_err(|_| anyhow!("Invalid or missing environmental variable"))?;
        Ok(config)
    }
}
