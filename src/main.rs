use anyhow::{Error, Result};
use bilink_dispatcher::{
    api::run_api_server,
    clients::{auth::Authenticator, fcm::FcmClient, firestore::FirestoreClient, health::HealthChecker},
    config::Config,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    rustls::crypto::ring::default_provider()
        .install_default()
        .ok();

    let config = Config::load()?;

    let auth = Authenticator::workload().await?;
    let gateway = FcmClient::new(&config, auth.clone());
    let store = FirestoreClient::new(&config, auth.clone());
    let health_checker = HealthChecker::new(auth, store.clone());

    run_api_server(config, gateway, store, health_checker).await
}
