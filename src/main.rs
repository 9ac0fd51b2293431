use billbuster::{
    BillbusterError, BillbusterService, Config, InMemoryNotifier, InMemoryStorage, build_router,
    infrastructure::{
        google::{
            self,
            auth::{DATASTORE_SCOPE, MESSAGING_SCOPE, ServiceAccountAuth},
        },
        notifications::{Notifier, fcm::FcmNotifier},
        storage::{Storage, firestore::FirestoreStorage},
    },
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    init_tracing(&config);

    let service = Arc::new(build_service(&config)?);
    let app = build_router(service, &config)?;

    let addr = SocketAddr::new(config.host, config.port);
    info!(environment = ?config.environment, "Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

// RUST_LOG wins over LOG_LEVEL; production logs are JSON.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.is_production() {
        builder.json().with_target(false).init();
    } else {
        builder.init();
    }
}

fn build_service(config: &Config) -> Result<BillbusterService, BillbusterError> {
    let (storage, notifier): (Arc<dyn Storage>, Arc<dyn Notifier>) = match &config.firebase {
        Some(credentials) => {
            let client = google::http_client(config.request_timeout)?;
            let auth = Arc::new(ServiceAccountAuth::new(
                client.clone(),
                credentials.clone(),
                &[DATASTORE_SCOPE, MESSAGING_SCOPE],
            ));
            info!(project_id = %auth.project_id(), "Using Firestore storage and FCM notifications");
            (
                Arc::new(FirestoreStorage::new(client.clone(), auth.clone())),
                Arc::new(FcmNotifier::new(client, auth)),
            )
        }
        None => {
            warn!("Firebase credentials not configured; data is kept in memory and lost on restart");
            (Arc::new(InMemoryStorage::new()), Arc::new(InMemoryNotifier::new()))
        }
    };
    Ok(BillbusterService::new(storage, notifier, config.currency_decimals))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
