pub mod auth;

use crate::core::errors::BillbusterError;
use reqwest::Client;
use std::time::Duration;

/// Shared HTTP client for the Google REST backends.
pub fn http_client(timeout: Duration) -> Result<Client, BillbusterError> {
    Client::builder()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| BillbusterError::InternalServerError(format!("Failed to build HTTP client: {}", e)))
}
