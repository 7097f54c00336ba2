use crate::config::BackendConfig;
use reqwest::Client;
use std::time::Duration;

pub fn build_http_client(config: &BackendConfig) -> Client {
    build_http_client_with_timeouts(config.timeout_secs, config.connect_timeout_secs)
}

pub fn build_http_client_with_timeouts(timeout_secs: u64, connect_timeout_secs: u64) -> Client {
    // Per-read timeout only; streamed replies have no total deadline.
    Client::builder()
        .read_timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .unwrap_or_else(|error| {
            tracing::warn!("Falling back to default HTTP client: {error}");
            Client::new()
        })
}
