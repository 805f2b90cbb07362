//! HTTP client construction.

use reqwest::Client;
use std::time::Duration;

use crate::config::HttpSettings;

/// Build the shared HTTP client with explicit timeouts.
///
/// The remote API imposes no transport policy of its own, so the request and
/// connect timeouts here are the only bound on a blocked call.
pub fn build_http_client(settings: &HttpSettings) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .timeout(Duration::from_secs(settings.request_timeout_secs))
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
}
