//! Shared utilities: HTTP client construction and retry with transient-error
//! classification.

mod http;
mod retry;

pub use http::build_http_client;
pub use retry::{with_retry, RetryConfig, TransientError};
