//! Retry with backoff for transient remote failures.
//!
//! The policy is deliberately conservative: at most one retry by default, and
//! only for failures that are plausibly transient (timeouts, connection
//! errors, 429 and 5xx responses). Validation, authentication and
//! remote-reported API errors are permanent and returned immediately.

use std::time::Duration;
use tokio::time::sleep;

use crate::api::ApiError;
use crate::config::RetrySettings;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Total attempts including the first call
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent retry
    pub initial_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(500),
        }
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
        }
    }
}

/// Transient failure classes that justify a retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientError {
    /// Connection-level failure
    Network,
    /// Request timed out
    Timeout,
    /// 429 from the remote service
    RateLimited,
    /// 5xx from the remote service
    ServerError,
}

impl TransientError {
    /// Classify an [`ApiError`]; `None` means the error is permanent.
    pub fn from_api_error(err: &ApiError) -> Option<Self> {
        match err {
            ApiError::Network(msg) => {
                if msg.to_lowercase().contains("timed out") || msg.to_lowercase().contains("timeout")
                {
                    Some(TransientError::Timeout)
                } else {
                    Some(TransientError::Network)
                }
            }
            ApiError::Status { status: 429, .. } => Some(TransientError::RateLimited),
            ApiError::Status { status, .. } if *status >= 500 => Some(TransientError::ServerError),
            _ => None,
        }
    }

    /// Minimum delay before retrying this class of failure.
    pub fn recommended_delay(&self) -> Duration {
        match self {
            TransientError::RateLimited => Duration::from_secs(5),
            TransientError::ServerError => Duration::from_secs(1),
            TransientError::Timeout | TransientError::Network => Duration::from_millis(500),
        }
    }
}

/// Execute an async operation, retrying transient failures per `config`.
pub async fn with_retry<T, F, Fut>(config: RetryConfig, mut operation: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ApiError>>,
{
    let mut attempts = 0;
    let mut delay = config.initial_delay;

    loop {
        attempts += 1;

        match operation().await {
            Ok(result) => {
                if attempts > 1 {
                    tracing::info!("operation succeeded on attempt {}", attempts);
                }
                return Ok(result);
            }
            Err(error) => {
                let Some(transient) = TransientError::from_api_error(&error) else {
                    return Err(error);
                };

                if attempts >= config.max_attempts {
                    tracing::warn!("giving up after {} attempts: {}", attempts, error);
                    return Err(error);
                }

                let pause = std::cmp::max(delay, transient.recommended_delay());
                tracing::debug!(
                    "transient failure on attempt {} ({:?}), retrying in {:?}",
                    attempts,
                    transient,
                    pause
                );
                sleep(pause).await;
                delay *= 2;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = {
            let calls = calls.clone();
            with_retry(fast_config(2), move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ApiError>("ok")
                }
            })
        }
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let result: Result<(), ApiError> = {
            let calls = calls.clone();
            with_retry(fast_config(3), move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(ApiError::Api("episode not found".to_string()))
                }
            })
        }
        .await;

        assert!(matches!(result, Err(ApiError::Api(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_error_retried_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = {
            let calls = calls.clone();
            with_retry(fast_config(2), move || {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n == 0 {
                        Err(ApiError::Network("connection reset".to_string()))
                    } else {
                        Ok("recovered")
                    }
                }
            })
        }
        .await;

        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_attempts_exhausted() {
        let calls = Arc::new(AtomicU32::new(0));
        let result: Result<(), ApiError> = {
            let calls = calls.clone();
            with_retry(fast_config(2), move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(ApiError::Network("connection refused".to_string()))
                }
            })
        }
        .await;

        assert!(matches!(result, Err(ApiError::Network(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_transient_classification() {
        assert_eq!(
            TransientError::from_api_error(&ApiError::Network("timed out".into())),
            Some(TransientError::Timeout)
        );
        assert_eq!(
            TransientError::from_api_error(&ApiError::Status {
                status: 429,
                message: "too many requests".into()
            }),
            Some(TransientError::RateLimited)
        );
        assert_eq!(
            TransientError::from_api_error(&ApiError::Status {
                status: 503,
                message: "unavailable".into()
            }),
            Some(TransientError::ServerError)
        );
        assert!(TransientError::from_api_error(&ApiError::Auth("expired".into())).is_none());
        assert!(
            TransientError::from_api_error(&ApiError::InvalidRequest("bad id".into())).is_none()
        );
        assert!(TransientError::from_api_error(&ApiError::Status {
            status: 404,
            message: "not found".into()
        })
        .is_none());
    }
}
