//! Mock tracker for testing tool handlers without network access.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::api::{ApiError, TrackerApi, WatchStatus};

/// A mock [`TrackerApi`] that records every call and returns predefined
/// responses.
///
/// Individual episode ids can be made to fail, which handler tests use to
/// verify that batch operations keep going past a failing item.
#[derive(Debug, Default)]
pub struct MockTracker {
    calls: Mutex<Vec<String>>,
    responses: Mutex<HashMap<String, Value>>,
    failing_episodes: Mutex<HashSet<i64>>,
}

impl MockTracker {
    /// Create a new mock tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response returned for an operation (e.g. `"profile"`).
    pub fn set_response(&self, operation: &str, response: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(operation.to_string(), response);
    }

    /// Make `check_episode`/`uncheck_episode` fail for this id.
    pub fn fail_episode(&self, episode_id: i64) {
        self.failing_episodes.lock().unwrap().insert(episode_id);
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of remote calls made.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, operation: &str, call: String) -> Value {
        self.calls.lock().unwrap().push(call);
        self.responses
            .lock()
            .unwrap()
            .get(operation)
            .cloned()
            .unwrap_or_else(|| json!({ "ok": true }))
    }
}

#[async_trait]
impl TrackerApi for MockTracker {
    async fn profile(&self) -> Result<Value, ApiError> {
        Ok(self.record("profile", "profile".to_string()))
    }

    async fn search_shows(
        &self,
        query: &str,
        year: Option<i64>,
        page: i64,
    ) -> Result<Value, ApiError> {
        Ok(self.record(
            "search_shows",
            format!("search_shows({}, {:?}, {})", query, year, page),
        ))
    }

    async fn my_shows(&self) -> Result<Value, ApiError> {
        Ok(self.record("my_shows", "my_shows".to_string()))
    }

    async fn watched_movies(&self, page: i64) -> Result<Value, ApiError> {
        Ok(self.record("watched_movies", format!("watched_movies({})", page)))
    }

    async fn show_by_id(&self, show_id: i64) -> Result<Value, ApiError> {
        Ok(self.record("show_by_id", format!("show_by_id({})", show_id)))
    }

    async fn viewed_episodes(&self, show_id: i64) -> Result<Value, ApiError> {
        Ok(self.record("viewed_episodes", format!("viewed_episodes({})", show_id)))
    }

    async fn check_episode(&self, episode_id: i64) -> Result<Value, ApiError> {
        if self.failing_episodes.lock().unwrap().contains(&episode_id) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("check_episode({})", episode_id));
            return Err(ApiError::Api(format!("episode {} not found", episode_id)));
        }
        Ok(self.record("check_episode", format!("check_episode({})", episode_id)))
    }

    async fn uncheck_episode(&self, episode_id: i64) -> Result<Value, ApiError> {
        if self.failing_episodes.lock().unwrap().contains(&episode_id) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("uncheck_episode({})", episode_id));
            return Err(ApiError::Api(format!("episode {} not found", episode_id)));
        }
        Ok(self.record(
            "uncheck_episode",
            format!("uncheck_episode({})", episode_id),
        ))
    }

    async fn set_show_status(&self, show_id: i64, status: WatchStatus) -> Result<Value, ApiError> {
        Ok(self.record(
            "set_show_status",
            format!("set_show_status({}, {})", show_id, status.as_remote()),
        ))
    }

    async fn calendar_episodes(&self) -> Result<Value, ApiError> {
        Ok(self.record("calendar_episodes", "calendar_episodes".to_string()))
    }

    async fn recommendations(&self) -> Result<Value, ApiError> {
        Ok(self.record("recommendations", "recommendations".to_string()))
    }
}
