//! Client for the myshows.me JSON-RPC API.
//!
//! The remote protocol has two endpoints: a session endpoint that exchanges
//! credentials for a bearer token, and a single RPC endpoint that carries every
//! other operation as a one-element JSON-RPC 2.0 batch. This module defines the
//! [`TrackerApi`] trait that tool handlers call through, so handlers can be
//! tested against [`mock::MockTracker`] without network access, plus the real
//! [`MyShowsClient`] implementation.

mod client;
pub mod mock;

pub use client::MyShowsClient;
pub use mock::MockTracker;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Errors that can occur when talking to the tracking service
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Credentials rejected at login, or the session expired mid-flight
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Malformed tool arguments; no remote call was made
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network or transport error
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status from the remote service
    #[error("remote returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Error reported inside the JSON-RPC envelope
    #[error("API error: {0}")]
    Api(String),

    /// Unexpected payload shape
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(format!("JSON: {}", err))
    }
}

/// Watch status accepted by `set_movie_watch_status`.
///
/// The remote service has no distinct "watched" state for movies; `watching`
/// is the watched state, so `Watched` maps onto it on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchStatus {
    Watching,
    Watched,
    Later,
    Cancelled,
    Remove,
}

impl WatchStatus {
    /// All accepted input strings, in schema order.
    pub const ALL: [&'static str; 5] = ["watching", "watched", "later", "cancelled", "remove"];

    /// The string sent to the remote service.
    pub fn as_remote(&self) -> &'static str {
        match self {
            WatchStatus::Watching | WatchStatus::Watched => "watching",
            WatchStatus::Later => "later",
            WatchStatus::Cancelled => "cancelled",
            WatchStatus::Remove => "remove",
        }
    }
}

impl std::str::FromStr for WatchStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "watching" => Ok(WatchStatus::Watching),
            "watched" => Ok(WatchStatus::Watched),
            "later" => Ok(WatchStatus::Later),
            "cancelled" => Ok(WatchStatus::Cancelled),
            "remove" => Ok(WatchStatus::Remove),
            other => Err(ApiError::InvalidRequest(format!(
                "unknown status '{}', expected one of: {}",
                other,
                WatchStatus::ALL.join(", ")
            ))),
        }
    }
}

/// The fixed set of remote operations the tool catalog forwards to.
///
/// One authenticated session backs every call; implementations take `&self`
/// and are shared across concurrent tool invocations behind an `Arc`.
#[async_trait]
pub trait TrackerApi: Send + Sync + std::fmt::Debug {
    /// Fetch the current user's profile.
    async fn profile(&self) -> Result<Value, ApiError>;

    /// Search the show/movie catalog by title, optionally filtered by year.
    async fn search_shows(
        &self,
        query: &str,
        year: Option<i64>,
        page: i64,
    ) -> Result<Value, ApiError>;

    /// List the shows in the user's profile with their watch status.
    async fn my_shows(&self) -> Result<Value, ApiError>;

    /// List watched movies, paginated, most recently watched first.
    async fn watched_movies(&self, page: i64) -> Result<Value, ApiError>;

    /// Fetch one show or movie by id, with episodes and season counts.
    async fn show_by_id(&self, show_id: i64) -> Result<Value, ApiError>;

    /// List episodes of a show the user has marked watched.
    async fn viewed_episodes(&self, show_id: i64) -> Result<Value, ApiError>;

    /// Mark a single episode watched.
    async fn check_episode(&self, episode_id: i64) -> Result<Value, ApiError>;

    /// Unmark a single episode.
    async fn uncheck_episode(&self, episode_id: i64) -> Result<Value, ApiError>;

    /// Set the watch status of a movie.
    async fn set_show_status(&self, show_id: i64, status: WatchStatus) -> Result<Value, ApiError>;

    /// List upcoming episodes from the airing calendar.
    async fn calendar_episodes(&self) -> Result<Value, ApiError>;

    /// List recommended shows for the user.
    async fn recommendations(&self) -> Result<Value, ApiError>;
}

/// One JSON-RPC 2.0 request. The remote endpoint expects a one-element batch.
#[derive(Debug, Serialize)]
pub(crate) struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: Value,
    pub id: u32,
}

impl<'a> RpcRequest<'a> {
    pub fn new(method: &'a str, id: u32, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
            id,
        }
    }
}

/// One JSON-RPC 2.0 response element.
#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
}
