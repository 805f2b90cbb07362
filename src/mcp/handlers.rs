//! Tool handlers forwarding to the authenticated tracker session.
//!
//! Each handler validates its arguments locally and performs exactly one
//! remote call per item; a validation failure never reaches the network. The
//! shared session is injected as `Arc<dyn TrackerApi>` so handlers can be
//! tested against a mock.

use std::sync::Arc;

use serde_json::{json, Value};

use super::tools::ToolHandler;
use crate::api::{TrackerApi, WatchStatus};

fn require_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, String> {
    args.get(key)
        .ok_or_else(|| format!("Missing '{}' parameter", key))?
        .as_str()
        .ok_or_else(|| format!("Parameter '{}' must be a string", key))
}

fn require_i64(args: &Value, key: &str) -> Result<i64, String> {
    args.get(key)
        .ok_or_else(|| format!("Missing '{}' parameter", key))?
        .as_i64()
        .ok_or_else(|| format!("Parameter '{}' must be an integer", key))
}

fn optional_i64(args: &Value, key: &str) -> Result<Option<i64>, String> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| format!("Parameter '{}' must be an integer", key)),
    }
}

fn page_arg(args: &Value) -> Result<i64, String> {
    let page = optional_i64(args, "page")?.unwrap_or(0);
    if page < 0 {
        return Err("Parameter 'page' must not be negative".to_string());
    }
    Ok(page)
}

/// Extract `episode_id` as a list of ids; a bare integer is a one-item batch.
fn episode_ids(args: &Value) -> Result<Vec<i64>, String> {
    let value = args
        .get("episode_id")
        .ok_or("Missing 'episode_id' parameter")?;

    match value {
        Value::Number(_) => Ok(vec![value
            .as_i64()
            .ok_or("Parameter 'episode_id' must be an integer")?]),
        Value::Array(items) => {
            if items.is_empty() {
                return Err("Parameter 'episode_id' must not be an empty list".to_string());
            }
            items
                .iter()
                .map(|item| {
                    item.as_i64()
                        .ok_or_else(|| "Parameter 'episode_id' must contain only integers".to_string())
                })
                .collect()
        }
        _ => Err("Parameter 'episode_id' must be an integer or a list of integers".to_string()),
    }
}

/// Apply a single-episode operation to every id independently.
///
/// Ids are processed sequentially; a failure is recorded in that id's outcome
/// and the remaining ids are still attempted. Nothing is rolled back.
async fn apply_to_episodes<F, Fut>(ids: Vec<i64>, mut op: F) -> Value
where
    F: FnMut(i64) -> Fut,
    Fut: std::future::Future<Output = Result<Value, crate::api::ApiError>>,
{
    let mut outcomes = Vec::with_capacity(ids.len());
    for id in ids {
        match op(id).await {
            Ok(result) => outcomes.push(json!({ "id": id, "ok": true, "result": result })),
            Err(e) => {
                tracing::warn!(episode_id = id, error = %e, "episode update failed");
                outcomes.push(json!({ "id": id, "ok": false, "error": e.to_string() }));
            }
        }
    }
    Value::Array(outcomes)
}

/// Handler for fetching the user's profile
#[derive(Debug)]
pub struct GetProfileHandler {
    pub api: Arc<dyn TrackerApi>,
}

#[async_trait::async_trait]
impl ToolHandler for GetProfileHandler {
    async fn execute(&self, _args: Value) -> Result<Value, String> {
        self.api.profile().await.map_err(|e| e.to_string())
    }
}

/// Handler for catalog search
#[derive(Debug)]
pub struct SearchShowsHandler {
    pub api: Arc<dyn TrackerApi>,
}

#[async_trait::async_trait]
impl ToolHandler for SearchShowsHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let query = require_str(&args, "query")?;
        if query.trim().is_empty() {
            return Err("Parameter 'query' must not be empty".to_string());
        }
        let year = optional_i64(&args, "year")?;
        let page = page_arg(&args)?;

        self.api
            .search_shows(query, year, page)
            .await
            .map_err(|e| e.to_string())
    }
}

/// Handler for listing the profile's shows
#[derive(Debug)]
pub struct GetMyShowsHandler {
    pub api: Arc<dyn TrackerApi>,
}

#[async_trait::async_trait]
impl ToolHandler for GetMyShowsHandler {
    async fn execute(&self, _args: Value) -> Result<Value, String> {
        self.api.my_shows().await.map_err(|e| e.to_string())
    }
}

/// Handler for listing watched movies
#[derive(Debug)]
pub struct WatchedMoviesHandler {
    pub api: Arc<dyn TrackerApi>,
}

#[async_trait::async_trait]
impl ToolHandler for WatchedMoviesHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let page = page_arg(&args)?;
        self.api
            .watched_movies(page)
            .await
            .map_err(|e| e.to_string())
    }
}

/// Handler for fetching one show/movie by id
#[derive(Debug)]
pub struct GetShowByIdHandler {
    pub api: Arc<dyn TrackerApi>,
}

#[async_trait::async_trait]
impl ToolHandler for GetShowByIdHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let id = require_i64(&args, "id")?;
        self.api.show_by_id(id).await.map_err(|e| e.to_string())
    }
}

/// Handler for listing a show's viewed episodes
#[derive(Debug)]
pub struct GetViewedEpisodesHandler {
    pub api: Arc<dyn TrackerApi>,
}

#[async_trait::async_trait]
impl ToolHandler for GetViewedEpisodesHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let id = require_i64(&args, "id")?;
        self.api
            .viewed_episodes(id)
            .await
            .map_err(|e| e.to_string())
    }
}

/// Handler for marking episodes watched
#[derive(Debug)]
pub struct CheckEpisodeHandler {
    pub api: Arc<dyn TrackerApi>,
}

#[async_trait::async_trait]
impl ToolHandler for CheckEpisodeHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let ids = episode_ids(&args)?;
        Ok(apply_to_episodes(ids, |id| self.api.check_episode(id)).await)
    }
}

/// Handler for unmarking episodes
#[derive(Debug)]
pub struct UncheckEpisodeHandler {
    pub api: Arc<dyn TrackerApi>,
}

#[async_trait::async_trait]
impl ToolHandler for UncheckEpisodeHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let ids = episode_ids(&args)?;
        Ok(apply_to_episodes(ids, |id| self.api.uncheck_episode(id)).await)
    }
}

/// Handler for setting a movie's watch status
#[derive(Debug)]
pub struct SetMovieWatchStatusHandler {
    pub api: Arc<dyn TrackerApi>,
}

#[async_trait::async_trait]
impl ToolHandler for SetMovieWatchStatusHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let movie_id = require_i64(&args, "movie_id")?;
        let status: WatchStatus = require_str(&args, "status")?
            .parse()
            .map_err(|e: crate::api::ApiError| e.to_string())?;

        self.api
            .set_show_status(movie_id, status)
            .await
            .map_err(|e| e.to_string())
    }
}

/// Handler for the airing calendar
#[derive(Debug)]
pub struct GetCalendarEpisodesHandler {
    pub api: Arc<dyn TrackerApi>,
}

#[async_trait::async_trait]
impl ToolHandler for GetCalendarEpisodesHandler {
    async fn execute(&self, _args: Value) -> Result<Value, String> {
        self.api
            .calendar_episodes()
            .await
            .map_err(|e| e.to_string())
    }
}

/// Handler for recommendations
#[derive(Debug)]
pub struct GetRecommendationsHandler {
    pub api: Arc<dyn TrackerApi>,
}

#[async_trait::async_trait]
impl ToolHandler for GetRecommendationsHandler {
    async fn execute(&self, _args: Value) -> Result<Value, String> {
        self.api
            .recommendations()
            .await
            .map_err(|e| e.to_string())
    }
}
