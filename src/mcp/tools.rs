//! Tool registry for MCP tools.
//!
//! Every tool is a typed operation descriptor (name, parameter schema, handler)
//! registered into a lookup table. Argument schemas are declared here; the
//! handlers in [`super::handlers`] validate arguments against them before any
//! remote call is made.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::handlers::{
    CheckEpisodeHandler, GetCalendarEpisodesHandler, GetMyShowsHandler, GetProfileHandler,
    GetRecommendationsHandler, GetShowByIdHandler, GetViewedEpisodesHandler, SearchShowsHandler,
    SetMovieWatchStatusHandler, UncheckEpisodeHandler, WatchedMoviesHandler,
};
use crate::api::{TrackerApi, WatchStatus};

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "search_shows")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: serde_json::Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<Value, String>;
}

/// Registry for all MCP tools
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    /// Build the registry with every tool bound to the given session.
    pub fn new(api: Arc<dyn TrackerApi>) -> Self {
        let mut registry = Self {
            tools: HashMap::new(),
        };
        registry.register_tools(api);
        registry
    }

    fn register_tools(&mut self, api: Arc<dyn TrackerApi>) {
        self.register(Tool {
            name: "get_profile".to_string(),
            description: "Retrieve the current user's myshows.me profile.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            handler: Arc::new(GetProfileHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "search_shows".to_string(),
            description:
                "Search the myshows.me catalog for shows and movies by title, optionally filtered by year."
                    .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query string"
                    },
                    "year": {
                        "type": "integer",
                        "description": "Release year filter"
                    },
                    "page": {
                        "type": "integer",
                        "description": "Page number of results",
                        "default": 0
                    }
                },
                "required": ["query"]
            }),
            handler: Arc::new(SearchShowsHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "get_my_shows".to_string(),
            description:
                "List the shows in the user's profile with their watch status (also known as get_myshows_profile_shows_list)."
                    .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            handler: Arc::new(GetMyShowsHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "watched_movies".to_string(),
            description: "List the user's watched movies, most recently watched first.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "page": {
                        "type": "integer",
                        "description": "Page number of results",
                        "default": 0
                    }
                }
            }),
            handler: Arc::new(WatchedMoviesHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "get_movie_show_by_id".to_string(),
            description:
                "Fetch one show or movie by its myshows.me id, including episodes and season counts."
                    .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "integer",
                        "description": "myshows.me show or movie id"
                    }
                },
                "required": ["id"]
            }),
            handler: Arc::new(GetShowByIdHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "get_viewed_episodes".to_string(),
            description: "List the episodes of a show the user has marked watched.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "integer",
                        "description": "myshows.me show id"
                    }
                },
                "required": ["id"]
            }),
            handler: Arc::new(GetViewedEpisodesHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "check_episode".to_string(),
            description:
                "Mark one or more episodes watched by id. Each id is applied independently; the result is a per-id outcome list."
                    .to_string(),
            input_schema: episode_batch_schema(),
            handler: Arc::new(CheckEpisodeHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "uncheck_episode".to_string(),
            description:
                "Unmark one or more episodes by id. Each id is applied independently; the result is a per-id outcome list."
                    .to_string(),
            input_schema: episode_batch_schema(),
            handler: Arc::new(UncheckEpisodeHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "set_movie_watch_status".to_string(),
            description: "Set the watch status of a movie.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "movie_id": {
                        "type": "integer",
                        "description": "myshows.me movie id"
                    },
                    "status": {
                        "type": "string",
                        "description": "Watch status to set",
                        "enum": WatchStatus::ALL
                    }
                },
                "required": ["movie_id", "status"]
            }),
            handler: Arc::new(SetMovieWatchStatusHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "get_calendar_episodes".to_string(),
            description: "List upcoming episodes from the user's airing calendar.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            handler: Arc::new(GetCalendarEpisodesHandler { api: api.clone() }),
        });

        self.register(Tool {
            name: "get_myshows_recomendations".to_string(),
            description: "List shows myshows.me recommends for the user.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            handler: Arc::new(GetRecommendationsHandler { api }),
        });
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get all tools
    pub fn all(&self) -> Vec<&Tool> {
        self.tools.values().collect()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, String> {
        let tool = self
            .get(name)
            .ok_or_else(|| format!("Tool '{}' not found", name))?;

        tool.handler.execute(args).await
    }
}

fn episode_batch_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "episode_id": {
                "description": "A single episode id or a list of episode ids",
                "oneOf": [
                    { "type": "integer" },
                    {
                        "type": "array",
                        "items": { "type": "integer" },
                        "minItems": 1
                    }
                ]
            }
        },
        "required": ["episode_id"]
    })
}
