//! Integration tests for the MyShows MCP server.
//!
//! These tests exercise the tool catalog end to end against a mock session,
//! verifying registration, dispatch, validation and batch semantics.

use myshows_mcp::api::MockTracker;
use myshows_mcp::mcp::{McpServer, ToolRegistry};
use serde_json::json;
use std::sync::Arc;

const EXPECTED_TOOLS: [&str; 11] = [
    "get_profile",
    "search_shows",
    "get_my_shows",
    "watched_movies",
    "get_movie_show_by_id",
    "get_viewed_episodes",
    "check_episode",
    "uncheck_episode",
    "set_movie_watch_status",
    "get_calendar_episodes",
    "get_myshows_recomendations",
];

fn registry_with_mock() -> (ToolRegistry, Arc<MockTracker>) {
    let api = Arc::new(MockTracker::new());
    (ToolRegistry::new(api.clone()), api)
}

#[test]
fn test_full_catalog_registered() {
    let (registry, _) = registry_with_mock();

    assert_eq!(registry.len(), EXPECTED_TOOLS.len());
    for name in EXPECTED_TOOLS {
        let tool = registry.get(name).unwrap_or_else(|| panic!("missing tool {}", name));
        assert!(!tool.description.is_empty());
        assert_eq!(tool.input_schema["type"], "object");
    }
}

#[test]
fn test_required_parameters_declared() {
    let (registry, _) = registry_with_mock();

    let search = registry.get("search_shows").unwrap();
    assert_eq!(search.input_schema["required"], json!(["query"]));

    let status = registry.get("set_movie_watch_status").unwrap();
    assert_eq!(
        status.input_schema["required"],
        json!(["movie_id", "status"])
    );
    assert_eq!(
        status.input_schema["properties"]["status"]["enum"],
        json!(["watching", "watched", "later", "cancelled", "remove"])
    );

    let check = registry.get("check_episode").unwrap();
    assert_eq!(check.input_schema["required"], json!(["episode_id"]));
}

#[tokio::test]
async fn test_dispatch_by_name() {
    let (registry, api) = registry_with_mock();
    api.set_response("profile", json!({ "login": "viewer", "id": 7 }));

    let profile = registry.execute("get_profile", json!({})).await.unwrap();
    assert_eq!(profile["login"], "viewer");
    assert_eq!(api.calls(), vec!["profile"]);
}

#[tokio::test]
async fn test_unknown_tool_rejected() {
    let (registry, api) = registry_with_mock();

    let err = registry
        .execute("delete_account", json!({}))
        .await
        .unwrap_err();
    assert!(err.contains("delete_account"));
    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn test_validation_error_makes_no_remote_call() {
    let (registry, api) = registry_with_mock();

    let err = registry
        .execute(
            "set_movie_watch_status",
            json!({ "movie_id": 55, "status": "not_a_real_status" }),
        )
        .await
        .unwrap_err();
    assert!(err.contains("not_a_real_status"));
    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn test_batch_check_is_independent_per_id() {
    let (registry, api) = registry_with_mock();
    api.fail_episode(102);

    let result = registry
        .execute("check_episode", json!({ "episode_id": [101, 102] }))
        .await
        .unwrap();

    let outcomes = result.as_array().unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0]["id"], 101);
    assert_eq!(outcomes[0]["ok"], true);
    assert_eq!(outcomes[1]["id"], 102);
    assert_eq!(outcomes[1]["ok"], false);

    // 101 was checked even though 102 failed.
    assert_eq!(api.calls(), vec!["check_episode(101)", "check_episode(102)"]);
}

#[tokio::test]
async fn test_watch_then_list_round_trip() {
    let (registry, api) = registry_with_mock();
    api.set_response(
        "watched_movies",
        json!([{ "id": 55, "title": "Primer" }]),
    );

    registry
        .execute(
            "set_movie_watch_status",
            json!({ "movie_id": 55, "status": "watched" }),
        )
        .await
        .unwrap();

    let movies = registry
        .execute("watched_movies", json!({}))
        .await
        .unwrap();
    assert_eq!(movies[0]["id"], 55);

    assert_eq!(
        api.calls(),
        vec!["set_show_status(55, watching)", "watched_movies(0)"]
    );
}

#[test]
fn test_server_exposes_registry() {
    let api = Arc::new(MockTracker::new());
    let server = McpServer::new(api);
    assert_eq!(server.tools().len(), EXPECTED_TOOLS.len());
}
