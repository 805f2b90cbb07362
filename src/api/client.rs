//! The reqwest-backed myshows.me client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use url::Url;

use crate::api::{ApiError, RpcRequest, RpcResponse, TrackerApi, WatchStatus};
use crate::config::{Credentials, Settings};
use crate::utils::{build_http_client, with_retry, RetryConfig};

// Request ids preserved from the site's own web client traffic. The endpoint
// echoes them back per batch element; the values themselves carry no meaning.
const ID_PROFILE: u32 = 1;
const ID_SHOW_STATUS: u32 = 5;
const ID_PROFILE_SHOWS: u32 = 5;
const ID_CATALOG: u32 = 63;
const ID_WATCHED_MOVIES: u32 = 80;
const ID_CALENDAR: u32 = 86;
const ID_SHOW_BY_ID: u32 = 87;
const ID_PROFILE_EPISODES: u32 = 96;
const ID_RECOMMENDATIONS: u32 = 107;
const ID_UNCHECK_EPISODE: u32 = 111;
const ID_CHECK_EPISODE: u32 = 113;

/// Authenticated client for the myshows.me JSON-RPC API.
///
/// Created by [`MyShowsClient::connect`], which performs the single login call.
/// The resulting bearer token is immutable for the lifetime of the client and
/// sent on every RPC request as the `authorization2` header. There is no
/// automatic re-login; a session the remote reports as expired surfaces as
/// [`ApiError::Auth`] on the failing call.
pub struct MyShowsClient {
    http: Client,
    api_url: Url,
    token: Option<String>,
    retry: RetryConfig,
}

impl std::fmt::Debug for MyShowsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MyShowsClient")
            .field("api_url", &self.api_url.as_str())
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl MyShowsClient {
    /// Authenticate against the session endpoint and build a ready client.
    ///
    /// The login call is made exactly once and is never retried; rejected
    /// credentials are an [`ApiError::Auth`] the caller treats as fatal.
    pub async fn connect(
        credentials: &Credentials,
        settings: &Settings,
    ) -> Result<Self, ApiError> {
        let http = build_http_client(&settings.http)
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {}", e)))?;

        let api_url = Url::parse(&settings.api_url)
            .map_err(|e| ApiError::InvalidRequest(format!("bad api_url: {}", e)))?;
        let session_url = Url::parse(&settings.session_url)
            .map_err(|e| ApiError::InvalidRequest(format!("bad session_url: {}", e)))?;

        let token = Self::login(&http, session_url, credentials).await?;
        tracing::info!(login = %credentials.login, "authenticated with myshows.me");

        Ok(Self {
            http,
            api_url,
            token,
            retry: RetryConfig::from(&settings.retry),
        })
    }

    /// Exchange credentials for a bearer token at the session endpoint.
    async fn login(
        http: &Client,
        session_url: Url,
        credentials: &Credentials,
    ) -> Result<Option<String>, ApiError> {
        let response = http
            .post(session_url)
            .json(&json!({
                "login": credentials.login,
                "password": credentials.password,
            }))
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("login request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Auth(format!(
                "login rejected with HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(format!("login response: {}", e)))?;

        if let Some(error) = body.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(ApiError::Auth(format!("login failed: {}", message)));
        }

        Ok(body
            .get("token")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Perform one RPC call, wrapped by the retry policy for transient errors.
    async fn call(&self, method: &str, id: u32, params: Value) -> Result<Value, ApiError> {
        with_retry(self.retry, || self.request_once(method, id, params.clone())).await
    }

    async fn request_once(&self, method: &str, id: u32, params: Value) -> Result<Value, ApiError> {
        tracing::debug!(method, "calling myshows.me RPC");

        // The endpoint expects a one-element batch and answers in kind.
        let payload = [RpcRequest::new(method, id, params)];

        let mut request = self.http.post(self.api_url.clone()).json(&payload);
        if let Some(token) = &self.token {
            request = request.header("authorization2", format!("Bearer {}", token));
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Auth(format!(
                "session rejected with HTTP {}",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }

        let batch: Vec<RpcResponse> = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(format!("RPC envelope: {}", e)))?;

        let first = batch
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Parse("empty RPC batch response".to_string()))?;

        if let Some(error) = first.error {
            // Session expiry is reported in-band rather than via HTTP status.
            if error.code == Some(401) || error.message.to_lowercase().contains("not authorized") {
                return Err(ApiError::Auth(error.message));
            }
            return Err(ApiError::Api(format!("{}: {}", method, error.message)));
        }

        Ok(first.result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl TrackerApi for MyShowsClient {
    async fn profile(&self) -> Result<Value, ApiError> {
        self.call("profile.get", ID_PROFILE, json!({})).await
    }

    async fn search_shows(
        &self,
        query: &str,
        year: Option<i64>,
        page: i64,
    ) -> Result<Value, ApiError> {
        // The catalog endpoint requires the full filter object with unused
        // filters present as nulls.
        self.call(
            "shows.GetCatalog",
            ID_CATALOG,
            json!({
                "search": {
                    "network": null,
                    "genre": null,
                    "country": null,
                    "year": year,
                    "startYear": null,
                    "endYear": null,
                    "watching": null,
                    "category": null,
                    "status": null,
                    "sort": null,
                    "query": query,
                    "watchStatus": null,
                    "embed": null,
                    "providers": null,
                    "jwProviders": null,
                },
                "page": page,
                "pageSize": 30,
            }),
        )
        .await
    }

    async fn my_shows(&self) -> Result<Value, ApiError> {
        // Empty login means the current user's profile.
        self.call("profile.Shows", ID_PROFILE_SHOWS, json!({ "login": "" }))
            .await
    }

    async fn watched_movies(&self, page: i64) -> Result<Value, ApiError> {
        self.call(
            "profile.WatchedMovies",
            ID_WATCHED_MOVIES,
            json!({
                "page": page,
                "pageSize": 20,
                "login": "",
                "search": { "sort": "watchedAt_desc" },
            }),
        )
        .await
    }

    async fn show_by_id(&self, show_id: i64) -> Result<Value, ApiError> {
        self.call(
            "shows.GetById",
            ID_SHOW_BY_ID,
            json!({
                "showId": show_id,
                "withEpisodes": true,
                "withSeasonCounts": true,
            }),
        )
        .await
    }

    async fn viewed_episodes(&self, show_id: i64) -> Result<Value, ApiError> {
        self.call(
            "profile.Episodes",
            ID_PROFILE_EPISODES,
            json!({ "showId": show_id }),
        )
        .await
    }

    async fn check_episode(&self, episode_id: i64) -> Result<Value, ApiError> {
        self.call(
            "manage.CheckEpisode",
            ID_CHECK_EPISODE,
            json!({ "id": episode_id }),
        )
        .await
    }

    async fn uncheck_episode(&self, episode_id: i64) -> Result<Value, ApiError> {
        self.call(
            "manage.UncheckEpisode",
            ID_UNCHECK_EPISODE,
            json!({ "id": episode_id }),
        )
        .await
    }

    async fn set_show_status(&self, show_id: i64, status: WatchStatus) -> Result<Value, ApiError> {
        self.call(
            "manage.SetShowStatus",
            ID_SHOW_STATUS,
            json!({ "id": show_id, "status": status.as_remote() }),
        )
        .await
    }

    async fn calendar_episodes(&self) -> Result<Value, ApiError> {
        self.call("lists.Episodes", ID_CALENDAR, json!({ "list": "next" }))
            .await
    }

    async fn recommendations(&self) -> Result<Value, ApiError> {
        self.call("recommendation.Get", ID_RECOMMENDATIONS, json!({ "count": 10 }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HttpSettings, RetrySettings};

    fn test_settings(server_url: &str, max_attempts: u32) -> Settings {
        Settings {
            api_url: format!("{}/v3/rpc/", server_url),
            session_url: format!("{}/api/session", server_url),
            http: HttpSettings::default(),
            retry: RetrySettings {
                max_attempts,
                initial_delay_ms: 1,
            },
        }
    }

    fn test_credentials() -> Credentials {
        Credentials::new("viewer", "secret")
    }

    #[tokio::test]
    async fn test_login_once_and_token_reused() {
        let mut server = mockito::Server::new_async().await;

        let session = server
            .mock("POST", "/api/session")
            .with_status(200)
            .with_body(r#"{"token":"tok-123"}"#)
            .expect(1)
            .create_async()
            .await;

        let rpc = server
            .mock("POST", "/v3/rpc/")
            .match_header("authorization2", "Bearer tok-123")
            .with_status(200)
            .with_body(r#"[{"jsonrpc":"2.0","result":{"login":"viewer"},"id":1}]"#)
            .expect(2)
            .create_async()
            .await;

        let client = MyShowsClient::connect(&test_credentials(), &test_settings(&server.url(), 1))
            .await
            .unwrap();

        let profile = client.profile().await.unwrap();
        assert_eq!(profile["login"], "viewer");

        // A second call reuses the session; no re-authentication happens.
        client.profile().await.unwrap();

        session.assert_async().await;
        rpc.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("POST", "/api/session")
            .with_status(401)
            .with_body(r#"{"error":{"message":"bad credentials"}}"#)
            .create_async()
            .await;

        let result =
            MyShowsClient::connect(&test_credentials(), &test_settings(&server.url(), 1)).await;
        assert!(matches!(result, Err(ApiError::Auth(_))));
    }

    #[tokio::test]
    async fn test_login_error_body_on_success_status() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("POST", "/api/session")
            .with_status(200)
            .with_body(r#"{"error":{"message":"account locked"}}"#)
            .create_async()
            .await;

        let result =
            MyShowsClient::connect(&test_credentials(), &test_settings(&server.url(), 1)).await;
        match result {
            Err(ApiError::Auth(msg)) => assert!(msg.contains("account locked")),
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remote_error_surfaced_not_panicked() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("POST", "/api/session")
            .with_status(200)
            .with_body(r#"{"token":"tok"}"#)
            .create_async()
            .await;

        server
            .mock("POST", "/v3/rpc/")
            .with_status(200)
            .with_body(
                r#"[{"jsonrpc":"2.0","error":{"code":-32001,"message":"episode does not exist"},"id":113}]"#,
            )
            .create_async()
            .await;

        let client = MyShowsClient::connect(&test_credentials(), &test_settings(&server.url(), 1))
            .await
            .unwrap();

        match client.check_episode(999).await {
            Err(ApiError::Api(msg)) => assert!(msg.contains("episode does not exist")),
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_expired_session_reported_as_auth_error() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("POST", "/api/session")
            .with_status(200)
            .with_body(r#"{"token":"tok"}"#)
            .create_async()
            .await;

        server
            .mock("POST", "/v3/rpc/")
            .with_status(401)
            .create_async()
            .await;

        let client = MyShowsClient::connect(&test_credentials(), &test_settings(&server.url(), 1))
            .await
            .unwrap();

        assert!(matches!(client.profile().await, Err(ApiError::Auth(_))));
    }

    #[tokio::test]
    async fn test_server_error_retried_once_then_surfaced() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("POST", "/api/session")
            .with_status(200)
            .with_body(r#"{"token":"tok"}"#)
            .create_async()
            .await;

        // One retry only: a persistent 500 is hit exactly twice and surfaced.
        let failing = server
            .mock("POST", "/v3/rpc/")
            .with_status(500)
            .expect(2)
            .create_async()
            .await;

        let client = MyShowsClient::connect(&test_credentials(), &test_settings(&server.url(), 2))
            .await
            .unwrap();

        let result = client.calendar_episodes().await;
        assert!(matches!(result, Err(ApiError::Status { status: 500, .. })));
        failing.assert_async().await;
    }
}
