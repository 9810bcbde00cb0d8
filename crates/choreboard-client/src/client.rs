// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of ChoreBoard Bridge.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::auth::TokenGenerator;
use crate::error::{ApiError, ApiResult};
use choreboard_types::{
    ArcadeStatus, ChoreInstance, ChoreLeaderboard, CompletionRecord, LeaderboardEntry,
    LeaderboardKind, PendingApproval, SiteSettings, User,
};

/// ChoreBoard REST API client with HMAC bearer authentication.
#[derive(Debug)]
pub struct ChoreboardClient {
    base_url: String,
    auth: TokenGenerator,
    client: Client,
}

impl ChoreboardClient {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            auth: TokenGenerator::new(username, secret_key),
            client,
        })
    }

    /// The token generator backing this client.
    pub fn auth(&self) -> &TokenGenerator {
        &self.auth
    }

    /// Make an authenticated request and return the parsed JSON body.
    ///
    /// Status mapping: 401 drops the cached token and raises
    /// [`ApiError::Auth`] (retry is the caller's call), 404 raises
    /// [`ApiError::NotFound`] with the path, 5xx raises
    /// [`ApiError::Server`], any other non-2xx raises [`ApiError::Api`].
    async fn request(
        &self,
        method: Method,
        path: &str,
        json_body: Option<&Value>,
        query: Option<&[(&str, String)]>,
    ) -> ApiResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        let token = self.auth.token();
        debug!("Making {} request to {}", method, url);

        let mut request = self.client.request(method, &url).bearer_auth(&token);
        if let Some(params) = query {
            request = request.query(params);
        }
        if let Some(body) = json_body {
            request = request.json(body);
        }

        let response = request.send().await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                warn!("Authentication failed, dropping cached token");
                self.auth.invalidate();
                Err(ApiError::Auth)
            }
            StatusCode::NOT_FOUND => {
                error!("Endpoint not found: {}", url);
                Err(ApiError::NotFound {
                    path: path.to_owned(),
                })
            }
            status if status.is_server_error() => {
                error!("Server error: {}", status);
                Err(ApiError::Server {
                    status: status.as_u16(),
                })
            }
            status if !status.is_success() => {
                let message = response.text().await.unwrap_or_default();
                error!("Request failed with status {}: {}", status, message);
                Err(ApiError::Api {
                    status: Some(status.as_u16()),
                    message,
                })
            }
            _ => {
                let data = response.json::<Value>().await.map_err(|e| ApiError::Api {
                    status: None,
                    message: format!("malformed response body: {e}"),
                })?;
                debug!("Request successful");
                Ok(data)
            }
        }
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<&[(&str, String)]>,
    ) -> ApiResult<Vec<T>> {
        let data = self.request(Method::GET, path, None, query).await?;
        decode_list(data)
    }

    // ===== Read endpoints =====

    /// All outstanding (incomplete, non-overdue) chore instances.
    pub async fn get_outstanding_chores(&self) -> ApiResult<Vec<ChoreInstance>> {
        self.get_list("/api/outstanding/", None).await
    }

    /// All overdue chore instances.
    pub async fn get_late_chores(&self) -> ApiResult<Vec<ChoreInstance>> {
        self.get_list("/api/late-chores/", None).await
    }

    /// All active, assignable users with their point tallies.
    pub async fn get_users(&self) -> ApiResult<Vec<User>> {
        self.get_list("/api/users/", None).await
    }

    /// Site settings (custom points label).
    pub async fn get_settings(&self) -> ApiResult<SiteSettings> {
        let data = self
            .request(Method::GET, "/api/settings/", None, None)
            .await?;
        if !data.is_object() {
            return Ok(SiteSettings::default());
        }
        serde_json::from_value(data).map_err(|e| ApiError::Api {
            status: None,
            message: format!("unexpected settings shape: {e}"),
        })
    }

    /// Most recent completions, newest first, bounded by `limit`.
    pub async fn get_recent_completions(&self, limit: u32) -> ApiResult<Vec<CompletionRecord>> {
        let query = [("limit", limit.to_string())];
        self.get_list("/api/completions/recent/", Some(&query)).await
    }

    /// One of the two global leaderboards.
    pub async fn get_leaderboard(&self, kind: LeaderboardKind) -> ApiResult<Vec<LeaderboardEntry>> {
        let query = [("type", kind.as_query_value().to_owned())];
        self.get_list("/api/leaderboard/", Some(&query)).await
    }

    /// Arcade-mode leaderboards for all chores.
    pub async fn get_chore_leaderboards(&self) -> ApiResult<Vec<ChoreLeaderboard>> {
        self.get_list("/api/chore-leaderboards/", None).await
    }

    /// Live arcade status for one user.
    pub async fn get_arcade_status(&self, user_id: i64) -> ApiResult<ArcadeStatus> {
        let path = format!("/api/arcade/status/{user_id}/");
        let data = self.request(Method::GET, &path, None, None).await?;
        serde_json::from_value(data).map_err(|e| ApiError::Api {
            status: None,
            message: format!("unexpected arcade status shape: {e}"),
        })
    }

    /// Global list of arcade sessions awaiting a judge.
    pub async fn get_pending_arcade_approvals(&self) -> ApiResult<Vec<PendingApproval>> {
        self.get_list("/api/arcade/pending/", None).await
    }

    // ===== Write endpoints =====

    /// Claim a pool chore, optionally assigning it to another user.
    pub async fn claim_chore(
        &self,
        instance_id: i64,
        assign_to_user_id: Option<i64>,
    ) -> ApiResult<Value> {
        let mut body = serde_json::json!({ "instance_id": instance_id });
        if let Some(user_id) = assign_to_user_id {
            body["assign_to_user_id"] = user_id.into();
        }
        self.request(Method::POST, "/api/claim/", Some(&body), None)
            .await
    }

    /// Release a previously claimed chore back to the pool.
    pub async fn unclaim_chore(&self, instance_id: i64) -> ApiResult<Value> {
        let body = serde_json::json!({ "instance_id": instance_id });
        self.request(Method::POST, "/api/unclaim/", Some(&body), None)
            .await
    }

    /// Mark a chore instance complete, optionally crediting helpers or a
    /// different completing user.
    pub async fn complete_chore(
        &self,
        instance_id: i64,
        helper_ids: Option<&[i64]>,
        completed_by_user_id: Option<i64>,
    ) -> ApiResult<Value> {
        let mut body = serde_json::json!({ "instance_id": instance_id });
        if let Some(helpers) = helper_ids
            && !helpers.is_empty()
        {
            body["helper_ids"] = helpers.into();
        }
        if let Some(user_id) = completed_by_user_id {
            body["completed_by_user_id"] = user_id.into();
        }
        self.request(Method::POST, "/api/complete/", Some(&body), None)
            .await
    }

    /// Undo a completion (admin only).
    pub async fn undo_completion(&self, completion_id: i64) -> ApiResult<Value> {
        let body = serde_json::json!({ "completion_id": completion_id });
        self.request(Method::POST, "/api/undo/", Some(&body), None)
            .await
    }

    // ===== Arcade lifecycle =====

    /// Start a timed arcade session for a chore instance.
    pub async fn start_arcade(&self, instance_id: i64, user_id: Option<i64>) -> ApiResult<Value> {
        let mut body = serde_json::json!({ "instance_id": instance_id });
        if let Some(user_id) = user_id {
            body["user_id"] = user_id.into();
        }
        self.request(Method::POST, "/api/arcade/start/", Some(&body), None)
            .await
    }

    /// Stop the timer and hand the session to a judge.
    pub async fn stop_arcade(&self, session_id: i64) -> ApiResult<Value> {
        let body = serde_json::json!({ "session_id": session_id });
        self.request(Method::POST, "/api/arcade/stop/", Some(&body), None)
            .await
    }

    /// Judge approval: award points and close the session.
    pub async fn approve_arcade(
        &self,
        session_id: i64,
        judge_id: Option<i64>,
        notes: Option<&str>,
    ) -> ApiResult<Value> {
        self.judge_arcade("/api/arcade/approve/", session_id, judge_id, notes)
            .await
    }

    /// Judge denial: close the session without awarding points.
    pub async fn deny_arcade(
        &self,
        session_id: i64,
        judge_id: Option<i64>,
        notes: Option<&str>,
    ) -> ApiResult<Value> {
        self.judge_arcade("/api/arcade/deny/", session_id, judge_id, notes)
            .await
    }

    async fn judge_arcade(
        &self,
        path: &str,
        session_id: i64,
        judge_id: Option<i64>,
        notes: Option<&str>,
    ) -> ApiResult<Value> {
        let mut body = serde_json::json!({ "session_id": session_id });
        if let Some(judge_id) = judge_id {
            body["judge_id"] = judge_id.into();
        }
        if let Some(notes) = notes {
            body["notes"] = notes.into();
        }
        self.request(Method::POST, path, Some(&body), None).await
    }

    /// Resume a stopped session instead of submitting it for judging.
    pub async fn continue_arcade(&self, session_id: i64) -> ApiResult<Value> {
        let body = serde_json::json!({ "session_id": session_id });
        self.request(Method::POST, "/api/arcade/continue/", Some(&body), None)
            .await
    }

    /// Abandon a session entirely.
    pub async fn cancel_arcade(&self, session_id: i64) -> ApiResult<Value> {
        let body = serde_json::json!({ "session_id": session_id });
        self.request(Method::POST, "/api/arcade/cancel/", Some(&body), None)
            .await
    }

    /// Probe the API and authentication.
    pub async fn test_connection(&self) -> bool {
        match self.get_outstanding_chores().await {
            Ok(_) => true,
            Err(e) => {
                warn!("Connection test failed: {}", e);
                false
            }
        }
    }
}

/// Strict list decoding: the backend occasionally wraps an error object
/// in a 200 body, and that must surface as an API error rather than an
/// empty list, or a failed fetch would wipe the published data.
fn decode_list<T: DeserializeOwned>(data: Value) -> ApiResult<Vec<T>> {
    serde_json::from_value(data).map_err(|e| ApiError::Api {
        status: None,
        message: format!("unexpected response shape: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    const BEARER_RE: &str = r"^Bearer testuser:\d+:[0-9a-f]{64}$";

    fn client_for(server: &Server) -> ChoreboardClient {
        ChoreboardClient::new(server.url(), "testuser", "test_secret_key").unwrap()
    }

    #[tokio::test]
    async fn test_get_outstanding_chores_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/outstanding/")
            .match_header("authorization", Matcher::Regex(BEARER_RE.to_owned()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([{
                    "id": 1,
                    "chore": {"name": "Dishes", "points": 10, "schedule_type": "daily"},
                    "status": "ASSIGNED",
                    "assigned_to": {"username": "alice"},
                    "due_at": "2025-12-15T10:00:00Z"
                }])
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let chores = client.get_outstanding_chores().await.unwrap();

        assert_eq!(chores.len(), 1);
        assert_eq!(chores[0].id, 1);
        assert_eq!(chores[0].chore.name, "Dishes");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_not_found_carries_path() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/late-chores/")
            .with_status(404)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.get_late_chores().await;

        match result {
            Err(ApiError::NotFound { path }) => assert_eq!(path, "/api/late-chores/"),
            other => panic!("expected NotFound, got {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_invalidates_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/users/")
            .with_status(401)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.get_users().await;

        assert!(matches!(result, Err(ApiError::Auth)));
        // 401 must clear the cache so the next call regenerates.
        assert!(client.auth().cached_token().is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_maps_to_server_variant() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/users/")
            .with_status(503)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.get_users().await;

        assert!(matches!(result, Err(ApiError::Server { status: 503 })));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_other_non_success_maps_to_api_variant() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/claim/")
            .with_status(422)
            .with_body("already claimed")
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.claim_chore(1, None).await;

        match result {
            Err(ApiError::Api { status, message }) => {
                assert_eq!(status, Some(422));
                assert_eq!(message, "already claimed");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_leaderboard_sends_type_query() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/leaderboard/")
            .match_query(Matcher::UrlEncoded("type".into(), "weekly".into()))
            .with_status(200)
            .with_body(json!([{"user": {"username": "alice", "weekly_points": 50}}]).to_string())
            .create_async()
            .await;

        let client = client_for(&server);
        let entries = client.get_leaderboard(LeaderboardKind::Weekly).await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].resolved_points(LeaderboardKind::Weekly), 50);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_recent_completions_sends_limit() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/completions/recent/")
            .match_query(Matcher::UrlEncoded("limit".into(), "20".into()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = client_for(&server);
        let completions = client.get_recent_completions(20).await.unwrap();

        assert!(completions.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_chore_posts_optional_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/complete/")
            .match_body(Matcher::Json(json!({
                "instance_id": 7,
                "helper_ids": [2, 3],
                "completed_by_user_id": 5
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.complete_chore(7, Some(&[2, 3]), Some(5)).await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_approve_arcade_posts_judge_and_notes() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/arcade/approve/")
            .match_body(Matcher::Json(json!({
                "session_id": 11,
                "judge_id": 1,
                "notes": "nice time"
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.approve_arcade(11, Some(1), Some("nice time")).await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_object_in_200_body_is_an_api_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/outstanding/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"detail": "internal error"}).to_string())
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.get_outstanding_chores().await;

        match result {
            Err(ApiError::Api { status: None, message }) => {
                assert!(message.contains("unexpected response shape"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_settings_tolerates_non_object_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/settings/")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = client_for(&server);
        let settings = client.get_settings().await.unwrap();

        assert_eq!(settings.points_label, "points");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_connection_probe_reports_failure() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/outstanding/")
            .with_status(500)
            .create_async()
            .await;

        let client = client_for(&server);
        assert!(!client.test_connection().await);
        mock.assert_async().await;
    }
}
