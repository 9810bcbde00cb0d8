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

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::info;

use choreboard_client::ApiError;
use choreboard_core::{ChoreActions, SnapshotReceiver};

/// Application state for web handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub snapshot_rx: SnapshotReceiver,
    pub actions: ChoreActions,
}

/// Build the bridge API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/snapshot", get(snapshot_handler))
        .route("/api/actions/claim", post(claim_handler))
        .route("/api/actions/unclaim", post(unclaim_handler))
        .route("/api/actions/complete", post(complete_handler))
        .route("/api/actions/undo", post(undo_handler))
        .route("/api/actions/arcade/start", post(arcade_start_handler))
        .route("/api/actions/arcade/stop", post(arcade_stop_handler))
        .route("/api/actions/arcade/approve", post(arcade_approve_handler))
        .route("/api/actions/arcade/deny", post(arcade_deny_handler))
        .route(
            "/api/actions/arcade/continue",
            post(arcade_continue_handler),
        )
        .route("/api/actions/arcade/cancel", post(arcade_cancel_handler))
        .layer(CorsLayer::permissive()) // Allow HA Ingress
        .with_state(state)
}

/// Serve the API until the process shuts down.
///
/// # Errors
/// Returns error if server fails to bind or serve
pub async fn start_server(
    state: AppState,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = build_router(state);
    let addr = format!("0.0.0.0:{port}");
    info!("🌐 Starting bridge API on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Upstream failures surface as 502 so HA can tell a broken backend
/// from a broken bridge; a missing endpoint passes through as 404.
fn api_error_response(err: &ApiError) -> Response {
    let status = match err {
        ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
        ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ApiError::Auth | ApiError::Server { .. } | ApiError::Connection(_) | ApiError::Api { .. } => {
            StatusCode::BAD_GATEWAY
        }
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

fn action_response(result: Result<(), ApiError>) -> Response {
    match result {
        Ok(()) => Json(json!({ "status": "ok" })).into_response(),
        Err(err) => api_error_response(&err),
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// Latest reconciled snapshot; 503 until the first tick succeeds.
async fn snapshot_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.snapshot_rx.borrow().clone();
    match snapshot {
        Some(snapshot) => Json(snapshot.as_ref().clone()).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "no data yet, first poll has not completed" })),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct ClaimRequest {
    instance_id: i64,
    #[serde(default)]
    assign_to_user_id: Option<i64>,
}

async fn claim_handler(
    State(state): State<AppState>,
    Json(req): Json<ClaimRequest>,
) -> Response {
    action_response(
        state
            .actions
            .claim_chore(req.instance_id, req.assign_to_user_id)
            .await,
    )
}

#[derive(Debug, Deserialize)]
struct InstanceRequest {
    instance_id: i64,
}

async fn unclaim_handler(
    State(state): State<AppState>,
    Json(req): Json<InstanceRequest>,
) -> Response {
    action_response(state.actions.unclaim_chore(req.instance_id).await)
}

#[derive(Debug, Deserialize)]
struct CompleteRequest {
    instance_id: i64,
    #[serde(default)]
    helper_ids: Option<Vec<i64>>,
    #[serde(default)]
    completed_by_user_id: Option<i64>,
}

async fn complete_handler(
    State(state): State<AppState>,
    Json(req): Json<CompleteRequest>,
) -> Response {
    action_response(
        state
            .actions
            .mark_complete(
                req.instance_id,
                req.helper_ids.as_deref(),
                req.completed_by_user_id,
            )
            .await,
    )
}

#[derive(Debug, Deserialize)]
struct UndoRequest {
    completion_id: i64,
}

async fn undo_handler(State(state): State<AppState>, Json(req): Json<UndoRequest>) -> Response {
    action_response(state.actions.undo_completion(req.completion_id).await)
}

#[derive(Debug, Deserialize)]
struct ArcadeStartRequest {
    instance_id: i64,
    #[serde(default)]
    user_id: Option<i64>,
}

async fn arcade_start_handler(
    State(state): State<AppState>,
    Json(req): Json<ArcadeStartRequest>,
) -> Response {
    action_response(state.actions.start_arcade(req.instance_id, req.user_id).await)
}

#[derive(Debug, Deserialize)]
struct SessionRequest {
    session_id: i64,
}

async fn arcade_stop_handler(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> Response {
    action_response(state.actions.stop_arcade(req.session_id).await)
}

#[derive(Debug, Deserialize)]
struct JudgeRequest {
    session_id: i64,
    #[serde(default)]
    judge_id: Option<i64>,
    #[serde(default)]
    notes: Option<String>,
}

async fn arcade_approve_handler(
    State(state): State<AppState>,
    Json(req): Json<JudgeRequest>,
) -> Response {
    action_response(
        state
            .actions
            .approve_arcade(req.session_id, req.judge_id, req.notes.as_deref())
            .await,
    )
}

async fn arcade_deny_handler(
    State(state): State<AppState>,
    Json(req): Json<JudgeRequest>,
) -> Response {
    action_response(
        state
            .actions
            .deny_arcade(req.session_id, req.judge_id, req.notes.as_deref())
            .await,
    )
}

async fn arcade_continue_handler(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> Response {
    action_response(state.actions.continue_arcade(req.session_id).await)
}

async fn arcade_cancel_handler(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> Response {
    action_response(state.actions.cancel_arcade(req.session_id).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    use choreboard_client::ChoreboardClient;
    use choreboard_core::Coordinator;
    use choreboard_types::Snapshot;

    fn state_for(server_url: &str) -> (AppState, tokio::sync::watch::Sender<Option<Arc<Snapshot>>>) {
        let client = Arc::new(ChoreboardClient::new(server_url, "testuser", "secret").unwrap());
        let (_coordinator, _rx, refresh) =
            Coordinator::new(client.clone(), Vec::new(), Duration::from_secs(30));

        // The handlers read from their own channel so tests can seed it.
        let (tx, rx) = tokio::sync::watch::channel(None);
        let state = AppState {
            snapshot_rx: rx,
            actions: ChoreActions::new(client, refresh),
        };
        (state, tx)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_version() {
        let (state, _tx) = state_for("http://localhost:1");
        let app = build_router(state);

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn snapshot_unavailable_until_first_tick() {
        let (state, tx) = state_for("http://localhost:1");
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(Request::get("/api/snapshot").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        tx.send_replace(Some(Arc::new(Snapshot {
            points_label: "stars".to_owned(),
            ..Snapshot::default()
        })));

        let response = app
            .oneshot(Request::get("/api/snapshot").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["points_label"], "stars");
    }

    #[tokio::test]
    async fn claim_forwards_to_backend() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/claim/")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({"instance_id": 7}),
            ))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let (state, _tx) = state_for(&server.url());
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::post("/api/actions/claim")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"instance_id": 7}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn backend_error_maps_to_bad_gateway() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/complete/")
            .with_status(500)
            .create_async()
            .await;

        let (state, _tx) = state_for(&server.url());
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::post("/api/actions/complete")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"instance_id": 7}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("500"));
    }

    #[tokio::test]
    async fn missing_endpoint_maps_to_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/arcade/start/")
            .with_status(404)
            .create_async()
            .await;

        let (state, _tx) = state_for(&server.url());
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::post("/api/actions/arcade/start")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"instance_id": 3}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
