//! HTTP routes for managing sessions

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::SessionError;
use crate::protocol::ServerMessage;
use crate::session::{SessionSummary, StartRequest};
use crate::state::AppState;
use crate::ws::ws_handler;

/// Body of a join request
#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub player_id: String,
    pub name: String,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match self {
            SessionError::NotFound(_) => StatusCode::NOT_FOUND,
            SessionError::AlreadyActive(_)
            | SessionError::SessionFull(_)
            | SessionError::AlreadyJoined(_) => StatusCode::CONFLICT,
            SessionError::WrongMode(_) => StatusCode::BAD_REQUEST,
            SessionError::ChannelGone(_) => StatusCode::GONE,
        };
        let body = ServerMessage::Error {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/sessions/{channel}",
            post(start_handler).get(summary_handler).delete(stop_handler),
        )
        .route("/sessions/{channel}/join", post(join_handler))
        .route("/sessions/{channel}/frame.png", get(frame_handler))
        .route("/channels/{channel}", delete(retire_handler))
        .route("/ws/{channel}", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

async fn start_handler(
    State(state): State<Arc<AppState>>,
    Path(channel): Path<String>,
    Json(request): Json<StartRequest>,
) -> Result<(StatusCode, Json<SessionSummary>), SessionError> {
    let summary = state.registry.start_session(channel, request)?;
    Ok((StatusCode::CREATED, Json(summary)))
}

async fn join_handler(
    State(state): State<Arc<AppState>>,
    Path(channel): Path<String>,
    Json(request): Json<JoinRequest>,
) -> Result<Json<SessionSummary>, SessionError> {
    let summary = state
        .registry
        .join_session(&channel, request.player_id, request.name)?;
    Ok(Json(summary))
}

async fn summary_handler(
    State(state): State<Arc<AppState>>,
    Path(channel): Path<String>,
) -> Result<Json<SessionSummary>, SessionError> {
    state
        .registry
        .summary(&channel)
        .map(Json)
        .ok_or(SessionError::NotFound(channel))
}

async fn frame_handler(
    State(state): State<Arc<AppState>>,
    Path(channel): Path<String>,
) -> Result<Response, SessionError> {
    let frame = state
        .registry
        .render(&channel)
        .ok_or(SessionError::NotFound(channel))?;
    Ok(([(header::CONTENT_TYPE, "image/png")], frame.to_vec()).into_response())
}

async fn stop_handler(
    State(state): State<Arc<AppState>>,
    Path(channel): Path<String>,
) -> Result<StatusCode, SessionError> {
    state.registry.stop_session(&channel)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a channel. Its session ends on the next publish.
async fn retire_handler(
    State(state): State<Arc<AppState>>,
    Path(channel): Path<String>,
) -> StatusCode {
    if state.notifier.is_retired(&channel) {
        warn!("Channel {} was already removed", channel);
    } else {
        info!("Removing channel {}", channel);
    }
    state.notifier.retire(&channel);
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> (Arc<AppState>, Router) {
        let state = Arc::new(AppState::default());
        (state.clone(), router(state))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (_, app) = app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_then_conflict() {
        let (state, app) = app();
        let body = r#"{"player_id":"u1","name":"Ann","mode":"multiplayer"}"#;

        let response = app
            .clone()
            .oneshot(post_json("/sessions/general", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let summary = json(response).await;
        assert_eq!(summary["channel"], "general");
        assert_eq!(summary["mode"], "multiplayer");
        assert_eq!(summary["players"][0]["name"], "Ann");

        let response = app
            .oneshot(post_json("/sessions/general", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json(response).await["type"], "error");

        state.registry.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_and_frame() {
        let (state, app) = app();
        app.clone()
            .oneshot(post_json(
                "/sessions/duel",
                r#"{"player_id":"u1","name":"Ann","mode":"multiplayer"}"#,
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(post_json(
                "/sessions/duel/join",
                r#"{"player_id":"u2","name":"Ben"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["players"][1]["id"], "u2");

        let response = app
            .oneshot(
                Request::get("/sessions/duel/frame.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

        state.registry.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_session() {
        let (_, app) = app();
        let response = app
            .clone()
            .oneshot(Request::get("/sessions/none").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(
                Request::delete("/sessions/none")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_retire_channel() {
        let (state, app) = app();
        let response = app
            .clone()
            .oneshot(
                Request::delete("/channels/gone")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.notifier.is_retired("gone"));

        let response = app
            .oneshot(post_json(
                "/sessions/gone",
                r#"{"player_id":"u1","name":"Ann"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::GONE);
        assert_eq!(state.registry.session_count(), 0);
    }
}
