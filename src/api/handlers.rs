//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ErrorResponse, ProjectListResponse, SelectOptionRequest, SelectResponse, SessionResponse,
    SetProjectRequest, SetProjectResponse, SuccessResponse,
};
use super::AppState;
use crate::project::{find_project, gallery};
use crate::runtime::{SessionHandle, SseEvent};
use crate::state_machine::Event;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use thiserror::Error;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session lifecycle
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        // SSE streaming
        .route("/api/sessions/:id/stream", get(stream_session))
        // Visitor actions
        .route("/api/sessions/:id/select", post(select_option))
        .route("/api/sessions/:id/reset", post(reset_session))
        .route("/api/sessions/:id/project", put(set_project))
        // Project gallery
        .route("/api/projects", get(list_projects))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

/// Look up a live session and mark it as in use
async fn session(state: &AppState, id: &str) -> Result<SessionHandle, AppError> {
    let handle = state
        .sessions
        .get(id)
        .await
        .filter(|handle| !handle.is_closed())
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))?;
    handle.touch();
    Ok(handle)
}

// ============================================================
// Session Lifecycle
// ============================================================

async fn create_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let (session_id, handle) = state.sessions.create().await;
    Json(SessionResponse {
        session_id,
        snapshot: handle.snapshot(),
    })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = session(&state, &id).await?;
    Ok(Json(SessionResponse {
        session_id: id,
        snapshot: handle.snapshot(),
    }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.sessions.remove(&id).await {
        return Err(AppError::NotFound(format!("Session not found: {id}")));
    }
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// SSE Streaming
// ============================================================

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let handle = session(&state, &id).await?;

    // Subscribe before reading the snapshot so nothing falls in between
    let broadcast_rx = handle.subscribe();
    let init_event = SseEvent::Init {
        snapshot: handle.snapshot(),
    };

    Ok(sse_stream(init_event, broadcast_rx))
}

// ============================================================
// Visitor Actions
// ============================================================

async fn select_option(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SelectOptionRequest>,
) -> Result<Json<SelectResponse>, AppError> {
    let handle = session(&state, &id).await?;

    let snapshot = handle.snapshot();
    if snapshot.is_delivering {
        return Err(AppError::Conflict(
            "Messages are still being delivered".to_string(),
        ));
    }
    if !snapshot
        .pending_options
        .iter()
        .any(|o| o.id == req.option_id)
    {
        return Err(AppError::Unprocessable(format!(
            "Option is not on screen: {}",
            req.option_id
        )));
    }

    handle
        .send(Event::OptionSelected {
            option_id: req.option_id,
        })
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(SelectResponse { queued: true }))
}

async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let handle = session(&state, &id).await?;
    handle.send(Event::Reset).await.map_err(AppError::Internal)?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn set_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetProjectRequest>,
) -> Result<Json<SetProjectResponse>, AppError> {
    let handle = session(&state, &id).await?;

    let project = match req.project_id {
        Some(project_id) => Some(
            find_project(&project_id)
                .ok_or_else(|| AppError::NotFound(format!("Project not found: {project_id}")))?,
        ),
        None => None,
    };

    let changed = handle.set_project(project);
    tracing::debug!(session_id = %id, changed, "Project focus updated");

    Ok(Json(SetProjectResponse {
        changed,
        project: handle.project(),
    }))
}

// ============================================================
// Project Gallery
// ============================================================

async fn list_projects() -> Json<ProjectListResponse> {
    Json(ProjectListResponse {
        projects: gallery().to_vec(),
    })
}

async fn get_version() -> &'static str {
    concat!("portfolio-chat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug, Error)]
enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));
        (status, body).into_response()
    }
}
