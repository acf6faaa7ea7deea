//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{ActionResponse, CommitRequest, DraftTextRequest, ErrorResponse, IntakeResponse};
use super::AppState;
use crate::runtime::{DispatchError, IntakeHandle};
use crate::state_machine::Event;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session lifecycle
        .route("/api/intakes", post(create_intake))
        .route("/api/intakes/:id", get(get_intake).delete(delete_intake))
        .route("/api/intakes/:id/stream", get(stream_intake))
        // Subject actions
        .route("/api/intakes/:id/commit", post(commit))
        .route("/api/intakes/:id/capture/start", post(start_capture))
        .route("/api/intakes/:id/capture/cancel", post(cancel_capture))
        .route("/api/intakes/:id/draft", post(update_draft))
        .route("/api/intakes/:id/draft/edit", post(begin_edit))
        .route("/api/intakes/:id/draft/confirm", post(end_edit))
        .route("/api/intakes/:id/draft/clear", post(clear_draft))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session Lifecycle
// ============================================================

async fn create_intake(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<IntakeResponse>), AppError> {
    let handle = state
        .sessions
        .create()
        .await
        .map_err(|e| AppError::Unavailable(e.to_string()))?;
    Ok((
        StatusCode::CREATED,
        Json(IntakeResponse {
            intake: handle.snapshot(),
        }),
    ))
}

async fn get_intake(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<IntakeResponse>, AppError> {
    let handle = find(&state, &id).await?;
    Ok(Json(IntakeResponse {
        intake: handle.snapshot(),
    }))
}

async fn delete_intake(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Intake not found: {id}")))
    }
}

async fn stream_intake(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let handle = find(&state, &id).await?;
    // Subscribe before taking the snapshot so no event falls in between
    let events = handle.subscribe();
    Ok(sse_stream(handle.snapshot(), events))
}

// ============================================================
// Subject Actions
// ============================================================

async fn commit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<CommitRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let event = match request.text {
        Some(text) => Event::Commit { text },
        None => Event::SubmitDraft,
    };
    send(&state, &id, event).await
}

async fn start_capture(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    send(&state, &id, Event::StartCapture).await
}

async fn cancel_capture(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    send(&state, &id, Event::CancelCapture).await
}

async fn update_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<DraftTextRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    send(&state, &id, Event::UpdateText { text: req.text }).await
}

async fn begin_edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    send(&state, &id, Event::BeginEdit).await
}

async fn end_edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    send(&state, &id, Event::EndEdit).await
}

async fn clear_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    send(&state, &id, Event::ClearDraft).await
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("medintake ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Helpers
// ============================================================

async fn find(state: &AppState, id: &str) -> Result<IntakeHandle, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Intake not found: {id}")))
}

/// Dispatch an event; rejected input is reported, not treated as an error
async fn send(state: &AppState, id: &str, event: Event) -> Result<Json<ActionResponse>, AppError> {
    let handle = find(state, id).await?;
    match handle.dispatch(event).await {
        Ok(()) => Ok(Json(ActionResponse::accepted())),
        Err(DispatchError::Rejected(reason)) => Ok(Json(ActionResponse::rejected(reason.to_string()))),
        Err(e @ DispatchError::Closed) => Err(AppError::Internal(e.to_string())),
    }
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    NotFound(String),
    Unavailable(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
