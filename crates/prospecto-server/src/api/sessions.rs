//! Analysis session handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use prospecto_analysis::{SessionAction, SessionSnapshot};
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::RequestId;
use crate::sessions::SharedSession;

use super::{map_analysis_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct CreatedSession {
    pub id: Uuid,
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
}

async fn resolve_session(
    state: &AppState,
    request_id: &str,
    id: Uuid,
) -> Result<SharedSession, ApiError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| ApiError::new(request_id, "not_found", format!("session {id} not found")))
}

pub(super) async fn create_session(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> (StatusCode, Json<ApiResponse<CreatedSession>>) {
    let (id, session) = state.sessions.create().await;
    let snapshot = session.lock().await.snapshot();
    (
        StatusCode::CREATED,
        Json(ApiResponse {
            data: CreatedSession { id, snapshot },
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}

pub(super) async fn get_session(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SessionSnapshot>>, ApiError> {
    let session = resolve_session(&state, &req_id.0, id).await?;
    let snapshot = session.lock().await.snapshot();
    Ok(Json(ApiResponse {
        data: snapshot,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn delete_session(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(id).await {
        tracing::info!(session_id = %id, "session deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("session {id} not found"),
        ))
    }
}

/// Applies one action. Provider failures are reported inside the snapshot's
/// `last_error`; only rejected actions produce an error response.
pub(super) async fn post_action(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(action): Json<SessionAction>,
) -> Result<Json<ApiResponse<SessionSnapshot>>, ApiError> {
    let session = resolve_session(&state, &req_id.0, id).await?;
    tracing::debug!(session_id = %id, action = action.name(), "dispatching session action");

    let snapshot = state
        .analyzer
        .dispatch(&session, action)
        .await
        .map_err(|e| map_analysis_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: snapshot,
        meta: ResponseMeta::new(req_id.0),
    }))
}
