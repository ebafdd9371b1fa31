use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::database::models::ChatSession;
use crate::models::chat::{
    EndSessionRequest, StartSessionRequest, StartSessionResponse, StatusMessage,
};
use crate::services::Gateway;
use crate::utils::{ApiError, ValidatedJson};

/// POST /api/v1/session/start
pub async fn start_session(
    State(gateway): State<Arc<Gateway>>,
    ValidatedJson(request): ValidatedJson<StartSessionRequest>,
) -> Result<Json<StartSessionResponse>, ApiError> {
    let session = gateway
        .start_session(&request.user_id, &request.platform)
        .await?;

    Ok(Json(StartSessionResponse {
        session_id: session.session_id.to_string(),
        message: "Session started".to_string(),
    }))
}

/// POST /api/v1/session/end
pub async fn end_session(
    State(gateway): State<Arc<Gateway>>,
    ValidatedJson(request): ValidatedJson<EndSessionRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    let session_id = Uuid::parse_str(&request.session_id)
        .map_err(|_| ApiError::BadRequest("session_id must be a valid UUID".to_string()))?;

    gateway.end_session(session_id, &request.user_id).await?;

    Ok(Json(StatusMessage::new("Session ended")))
}

/// GET /api/v1/session/active/{user_id}
pub async fn active_session(
    State(gateway): State<Arc<Gateway>>,
    Path(user_id): Path<String>,
) -> Result<Json<ChatSession>, ApiError> {
    gateway
        .active_session(&user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No active session for user {}", user_id)))
}
