use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::models::chat::{ConversationResponse, SendMessageRequest, SendMessageResponse};
use crate::services::Gateway;
use crate::utils::{ApiError, ValidatedJson};

/// POST /api/v1/messages
pub async fn send_message(
    State(gateway): State<Arc<Gateway>>,
    ValidatedJson(request): ValidatedJson<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let saved = gateway
        .send_message(&request.user_id, &request.platform, &request.message)
        .await?;

    Ok(Json(SendMessageResponse {
        reply: saved.bot_reply,
    }))
}

/// GET /api/v1/messages/{user_id}
pub async fn get_conversation(
    State(gateway): State<Arc<Gateway>>,
    Path(user_id): Path<String>,
) -> Result<Json<ConversationResponse>, ApiError> {
    if user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("User ID is required".to_string()));
    }

    let conversation = gateway.conversation(&user_id).await?;

    Ok(Json(ConversationResponse {
        user_id,
        conversation,
    }))
}

/// GET /api/v1/messages/ (no user id segment)
pub async fn missing_user_id() -> ApiError {
    ApiError::BadRequest("User ID is required".to_string())
}
