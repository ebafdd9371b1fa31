use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::database::models::Message;

// ===== REQUEST MODELS =====
// Missing fields deserialize to "" so they surface as 400s, not 422s.

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "platform is required"))]
    pub platform: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "message is required"))]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StartSessionRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "platform is required"))]
    pub platform: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EndSessionRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "session_id is required"))]
    pub session_id: String,
}

// ===== RESPONSE MODELS =====

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub reply: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub user_id: String,
    pub conversation: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
