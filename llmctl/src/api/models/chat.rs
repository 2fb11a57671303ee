//! API request/response models for the chat session.

use crate::chat::ChatMessage;
use crate::types::ModelId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub content: String,
    /// Model to address; defaults to the current default model
    pub model: Option<ModelId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendMessageResponse {
    /// The user message as appended to the transcript
    pub message: ChatMessage,
    /// The model the reply will come from
    pub model: ModelId,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TranscriptResponse {
    pub messages: Vec<ChatMessage>,
    /// Whether an assistant reply is still being produced
    pub pending: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CancelResponse {
    /// Whether a pending reply was cancelled
    pub cancelled: bool,
}
