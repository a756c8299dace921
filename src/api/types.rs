//! API request and response types

use crate::conversation::{ConversationSnapshot, Language};
use crate::actions::NavigationTarget;
use serde::{Deserialize, Serialize};

/// Request to create a new conversation
#[derive(Debug, Default, Deserialize)]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub language: Option<Language>,
}

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// Request to reset a conversation
#[derive(Debug, Default, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub language: Option<Language>,
}

/// Response with a conversation snapshot
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub conversation: ConversationSnapshot,
}

/// Response for a turn started in the background
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub queued: bool,
}

#[derive(Debug, Serialize)]
pub struct LanguageResponse {
    pub language: Language,
}

/// Response for an executed action button
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    /// `None` for unknown actions
    pub target: Option<NavigationTarget>,
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
