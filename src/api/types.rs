//! API request and response types

use crate::project::ProjectContext;
use crate::transcript::ChatSnapshot;
use serde::{Deserialize, Serialize};

/// Request to pick one of the options on screen
#[derive(Debug, Deserialize)]
pub struct SelectOptionRequest {
    pub option_id: String,
}

/// Request to focus the chat on a project, or clear the focus with `null`
#[derive(Debug, Deserialize)]
pub struct SetProjectRequest {
    #[serde(default)]
    pub project_id: Option<String>,
}

/// Response with a chat session and its current state
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub snapshot: ChatSnapshot,
}

/// Response for an accepted selection
#[derive(Debug, Serialize)]
pub struct SelectResponse {
    pub queued: bool,
}

/// Response for a project change
#[derive(Debug, Serialize)]
pub struct SetProjectResponse {
    /// False when the project already had focus
    pub changed: bool,
    pub project: Option<ProjectContext>,
}

/// Response with the project gallery
#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectContext>,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
