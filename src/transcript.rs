//! Chat transcript types exposed to the presentation layer

use crate::flow::ChatOption;
use crate::format::{MessageFormatter, Span};
use crate::state_machine::ChatState;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Bot,
    User,
}

/// A delivered message. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<String>,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>, media: Vec<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
            media,
        }
    }
}

/// A message plus its formatted spans and resolved media paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMessage {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub spans: Vec<Span>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<String>,
}

impl RenderedMessage {
    pub fn render(message: &Message, formatter: &MessageFormatter) -> Self {
        Self {
            id: message.id.clone(),
            text: message.text.clone(),
            sender: message.sender,
            timestamp: message.timestamp,
            spans: formatter.format(&message.text),
            media: message
                .media
                .iter()
                .map(|file| formatter.asset_path(file))
                .collect(),
        }
    }
}

/// Everything the presentation layer needs to draw the chat
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatSnapshot {
    pub messages: Vec<RenderedMessage>,
    pub pending_options: Vec<ChatOption>,
    pub is_delivering: bool,
    pub state: ChatState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}
