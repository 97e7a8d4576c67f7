//! Effects produced by state transitions

use crate::flow::{Action, ChatOption, FlowId};
use crate::transcript::Sender;
use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Cancel every scheduled delivery of the current conversation
    CancelDeliveries,

    /// Drop all messages from the transcript
    ClearTranscript,

    /// Feed `Event::Start` back into the machine
    BeginConversation,

    /// Arm a timer that fires `Event::DeliveryDue` after `delay`
    ScheduleDelivery {
        flow: FlowId,
        index: usize,
        delay: Duration,
    },

    /// Append a message to the transcript
    AppendMessage {
        sender: Sender,
        text: String,
        media: Vec<String>,
    },

    /// Put options on screen
    ShowOptions { options: Vec<ChatOption> },

    /// Take options off screen
    ClearOptions,

    /// Publish the new state to observers
    PublishState,

    /// A project-only action was taken with no project registry loaded
    ConfigurationFallback { action: Action, landed_on: FlowId },
}

impl Effect {
    pub fn bot_message(text: impl Into<String>, media: Vec<String>) -> Self {
        Effect::AppendMessage {
            sender: Sender::Bot,
            text: text.into(),
            media,
        }
    }

    pub fn user_message(text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            sender: Sender::User,
            text: text.into(),
            media: vec![],
        }
    }

    #[cfg(test)]
    pub fn is_bot_message(&self) -> bool {
        matches!(
            self,
            Effect::AppendMessage {
                sender: Sender::Bot,
                ..
            }
        )
    }

    #[cfg(test)]
    pub fn is_user_message(&self) -> bool {
        matches!(
            self,
            Effect::AppendMessage {
                sender: Sender::User,
                ..
            }
        )
    }
}
