//! Events that can occur in a chat

use crate::flow::FlowId;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Lifecycle events
    /// Mount, project change, or the visitor asking for a fresh conversation
    Reset,
    /// Reset finished; enter the root of the active registry
    Start,

    // Timer events
    DeliveryDue {
        flow: FlowId,
        index: usize,
        /// Scheduler generation the timer was armed in
        generation: u64,
    },

    // Visitor events
    OptionSelected { option_id: String },
}
