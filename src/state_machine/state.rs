//! Dialogue state types

use crate::flow::{FlowId, Registry, RegistryKind};
use crate::project::ProjectContext;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Default pause before each bot message, simulating typing
pub const DEFAULT_DELIVERY_DELAY: Duration = Duration::from_millis(1000);

/// Dialogue state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatState {
    /// Nothing to deliver and nothing to choose (before mount, or at a leaf)
    #[default]
    Idle,

    /// Conversation cleared, about to enter the root node
    Reset,

    /// Appending the messages of `flow` one at a time
    Delivering {
        registry: RegistryKind,
        flow: FlowId,
        /// Index of the message that is scheduled next
        next: usize,
    },

    /// All messages of `flow` delivered, its options are on screen
    AwaitingChoice { registry: RegistryKind, flow: FlowId },
}

impl ChatState {
    pub fn is_delivering(&self) -> bool {
        matches!(self, ChatState::Delivering { .. } | ChatState::Reset)
    }

    /// The node the conversation is currently at, if any
    pub fn current_flow(&self) -> Option<(RegistryKind, FlowId)> {
        match self {
            ChatState::Delivering { registry, flow, .. }
            | ChatState::AwaitingChoice { registry, flow } => Some((*registry, *flow)),
            ChatState::Idle | ChatState::Reset => None,
        }
    }
}

/// Context for a chat (registries and configuration; replaced on project change)
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub session_id: String,
    pub default_registry: Arc<Registry>,
    pub project_registry: Option<Arc<Registry>>,
    pub project: Option<ProjectContext>,
    pub delivery_delay: Duration,
}

impl ChatContext {
    pub fn new(session_id: impl Into<String>, default_registry: Arc<Registry>) -> Self {
        Self {
            session_id: session_id.into(),
            default_registry,
            project_registry: None,
            project: None,
            delivery_delay: DEFAULT_DELIVERY_DELAY,
        }
    }

    pub fn with_delivery_delay(mut self, delay: Duration) -> Self {
        self.delivery_delay = delay;
        self
    }

    #[cfg(test)]
    pub fn with_project(mut self, project: ProjectContext, registry: Arc<Registry>) -> Self {
        self.set_project(project, registry);
        self
    }

    pub fn set_project(&mut self, project: ProjectContext, registry: Arc<Registry>) {
        self.project = Some(project);
        self.project_registry = Some(registry);
    }

    pub fn clear_project(&mut self) {
        self.project = None;
        self.project_registry = None;
    }

    /// Registry a fresh conversation starts in
    pub fn active_kind(&self) -> RegistryKind {
        if self.project_registry.is_some() {
            RegistryKind::Project
        } else {
            RegistryKind::Default
        }
    }

    /// Registry for `kind`; without a project registry this is the default one.
    pub fn registry(&self, kind: RegistryKind) -> &Registry {
        match (kind, &self.project_registry) {
            (RegistryKind::Project, Some(project)) => project,
            _ => &self.default_registry,
        }
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project.as_ref().map(|p| p.id.as_str())
    }
}
