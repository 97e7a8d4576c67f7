//! Project context provider
//!
//! The gallery selection is the single writer; chat runtimes only read the
//! current value and react when the selected project's identity changes.

mod catalog;

pub use catalog::{find_project, gallery};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// A portfolio project that the chat can be focused on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectContext {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub tags: Vec<String>,
    pub year: u16,
    pub category: String,
}

/// Writer half of the project context.
///
/// Only changes of project identity are published, so re-selecting the
/// project that is already active does not restart the conversation.
#[derive(Debug)]
pub struct ProjectSelection {
    tx: watch::Sender<Option<ProjectContext>>,
}

impl ProjectSelection {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Focus the chat on `project`. Returns true if the identity changed.
    pub fn select(&self, project: ProjectContext) -> bool {
        self.tx.send_if_modified(|current| {
            if current.as_ref().is_some_and(|p| p.id == project.id) {
                return false;
            }
            *current = Some(project);
            true
        })
    }

    /// Drop the project focus. Returns true if a project was selected.
    pub fn clear(&self) -> bool {
        self.tx.send_if_modified(|current| current.take().is_some())
    }

    pub fn current(&self) -> Option<ProjectContext> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ProjectContext>> {
        self.tx.subscribe()
    }
}

impl Default for ProjectSelection {
    fn default() -> Self {
        Self::new()
    }
}
