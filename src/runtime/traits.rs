//! Trait abstractions for the runtime's flow data
//!
//! These traits enable testing the executor with small synthetic registries.

use crate::flow::{build_project_registry, default_registry, Registry, RegistryError};
use crate::project::ProjectContext;
use std::sync::Arc;

/// Source of the registries a chat runs on
pub trait FlowCatalog: Send + Sync {
    /// Registry used when no project is in focus
    fn default_registry(&self) -> Arc<Registry>;

    /// Registry for a focused project
    fn project_registry(&self, project: &ProjectContext) -> Result<Arc<Registry>, RegistryError>;
}

/// The portfolio's own conversation content
pub struct PortfolioFlows {
    default: Arc<Registry>,
}

impl PortfolioFlows {
    pub fn new(author: &str) -> Result<Self, RegistryError> {
        Ok(Self {
            default: Arc::new(default_registry(author)?),
        })
    }
}

impl FlowCatalog for PortfolioFlows {
    fn default_registry(&self) -> Arc<Registry> {
        Arc::clone(&self.default)
    }

    fn project_registry(&self, project: &ProjectContext) -> Result<Arc<Registry>, RegistryError> {
        build_project_registry(project).map(Arc::new)
    }
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

impl<T: FlowCatalog + ?Sized> FlowCatalog for Arc<T> {
    fn default_registry(&self) -> Arc<Registry> {
        (**self).default_registry()
    }

    fn project_registry(&self, project: &ProjectContext) -> Result<Arc<Registry>, RegistryError> {
        (**self).project_registry(project)
    }
}
