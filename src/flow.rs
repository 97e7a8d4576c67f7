//! Flow registry
//!
//! Declarative dialogue graphs: a default registry about the author and a
//! generator for project-focused registries. Lookups are pure.

mod content;
pub mod id;
mod project_flows;
pub mod registry;

pub use content::default_registry;
pub use id::{Action, FlowId};
pub use project_flows::build_project_registry;
pub use registry::{
    resolve, ChatOption, FlowNode, Registry, RegistryError, RegistryKind, ResolveError,
    ROOT_FLOW,
};
