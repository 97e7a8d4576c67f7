//! Flow registry: validated dialogue graph plus the pure resolver

use super::id::{Action, FlowId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;

/// Entry node of every registry
pub const ROOT_FLOW: FlowId = FlowId::Welcome;

/// Which registry a node was loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryKind {
    Default,
    Project,
}

/// A selectable reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatOption {
    pub id: String,
    pub text: String,
    pub action: Action,
}

impl ChatOption {
    pub fn new(text: impl Into<String>, action: impl Into<Action>) -> Self {
        let action = action.into();
        Self {
            id: action.as_str().to_string(),
            text: text.into(),
            action,
        }
    }

    pub fn back_to_main() -> Self {
        Self::new("Back to main menu", Action::BackToMain)
    }
}

/// One step of the scripted conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowNode {
    pub id: FlowId,
    pub messages: Vec<String>,
    pub options: Vec<ChatOption>,
    /// Images attached to the last delivered message
    pub media: Vec<String>,
}

impl FlowNode {
    pub fn new(id: FlowId) -> Self {
        Self {
            id,
            messages: vec![],
            options: vec![],
            media: vec![],
        }
    }

    pub fn message(mut self, text: impl Into<String>) -> Self {
        self.messages.push(text.into());
        self
    }

    pub fn option(mut self, text: impl Into<String>, action: impl Into<Action>) -> Self {
        self.options.push(ChatOption::new(text, action));
        self
    }

    pub fn with_option(mut self, option: ChatOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_options(mut self, options: impl IntoIterator<Item = ChatOption>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn media(mut self, image: impl Into<String>) -> Self {
        self.media.push(image.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.options.is_empty()
    }
}

/// Problems detected while building a registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("registry has no root node ({ROOT_FLOW})")]
    MissingRoot,
    #[error("flow {0} is defined more than once")]
    DuplicateNode(FlowId),
    #[error("flow {0} has no messages")]
    EmptyNode(FlowId),
    #[error("flow {node} has more than one option with id {option:?}")]
    DuplicateOption { node: FlowId, option: String },
    #[error("option {option:?} of flow {node} targets {target}, which is not in the registry")]
    DanglingAction {
        node: FlowId,
        option: String,
        target: FlowId,
    },
}

/// Lookup failure for an option action
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("flow {target} not found in the {registry:?} registry")]
    NotFound {
        target: FlowId,
        registry: RegistryKind,
    },
}

/// Immutable set of flow nodes keyed by id
#[derive(Debug, Clone)]
pub struct Registry {
    kind: RegistryKind,
    nodes: HashMap<FlowId, FlowNode>,
}

impl Registry {
    /// Build a registry, rejecting graphs with missing or dangling nodes.
    pub fn new(
        kind: RegistryKind,
        nodes: impl IntoIterator<Item = FlowNode>,
    ) -> Result<Self, RegistryError> {
        let mut map = HashMap::new();
        for node in nodes {
            if node.messages.is_empty() {
                return Err(RegistryError::EmptyNode(node.id));
            }
            let mut option_ids = HashSet::new();
            for option in &node.options {
                if !option_ids.insert(option.id.as_str()) {
                    return Err(RegistryError::DuplicateOption {
                        node: node.id,
                        option: option.id.clone(),
                    });
                }
            }
            let id = node.id;
            if map.insert(id, node).is_some() {
                return Err(RegistryError::DuplicateNode(id));
            }
        }

        if !map.contains_key(&ROOT_FLOW) {
            return Err(RegistryError::MissingRoot);
        }

        for node in map.values() {
            for option in &node.options {
                if let Action::Goto(target) = option.action {
                    if !map.contains_key(&target) {
                        return Err(RegistryError::DanglingAction {
                            node: node.id,
                            option: option.id.clone(),
                            target,
                        });
                    }
                }
            }
        }

        let registry = Self { kind, nodes: map };
        let reachable = registry.reachable();
        if reachable.len() < registry.len() {
            let orphans: Vec<FlowId> = registry
                .nodes()
                .map(|n| n.id)
                .filter(|id| !reachable.contains(id))
                .collect();
            tracing::warn!(?kind, ?orphans, "Flow nodes unreachable from the root");
        }
        Ok(registry)
    }

    /// Skip validation, for exercising how broken flow data is handled
    #[cfg(test)]
    pub fn unchecked(kind: RegistryKind, nodes: impl IntoIterator<Item = FlowNode>) -> Self {
        Self {
            kind,
            nodes: nodes.into_iter().map(|n| (n.id, n)).collect(),
        }
    }

    pub fn kind(&self) -> RegistryKind {
        self.kind
    }

    pub fn root(&self) -> &FlowNode {
        // Presence checked in `new`
        &self.nodes[&ROOT_FLOW]
    }

    pub fn get(&self, id: FlowId) -> Option<&FlowNode> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &FlowNode> {
        self.nodes.values()
    }

    /// Ids reachable from the root without leaving this registry
    pub fn reachable(&self) -> BTreeSet<FlowId> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![ROOT_FLOW];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(&id) {
                for option in &node.options {
                    if let Action::Goto(target) = option.action {
                        stack.push(target);
                    }
                }
            }
        }
        seen
    }
}

/// Where an action lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub registry: RegistryKind,
    pub flow: FlowId,
    /// A project-only action was taken without a project registry
    pub fell_back: bool,
}

/// Resolve `action` taken from a node of `current`.
///
/// `back_to_main` always lands on the default root, even from a project
/// registry. A project-only target asked of the default registry falls back to
/// the default root as well.
pub fn resolve(
    current: &Registry,
    default: &Registry,
    action: Action,
) -> Result<Resolution, ResolveError> {
    match action {
        Action::BackToMain => Ok(Resolution {
            registry: default.kind(),
            flow: default.root().id,
            fell_back: false,
        }),
        Action::Goto(target) if current.get(target).is_some() => Ok(Resolution {
            registry: current.kind(),
            flow: target,
            fell_back: false,
        }),
        Action::Goto(target)
            if current.kind() == RegistryKind::Default && target.is_project_only() =>
        {
            Ok(Resolution {
                registry: default.kind(),
                flow: default.root().id,
                fell_back: true,
            })
        }
        Action::Goto(target) => Err(ResolveError::NotFound {
            target,
            registry: current.kind(),
        }),
    }
}
