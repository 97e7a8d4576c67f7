//! Flow identifiers and option actions

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Every dialogue state known to the chatbot.
///
/// The default registry and project registries share this id space; which
/// ids a registry actually contains is checked when the registry is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowId {
    Welcome,
    About,
    Experience,
    CurrentRole,
    EarlierRoles,
    Skills,
    Projects,
    FeaturedWork,
    Blog,
    Contact,
    // Project flows
    ProjectWelcome,
    Overview,
    Process,
    Planning,
    DesignPhase,
    Implementation,
    Launch,
    Technologies,
    Challenges,
    Outcome,
    Gallery,
}

impl FlowId {
    pub const ALL: [FlowId; 21] = [
        FlowId::Welcome,
        FlowId::About,
        FlowId::Experience,
        FlowId::CurrentRole,
        FlowId::EarlierRoles,
        FlowId::Skills,
        FlowId::Projects,
        FlowId::FeaturedWork,
        FlowId::Blog,
        FlowId::Contact,
        FlowId::ProjectWelcome,
        FlowId::Overview,
        FlowId::Process,
        FlowId::Planning,
        FlowId::DesignPhase,
        FlowId::Implementation,
        FlowId::Launch,
        FlowId::Technologies,
        FlowId::Challenges,
        FlowId::Outcome,
        FlowId::Gallery,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FlowId::Welcome => "welcome",
            FlowId::About => "about",
            FlowId::Experience => "experience",
            FlowId::CurrentRole => "current_role",
            FlowId::EarlierRoles => "earlier_roles",
            FlowId::Skills => "skills",
            FlowId::Projects => "projects",
            FlowId::FeaturedWork => "featured_work",
            FlowId::Blog => "blog",
            FlowId::Contact => "contact",
            FlowId::ProjectWelcome => "project_welcome",
            FlowId::Overview => "overview",
            FlowId::Process => "process",
            FlowId::Planning => "planning",
            FlowId::DesignPhase => "design_phase",
            FlowId::Implementation => "implementation",
            FlowId::Launch => "launch",
            FlowId::Technologies => "technologies",
            FlowId::Challenges => "challenges",
            FlowId::Outcome => "outcome",
            FlowId::Gallery => "gallery",
        }
    }

    /// Flows that only make sense while a project is in focus
    pub fn is_project_only(self) -> bool {
        matches!(
            self,
            FlowId::ProjectWelcome
                | FlowId::Overview
                | FlowId::Process
                | FlowId::Planning
                | FlowId::DesignPhase
                | FlowId::Implementation
                | FlowId::Launch
                | FlowId::Technologies
                | FlowId::Challenges
                | FlowId::Outcome
                | FlowId::Gallery
        )
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown flow action: {0:?}")]
pub struct UnknownAction(pub String);

impl FromStr for FlowId {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FlowId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// Wire name of the reserved return-to-root action
pub const BACK_TO_MAIN: &str = "back_to_main";

/// What selecting an option does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Move to a node of the registry the current node belongs to
    Goto(FlowId),
    /// Jump to the default registry's root, leaving any project framing behind
    BackToMain,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Goto(id) => id.as_str(),
            Action::BackToMain => BACK_TO_MAIN,
        }
    }
}

impl From<FlowId> for Action {
    fn from(id: FlowId) -> Self {
        Action::Goto(id)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == BACK_TO_MAIN {
            Ok(Action::BackToMain)
        } else {
            s.parse().map(Action::Goto)
        }
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
