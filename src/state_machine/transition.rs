//! Pure state transition function

use super::{ChatContext, ChatState, Effect, Event};
use crate::flow::{resolve, Action, FlowId, FlowNode, RegistryKind, ResolveError, ROOT_FLOW};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Still delivering messages, options are not available yet")]
    StillDelivering,
    #[error("No options are on screen")]
    NoOptionsPending,
    #[error("Option {0:?} is not one of the current options")]
    UnknownOption(String),
    #[error("Option action {action} does not resolve: {source}")]
    UnresolvedAction {
        action: Action,
        #[source]
        source: ResolveError,
    },
    #[error("Flow {flow} is missing from the {registry:?} registry")]
    MissingFlow { registry: RegistryKind, flow: FlowId },
    #[error("Delivery of {flow}#{index} does not match the current state")]
    StaleDelivery { flow: FlowId, index: usize },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl TransitionError {
    /// Broken flow data rather than a visitor or timing issue
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            TransitionError::UnresolvedAction { .. } | TransitionError::MissingFlow { .. }
        )
    }
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs; timers,
/// message ids and timestamps are the runtime's business.
pub fn transition(
    state: &ChatState,
    context: &ChatContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Lifecycle
        // ============================================================

        // Any + Reset -> Reset (cancel first so no stale delivery survives)
        (_, Event::Reset) => Ok(TransitionResult::new(ChatState::Reset).with_effects([
            Effect::CancelDeliveries,
            Effect::ClearOptions,
            Effect::ClearTranscript,
            Effect::PublishState,
            Effect::BeginConversation,
        ])),

        // Reset + Start -> Delivering (root of the active registry)
        (ChatState::Reset, Event::Start) => enter(context, context.active_kind(), ROOT_FLOW),

        // ============================================================
        // Message delivery
        // ============================================================
        (
            ChatState::Delivering {
                registry,
                flow,
                next,
            },
            Event::DeliveryDue {
                flow: due_flow,
                index,
                ..
            },
        ) if *flow == due_flow && *next == index => deliver(context, *registry, *flow, index),

        (ChatState::Delivering { .. } | ChatState::Reset, Event::OptionSelected { .. }) => {
            Err(TransitionError::StillDelivering)
        }

        (_, Event::DeliveryDue { flow, index, .. }) => {
            Err(TransitionError::StaleDelivery { flow, index })
        }

        // ============================================================
        // Option selection
        // ============================================================
        (ChatState::AwaitingChoice { registry, flow }, Event::OptionSelected { option_id }) => {
            select(context, *registry, *flow, &option_id)
        }

        (ChatState::Idle, Event::OptionSelected { .. }) => Err(TransitionError::NoOptionsPending),

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {state:?} with event {event:?}"
        ))),
    }
}

fn node<'a>(
    context: &'a ChatContext,
    registry: RegistryKind,
    flow: FlowId,
) -> Result<&'a FlowNode, TransitionError> {
    context
        .registry(registry)
        .get(flow)
        .ok_or(TransitionError::MissingFlow { registry, flow })
}

/// Start delivering `flow` from its first message
fn enter(
    context: &ChatContext,
    registry: RegistryKind,
    flow: FlowId,
) -> Result<TransitionResult, TransitionError> {
    // Resolve against the registry actually used, which may differ from the
    // requested kind when no project registry is loaded.
    let registry = context.registry(registry).kind();
    node(context, registry, flow)?;

    Ok(TransitionResult::new(ChatState::Delivering {
        registry,
        flow,
        next: 0,
    })
    .with_effect(Effect::ScheduleDelivery {
        flow,
        index: 0,
        delay: context.delivery_delay,
    })
    .with_effect(Effect::PublishState))
}

/// Append message `index` of `flow`; chain the next one or finish the batch
fn deliver(
    context: &ChatContext,
    registry: RegistryKind,
    flow: FlowId,
    index: usize,
) -> Result<TransitionResult, TransitionError> {
    let node = node(context, registry, flow)?;
    let Some(text) = node.messages.get(index) else {
        return Err(TransitionError::StaleDelivery { flow, index });
    };

    let is_last = index + 1 == node.messages.len();
    let media = if is_last { node.media.clone() } else { vec![] };
    let message = Effect::bot_message(text.clone(), media);

    if !is_last {
        return Ok(TransitionResult::new(ChatState::Delivering {
            registry,
            flow,
            next: index + 1,
        })
        .with_effect(message)
        .with_effect(Effect::ScheduleDelivery {
            flow,
            index: index + 1,
            delay: context.delivery_delay,
        })
        .with_effect(Effect::PublishState));
    }

    if node.is_terminal() {
        return Ok(TransitionResult::new(ChatState::Idle)
            .with_effect(message)
            .with_effect(Effect::PublishState));
    }

    Ok(TransitionResult::new(ChatState::AwaitingChoice { registry, flow })
        .with_effect(message)
        .with_effect(Effect::ShowOptions {
            options: node.options.clone(),
        })
        .with_effect(Effect::PublishState))
}

/// Echo the chosen option and move to its target
fn select(
    context: &ChatContext,
    registry: RegistryKind,
    flow: FlowId,
    option_id: &str,
) -> Result<TransitionResult, TransitionError> {
    let current = node(context, registry, flow)?;
    let option = current
        .options
        .iter()
        .find(|o| o.id == option_id)
        .ok_or_else(|| TransitionError::UnknownOption(option_id.to_string()))?;

    // Resolve before touching the transcript: a dangling action is a no-op.
    let resolution = resolve(
        context.registry(registry),
        &context.default_registry,
        option.action,
    )
    .map_err(|source| TransitionError::UnresolvedAction {
        action: option.action,
        source,
    })?;

    let entered = enter(context, resolution.registry, resolution.flow)?;

    let mut result = TransitionResult::new(entered.new_state)
        .with_effect(Effect::ClearOptions)
        .with_effect(Effect::user_message(option.text.clone()));
    if resolution.fell_back {
        result = result.with_effect(Effect::ConfigurationFallback {
            action: option.action,
            landed_on: resolution.flow,
        });
    }
    Ok(result.with_effects(entered.effects))
}
