//! Chat runtime executor

use super::scheduler::DeliveryScheduler;
use super::traits::FlowCatalog;
use super::SseEvent;

use crate::flow::ChatOption;
use crate::format::MessageFormatter;
use crate::project::ProjectContext;
use crate::state_machine::{transition, ChatContext, ChatState, Effect, Event, TransitionError};
use crate::transcript::{ChatSnapshot, Message, RenderedMessage};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Owns one chat: its state, transcript, on-screen options and timers
pub struct ChatRuntime<C>
where
    C: FlowCatalog + 'static,
{
    context: ChatContext,
    state: ChatState,
    catalog: Arc<C>,
    formatter: MessageFormatter,
    transcript: Vec<RenderedMessage>,
    pending_options: Vec<ChatOption>,
    scheduler: DeliveryScheduler,
    event_rx: mpsc::Receiver<Event>,
    project_rx: watch::Receiver<Option<ProjectContext>>,
    snapshot_tx: watch::Sender<ChatSnapshot>,
    broadcast_tx: broadcast::Sender<SseEvent>,
    shutdown: CancellationToken,
}

impl<C> ChatRuntime<C>
where
    C: FlowCatalog + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        context: ChatContext,
        catalog: Arc<C>,
        formatter: MessageFormatter,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::Sender<Event>,
        project_rx: watch::Receiver<Option<ProjectContext>>,
        snapshot_tx: watch::Sender<ChatSnapshot>,
        broadcast_tx: broadcast::Sender<SseEvent>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            context,
            state: ChatState::Idle,
            catalog,
            formatter,
            transcript: Vec::new(),
            pending_options: Vec::new(),
            scheduler: DeliveryScheduler::new(event_tx),
            event_rx,
            project_rx,
            snapshot_tx,
            broadcast_tx,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.context.session_id, "Starting chat runtime");

        // Mount: pick up a project selected before the chat existed
        let initial = self.project_rx.borrow_and_update().clone();
        self.apply_project(initial);
        self.handle(Event::Reset);

        let mut watching_project = true;
        loop {
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => break,

                changed = self.project_rx.changed(), if watching_project => {
                    if changed.is_err() {
                        // Selection dropped; the current context stays
                        watching_project = false;
                        continue;
                    }
                    let project = self.project_rx.borrow_and_update().clone();
                    if self.apply_project(project) {
                        self.handle(Event::Reset);
                    }
                }

                Some(event) = self.event_rx.recv() => self.handle(event),

                else => break,
            }
        }

        // Unmount
        let cancelled = self.scheduler.cancel_all();
        tracing::info!(
            session_id = %self.context.session_id,
            cancelled,
            "Chat runtime stopped"
        );
    }

    /// Swap registries for a new project context. Returns false when the
    /// project identity did not change.
    fn apply_project(&mut self, project: Option<ProjectContext>) -> bool {
        let new_id = project.as_ref().map(|p| p.id.as_str());
        if new_id == self.context.project_id() {
            return false;
        }

        match project {
            None => {
                tracing::info!(session_id = %self.context.session_id, "Project context cleared");
                self.context.clear_project();
            }
            Some(project) => match self.catalog.project_registry(&project) {
                Ok(registry) => {
                    tracing::info!(
                        session_id = %self.context.session_id,
                        project_id = %project.id,
                        "Project context set"
                    );
                    self.context.set_project(project, registry);
                }
                Err(e) => {
                    tracing::error!(
                        session_id = %self.context.session_id,
                        project_id = %project.id,
                        error = %e,
                        "Project flows failed validation, staying on the default registry"
                    );
                    self.context.clear_project();
                }
            },
        }
        true
    }

    fn handle(&mut self, event: Event) {
        if let Err(e) = self.process_event(event) {
            match &e {
                e if e.is_configuration_error() => {
                    tracing::error!(
                        session_id = %self.context.session_id,
                        error = %e,
                        "Flow data defect, event ignored"
                    );
                }
                TransitionError::StaleDelivery { .. } => {
                    tracing::debug!(error = %e, "Dropping stale delivery");
                }
                _ => {
                    tracing::debug!(
                        session_id = %self.context.session_id,
                        at = ?self.state.current_flow(),
                        error = %e,
                        "Event rejected"
                    );
                }
            }
        }
        self.publish_snapshot();
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        // Timers armed before the last reset must never reach the transcript
        if let Event::DeliveryDue {
            flow,
            index,
            generation,
        } = &event
        {
            if !self.scheduler.is_current(*generation) {
                tracing::debug!(
                    %flow,
                    index,
                    generation,
                    current = self.scheduler.generation(),
                    "Discarding delivery from a cancelled conversation"
                );
                return Ok(());
            }
        }

        // Chained effects (Reset -> Start) are processed in a loop
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            // Pure state transition
            let result = transition(&self.state, &self.context, current_event)?;
            self.state = result.new_state;

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect) {
                    events_to_process.push(generated_event);
                }
            }
        }

        Ok(())
    }

    fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::CancelDeliveries => {
                let cancelled = self.scheduler.cancel_all();
                if cancelled > 0 {
                    tracing::debug!(
                        session_id = %self.context.session_id,
                        cancelled,
                        generation = self.scheduler.generation(),
                        "Cancelled pending deliveries"
                    );
                }
                None
            }

            Effect::ClearTranscript => {
                self.transcript.clear();
                let _ = self.broadcast_tx.send(SseEvent::Cleared);
                None
            }

            Effect::BeginConversation => Some(Event::Start),

            Effect::ScheduleDelivery { flow, index, delay } => {
                self.scheduler.schedule(flow, index, delay);
                tracing::trace!(
                    %flow,
                    index,
                    pending = self.scheduler.pending(),
                    "Delivery scheduled"
                );
                None
            }

            Effect::AppendMessage {
                sender,
                text,
                media,
            } => {
                let message = Message::new(sender, text, media);
                let rendered = RenderedMessage::render(&message, &self.formatter);
                self.transcript.push(rendered.clone());
                let _ = self
                    .broadcast_tx
                    .send(SseEvent::Message { message: rendered });
                None
            }

            Effect::ShowOptions { options } => {
                self.pending_options = options;
                let _ = self.broadcast_tx.send(SseEvent::Options {
                    options: self.pending_options.clone(),
                });
                None
            }

            Effect::ClearOptions => {
                if !self.pending_options.is_empty() {
                    self.pending_options.clear();
                    let _ = self
                        .broadcast_tx
                        .send(SseEvent::Options { options: vec![] });
                }
                None
            }

            Effect::PublishState => {
                let _ = self.broadcast_tx.send(SseEvent::StateChange {
                    state: self.state.clone(),
                });
                None
            }

            Effect::ConfigurationFallback { action, landed_on } => {
                tracing::warn!(
                    session_id = %self.context.session_id,
                    %action,
                    %landed_on,
                    "Project-only action without a project context, falling back"
                );
                None
            }
        }
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx.send_replace(ChatSnapshot {
            messages: self.transcript.clone(),
            pending_options: self.pending_options.clone(),
            is_delivering: self.state.is_delivering(),
            state: self.state.clone(),
            project_id: self.context.project_id().map(ToString::to_string),
        });
    }
}
