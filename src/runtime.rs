//! Runtime for running chats
//!
//! Every chat session gets its own task, event channel and delivery timers.
//! Handlers talk to a chat only through its [`SessionHandle`].

mod executor;
mod scheduler;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use traits::*;

use executor::ChatRuntime;

use crate::flow::ChatOption;
use crate::format::MessageFormatter;
use crate::project::{ProjectContext, ProjectSelection};
use crate::state_machine::{ChatContext, ChatState, Event};
use crate::transcript::{ChatSnapshot, RenderedMessage};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init { snapshot: ChatSnapshot },
    Message { message: RenderedMessage },
    Options { options: Vec<ChatOption> },
    StateChange { state: ChatState },
    Cleared,
}

/// Handle to interact with a running chat
#[derive(Clone)]
pub struct SessionHandle {
    pub event_tx: mpsc::Sender<Event>,
    pub broadcast_tx: broadcast::Sender<SseEvent>,
    snapshot_rx: watch::Receiver<ChatSnapshot>,
    project: Arc<ProjectSelection>,
    shutdown: CancellationToken,
    last_activity: Arc<Mutex<Instant>>,
}

impl SessionHandle {
    /// State as of the last processed event
    pub fn snapshot(&self) -> ChatSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn watch_snapshot(&self) -> watch::Receiver<ChatSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SseEvent> {
        self.broadcast_tx.subscribe()
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.event_tx
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {e}"))
    }

    /// Focus the chat on a project, or clear the focus with `None`.
    /// Returns true if the project identity changed.
    pub fn set_project(&self, project: Option<ProjectContext>) -> bool {
        match project {
            Some(project) => self.project.select(project),
            None => self.project.clear(),
        }
    }

    pub fn project(&self) -> Option<ProjectContext> {
        self.project.current()
    }

    /// Stop the chat and every pending delivery
    pub fn close(&self) {
        self.shutdown.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Record visitor activity
    pub fn touch(&self) {
        if let Ok(mut last) = self.last_activity.lock() {
            *last = Instant::now();
        }
    }

    /// Time since the last visitor activity
    pub fn idle_for(&self) -> Duration {
        self.last_activity
            .lock()
            .map(|last| last.elapsed())
            .unwrap_or_default()
    }

    /// True while an SSE client is connected
    pub fn is_streaming(&self) -> bool {
        self.broadcast_tx.receiver_count() > 0
    }
}

/// Start a chat runtime in the background
pub fn spawn_chat<C>(
    session_id: &str,
    catalog: Arc<C>,
    delivery_delay: Duration,
    formatter: MessageFormatter,
) -> (SessionHandle, JoinHandle<()>)
where
    C: FlowCatalog + 'static,
{
    let context = ChatContext::new(session_id, catalog.default_registry())
        .with_delivery_delay(delivery_delay);

    let (event_tx, event_rx) = mpsc::channel(32);
    let (broadcast_tx, _) = broadcast::channel(128);
    let (snapshot_tx, snapshot_rx) = watch::channel(ChatSnapshot::default());
    let project = Arc::new(ProjectSelection::new());
    let shutdown = CancellationToken::new();

    let runtime = ChatRuntime::new(
        context,
        catalog,
        formatter,
        event_rx,
        event_tx.clone(),
        project.subscribe(),
        snapshot_tx,
        broadcast_tx.clone(),
        shutdown.clone(),
    );

    let id = session_id.to_string();
    let task = tokio::spawn(async move {
        runtime.run().await;
        tracing::info!(session_id = %id, "Chat runtime finished");
    });

    let handle = SessionHandle {
        event_tx,
        broadcast_tx,
        snapshot_rx,
        project,
        shutdown,
        last_activity: Arc::new(Mutex::new(Instant::now())),
    };
    (handle, task)
}

/// Manager for all chat sessions
pub struct SessionManager<C>
where
    C: FlowCatalog + 'static,
{
    catalog: Arc<C>,
    delivery_delay: Duration,
    formatter: MessageFormatter,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl<C> SessionManager<C>
where
    C: FlowCatalog + 'static,
{
    pub fn new(catalog: C, delivery_delay: Duration, asset_root: impl Into<String>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            delivery_delay,
            formatter: MessageFormatter::new(asset_root),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Mount a new chat. It starts on the default registry's root.
    pub async fn create(&self) -> (String, SessionHandle) {
        let session_id = uuid::Uuid::new_v4().to_string();
        let (handle, _task) = spawn_chat(
            &session_id,
            Arc::clone(&self.catalog),
            self.delivery_delay,
            self.formatter.clone(),
        );

        // Wait for the mount so the first snapshot already shows the reset
        let mut mounted = handle.watch_snapshot();
        let _ = mounted.changed().await;

        let active = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(session_id.clone(), handle.clone());
            sessions.len()
        };

        tracing::info!(session_id = %session_id, active, "Chat session created");
        (session_id, handle)
    }

    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Unmount a chat. Returns false if no such session exists.
    pub async fn remove(&self, session_id: &str) -> bool {
        let Some(handle) = self.sessions.write().await.remove(session_id) else {
            return false;
        };
        handle.close();
        tracing::info!(session_id = %session_id, "Chat session closed");
        true
    }

    /// Close sessions nobody has used for `ttl`. A connected SSE stream
    /// counts as activity. Returns how many were closed.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|session_id, handle| {
            if handle.is_closed() {
                return false;
            }
            if handle.is_streaming() {
                handle.touch();
                return true;
            }
            let idle = handle.idle_for();
            if idle < ttl {
                return true;
            }
            handle.close();
            tracing::info!(
                session_id = %session_id,
                idle_secs = idle.as_secs(),
                "Idle chat session closed"
            );
            false
        });
        before - sessions.len()
    }

    /// Periodically evict idle sessions until the manager is dropped
    pub fn spawn_sweeper(self: &Arc<Self>, ttl: Duration) -> JoinHandle<()> {
        let manager = Arc::downgrade(self);
        let period = (ttl / 4).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                let evicted = manager.evict_idle(ttl).await;
                if evicted > 0 {
                    let active = manager.sessions.read().await.len();
                    tracing::debug!(evicted, active, "Swept idle chat sessions");
                }
            }
        })
    }

    /// Close every session
    pub async fn shutdown(&self) {
        let mut sessions = self.sessions.write().await;
        for handle in sessions.values() {
            handle.close();
        }
        let closed = sessions.len();
        sessions.clear();
        tracing::info!(closed, "All chat sessions closed");
    }
}
