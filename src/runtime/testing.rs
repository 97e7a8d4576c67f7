//! Mock implementations for testing
//!
//! These mocks drive a real chat runtime over small synthetic registries.

use super::traits::*;
use super::{spawn_chat, SessionHandle};
use crate::flow::{
    build_project_registry, default_registry, Action, FlowId, FlowNode, Registry, RegistryError,
    RegistryKind,
};
use crate::format::MessageFormatter;
use crate::project::ProjectContext;
use crate::state_machine::Event;
use crate::transcript::{ChatSnapshot, RenderedMessage, Sender};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Delay used by [`TestChat`]
pub const TEST_DELAY: Duration = Duration::from_millis(1000);

// ============================================================================
// Mock Flow Catalog
// ============================================================================

/// Catalog with a small default registry:
///
/// - welcome: "Hello", "Pick one" / about, contact
/// - about: three messages, media on the last / back to main
/// - contact: one message, no options
pub struct MockFlows {
    default: Arc<Registry>,
    reject_projects: bool,
}

#[allow(dead_code)]
impl MockFlows {
    pub fn new() -> Self {
        let registry = Registry::new(
            RegistryKind::Default,
            [
                FlowNode::new(FlowId::Welcome)
                    .message("Hello")
                    .message("Pick one")
                    .option("Our story", FlowId::About)
                    .option("Say hi", FlowId::Contact),
                FlowNode::new(FlowId::About)
                    .message("a1")
                    .message("a2")
                    .message("a3")
                    .media("story.png")
                    .option("Back to main menu", Action::BackToMain),
                FlowNode::new(FlowId::Contact).message("Write me"),
            ],
        )
        .unwrap();
        Self::with_default(registry)
    }

    /// The real portfolio conversation
    pub fn portfolio() -> Self {
        Self::with_default(default_registry("Sam").unwrap())
    }

    pub fn with_default(registry: Registry) -> Self {
        Self {
            default: Arc::new(registry),
            reject_projects: false,
        }
    }

    /// Every project registry fails validation
    pub fn rejecting_projects(mut self) -> Self {
        self.reject_projects = true;
        self
    }
}

impl FlowCatalog for MockFlows {
    fn default_registry(&self) -> Arc<Registry> {
        Arc::clone(&self.default)
    }

    fn project_registry(&self, project: &ProjectContext) -> Result<Arc<Registry>, RegistryError> {
        if self.reject_projects {
            return Err(RegistryError::MissingRoot);
        }
        build_project_registry(project).map(Arc::new)
    }
}

// ============================================================================
// Test Chat Harness
// ============================================================================

/// Builder for a chat running on mocks
pub struct TestChat {
    flows: MockFlows,
    delay: Duration,
}

#[allow(dead_code)]
impl TestChat {
    pub fn new() -> Self {
        Self {
            flows: MockFlows::new(),
            delay: TEST_DELAY,
        }
    }

    pub fn flows(mut self, flows: MockFlows) -> Self {
        self.flows = flows;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn build(self) -> RunningChat {
        let (handle, task) = spawn_chat(
            "test-chat",
            Arc::new(self.flows),
            self.delay,
            MessageFormatter::new("/images"),
        );
        RunningChat { handle, task }
    }
}

/// A spawned chat plus helpers for observing it
pub struct RunningChat {
    pub handle: SessionHandle,
    task: JoinHandle<()>,
}

#[allow(dead_code)]
impl RunningChat {
    pub fn snapshot(&self) -> ChatSnapshot {
        self.handle.snapshot()
    }

    pub fn messages(&self) -> Vec<RenderedMessage> {
        self.snapshot().messages
    }

    pub fn texts(&self) -> Vec<(Sender, String)> {
        self.messages()
            .into_iter()
            .map(|m| (m.sender, m.text))
            .collect()
    }

    pub fn option_ids(&self) -> Vec<String> {
        self.snapshot()
            .pending_options
            .into_iter()
            .map(|o| o.id)
            .collect()
    }

    pub async fn select(&self, option_id: &str) {
        self.handle
            .send(Event::OptionSelected {
                option_id: option_id.to_string(),
            })
            .await
            .unwrap();
        settle().await;
    }

    pub async fn set_project(&self, project: Option<ProjectContext>) -> bool {
        let changed = self.handle.set_project(project);
        settle().await;
        changed
    }

    /// Advance virtual time by `ms`, letting due deliveries run
    pub async fn advance(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        settle().await;
    }

    /// Wait until options are on screen and nothing is being delivered
    pub async fn wait_for_options(&self) -> ChatSnapshot {
        self.wait_for(|s| !s.is_delivering && !s.pending_options.is_empty())
            .await
    }

    pub async fn wait_for(&self, predicate: impl Fn(&ChatSnapshot) -> bool) -> ChatSnapshot {
        let mut rx = self.handle.watch_snapshot();
        let snapshot = tokio::time::timeout(Duration::from_secs(120), rx.wait_for(predicate))
            .await
            .expect("timed out waiting for snapshot")
            .expect("chat runtime stopped");
        (*snapshot).clone()
    }

    /// Close the chat and wait for its task to finish
    pub async fn close(self) {
        self.handle.close();
        self.task.await.unwrap();
    }
}

/// Let the runtime drain whatever is already queued
async fn settle() {
    // With paused time the clock only moves once every task is idle
    tokio::time::sleep(Duration::from_millis(1)).await;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::ChatOption;
    use crate::project::find_project;
    use crate::runtime::{SessionManager, SseEvent};
    use crate::state_machine::ChatState;

    fn bot(text: &str) -> (Sender, String) {
        (Sender::Bot, text.to_string())
    }

    fn user(text: &str) -> (Sender, String) {
        (Sender::User, text.to_string())
    }

    /// Root messages arrive one per delay, options only after the last
    #[tokio::test(start_paused = true)]
    async fn test_mount_delivers_root_with_delay() {
        let chat = TestChat::new().build();

        chat.advance(500).await;
        let snapshot = chat.snapshot();
        assert!(snapshot.messages.is_empty());
        assert!(snapshot.is_delivering);

        chat.advance(600).await;
        assert_eq!(chat.texts(), vec![bot("Hello")]);
        assert!(chat.option_ids().is_empty());

        chat.advance(1000).await;
        assert_eq!(chat.texts(), vec![bot("Hello"), bot("Pick one")]);
        assert_eq!(chat.option_ids(), vec!["about", "contact"]);
        assert_eq!(
            chat.snapshot().state,
            ChatState::AwaitingChoice {
                registry: RegistryKind::Default,
                flow: FlowId::Welcome,
            }
        );
    }

    /// The echo is appended before the target's first message is due
    #[tokio::test(start_paused = true)]
    async fn test_selection_echoes_before_bot_messages() {
        let chat = TestChat::new().build();
        chat.wait_for_options().await;

        chat.select("about").await;
        let snapshot = chat.snapshot();
        assert_eq!(snapshot.messages.last().unwrap().sender, Sender::User);
        assert_eq!(snapshot.messages.last().unwrap().text, "Our story");
        assert!(snapshot.pending_options.is_empty());
        assert!(snapshot.is_delivering);

        chat.advance(1000).await;
        assert_eq!(chat.texts().last(), Some(&bot("a1")));

        let snapshot = chat.wait_for_options().await;
        let texts: Vec<_> = snapshot.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["Hello", "Pick one", "Our story", "a1", "a2", "a3"]
        );
        // Media only on the final message of the batch
        assert!(snapshot.messages[3].media.is_empty());
        assert!(snapshot.messages[4].media.is_empty());
        assert_eq!(snapshot.messages[5].media, vec!["/images/story.png"]);
        assert_eq!(snapshot.pending_options, vec![ChatOption::back_to_main()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_selection_ignored_while_delivering() {
        let chat = TestChat::new().build();
        chat.advance(1100).await;

        chat.select("about").await;
        assert_eq!(chat.texts(), vec![bot("Hello")]);

        let snapshot = chat.wait_for_options().await;
        assert_eq!(snapshot.messages.len(), 2);
        assert!(snapshot.messages.iter().all(|m| m.sender == Sender::Bot));
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_main_restarts_root_without_clearing() {
        let chat = TestChat::new().build();
        chat.wait_for_options().await;
        chat.select("about").await;
        chat.wait_for_options().await;

        chat.select("back_to_main").await;
        let snapshot = chat.wait_for_options().await;
        let tail: Vec<_> = snapshot.messages[6..]
            .iter()
            .map(|m| (m.sender, m.text.clone()))
            .collect();
        assert_eq!(
            tail,
            vec![user("Back to main menu"), bot("Hello"), bot("Pick one")]
        );
    }

    /// A visitor reset mid-batch drops what was still due
    #[tokio::test(start_paused = true)]
    async fn test_reset_mid_delivery_discards_remaining_messages() {
        let chat = TestChat::new().build();
        chat.wait_for_options().await;
        chat.select("about").await;
        chat.advance(1100).await;
        assert_eq!(chat.texts().last(), Some(&bot("a1")));

        chat.handle.send(Event::Reset).await.unwrap();
        chat.wait_for_options().await;
        assert_eq!(chat.texts(), vec![bot("Hello"), bot("Pick one")]);

        chat.advance(5000).await;
        let texts = chat.texts();
        assert_eq!(texts, vec![bot("Hello"), bot("Pick one")]);
        assert!(!texts.contains(&bot("a2")) && !texts.contains(&bot("a3")));
        assert_eq!(chat.option_ids(), vec!["about", "contact"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_node_goes_idle() {
        let chat = TestChat::new().build();
        chat.wait_for_options().await;
        chat.select("contact").await;

        let snapshot = chat.wait_for(|s| s.state == ChatState::Idle).await;
        assert_eq!(snapshot.messages.last().unwrap().text, "Write me");
        assert!(snapshot.pending_options.is_empty());
        assert!(!snapshot.is_delivering);
    }

    /// Switching projects mid-delivery leaves nothing from the old batch
    #[tokio::test(start_paused = true)]
    async fn test_project_change_cancels_pending_deliveries() {
        let chat = TestChat::new().build();
        chat.advance(1100).await;
        assert_eq!(chat.texts(), vec![bot("Hello")]);

        let project = find_project("play2").unwrap();
        let expected = build_project_registry(&project).unwrap().root().messages.clone();
        assert!(chat.set_project(Some(project)).await);

        let snapshot = chat.snapshot();
        assert!(snapshot.messages.is_empty());
        assert!(snapshot.pending_options.is_empty());
        assert_eq!(snapshot.project_id.as_deref(), Some("play2"));

        let snapshot = chat.wait_for_options().await;
        let texts: Vec<_> = snapshot.messages.iter().map(|m| m.text.clone()).collect();
        assert_eq!(texts, expected);
        assert!(!texts.iter().any(|t| t == "Pick one"));
        assert_eq!(
            snapshot.state,
            ChatState::AwaitingChoice {
                registry: RegistryKind::Project,
                flow: FlowId::Welcome,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reselecting_same_project_keeps_conversation() {
        let chat = TestChat::new().build();
        let project = find_project("ledgerly").unwrap();
        chat.set_project(Some(project.clone())).await;
        let before = chat.wait_for_options().await;

        assert!(!chat.set_project(Some(project)).await);
        chat.advance(5000).await;
        assert_eq!(chat.snapshot().messages, before.messages);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_project_returns_to_default_root() {
        let chat = TestChat::new().build();
        chat.set_project(find_project("driftwood")).await;
        chat.wait_for_options().await;

        assert!(chat.set_project(None).await);
        let snapshot = chat.wait_for_options().await;
        assert_eq!(snapshot.project_id, None);
        assert_eq!(chat.texts(), vec![bot("Hello"), bot("Pick one")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_main_leaves_project_registry() {
        let chat = TestChat::new().build();
        chat.set_project(find_project("play2")).await;
        chat.wait_for_options().await;

        chat.select("back_to_main").await;
        let snapshot = chat.wait_for_options().await;
        assert_eq!(
            snapshot.state,
            ChatState::AwaitingChoice {
                registry: RegistryKind::Default,
                flow: FlowId::Welcome,
            }
        );
        // The project stays in focus; only the registry in use changed
        assert_eq!(snapshot.project_id.as_deref(), Some("play2"));
        assert_eq!(chat.option_ids(), vec!["about", "contact"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_project_registry_stays_on_default() {
        let chat = TestChat::new()
            .flows(MockFlows::new().rejecting_projects())
            .build();
        chat.wait_for_options().await;

        chat.set_project(find_project("play2")).await;
        let snapshot = chat.wait_for_options().await;
        assert_eq!(snapshot.project_id, None);
        assert_eq!(chat.texts(), vec![bot("Hello"), bot("Pick one")]);
    }

    /// Broken flow data never reaches the visitor
    #[tokio::test(start_paused = true)]
    async fn test_unresolved_action_is_noop() {
        let broken = Registry::unchecked(
            RegistryKind::Default,
            [FlowNode::new(FlowId::Welcome)
                .message("Hello")
                .option("Skills", FlowId::Skills)],
        );
        let chat = TestChat::new()
            .flows(MockFlows::with_default(broken))
            .build();
        let before = chat.wait_for_options().await;

        chat.select("skills").await;
        chat.advance(5000).await;
        let after = chat.snapshot();
        assert_eq!(after.messages, before.messages);
        assert_eq!(after.pending_options, before.pending_options);
        assert_eq!(after.state, before.state);
    }

    #[tokio::test(start_paused = true)]
    async fn test_broadcast_order_on_selection() {
        let chat = TestChat::new().build();
        chat.wait_for_options().await;
        let mut rx = chat.handle.subscribe();

        chat.select("about").await;

        match rx.recv().await.unwrap() {
            SseEvent::Options { options } => assert!(options.is_empty()),
            other => panic!("expected options, got {other:?}"),
        }
        match rx.recv().await.unwrap() {
            SseEvent::Message { message } => {
                assert_eq!(message.sender, Sender::User);
                assert_eq!(message.text, "Our story");
            }
            other => panic!("expected message, got {other:?}"),
        }
        match rx.recv().await.unwrap() {
            SseEvent::StateChange { state } => assert!(state.is_delivering()),
            other => panic!("expected state change, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_stops_deliveries() {
        let chat = TestChat::new().build();
        chat.advance(1100).await;
        let handle = chat.handle.clone();
        chat.close().await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(handle.snapshot().messages.len(), 1);
        assert!(handle.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_portfolio_featured_work_scenario() {
        let chat = TestChat::new().flows(MockFlows::portfolio()).build();
        chat.wait_for_options().await;
        chat.select("projects").await;
        chat.wait_for_options().await;
        chat.select("featured_work").await;

        let snapshot = chat.wait_for_options().await;
        let featured: Vec<_> = snapshot
            .messages
            .iter()
            .skip_while(|m| m.text != "Featured work")
            .collect();
        assert_eq!(featured[0].sender, Sender::User);
        assert!(featured.last().unwrap().media[0].starts_with("/images/"));
        assert!(chat.option_ids().contains(&"back_to_main".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_manager_lifecycle() {
        let manager = SessionManager::new(MockFlows::new(), TEST_DELAY, "/images");
        let (id, handle) = manager.create().await;
        assert!(manager.get(&id).await.is_some());
        assert!(handle.snapshot().is_delivering);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(handle.snapshot().messages.len(), 1);

        assert!(manager.remove(&id).await);
        assert!(!manager.remove(&id).await);
        assert!(manager.get(&id).await.is_none());
        assert!(handle.is_closed());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(handle.snapshot().messages.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_are_evicted() {
        let manager = Arc::new(SessionManager::new(MockFlows::new(), TEST_DELAY, "/images"));
        let ttl = Duration::from_secs(60);
        let sweeper = manager.spawn_sweeper(ttl);

        let mut abandoned = Vec::new();
        for _ in 0..3 {
            abandoned.push(manager.create().await);
        }
        let (active_id, active) = manager.create().await;

        tokio::time::sleep(Duration::from_secs(40)).await;
        active.touch();
        tokio::time::sleep(Duration::from_secs(40)).await;

        for (id, handle) in &abandoned {
            assert!(manager.get(id).await.is_none());
            assert!(handle.is_closed());
        }
        assert!(manager.get(&active_id).await.is_some());
        assert!(!active.is_closed());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(manager.get(&active_id).await.is_none());
        assert!(active.is_closed());
        sweeper.abort();
    }

    /// An open SSE stream keeps its session; the TTL starts once it is gone
    #[tokio::test(start_paused = true)]
    async fn test_streaming_session_is_not_evicted() {
        let manager = SessionManager::new(MockFlows::new(), TEST_DELAY, "/images");
        let ttl = Duration::from_secs(60);
        let (id, handle) = manager.create().await;
        let stream = handle.subscribe();

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(manager.evict_idle(ttl).await, 0);
        assert!(manager.get(&id).await.is_some());

        drop(stream);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(manager.evict_idle(ttl).await, 0);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(manager.evict_idle(ttl).await, 1);
        assert!(manager.get(&id).await.is_none());
        assert!(handle.is_closed());
    }
}
