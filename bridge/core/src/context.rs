//! Bridge Context
//!
//! The shared handle every track receives at construction. One context per
//! renderer session: it is created before any track loads and closed when
//! the session shuts down.
//!
//! ```text
//!                        BridgeContext (Arc)
//!        ┌──────────────┬───────────┬─────────────┬──────────────┐
//!        │ ActionRegistry│  UiSlot   │ BridgeState │  Lifecycle   │
//!        │ (name → desc) │ (setters) │ (mirror)    │ (readiness)  │
//!        └──────┬───────┴─────┬─────┴──────┬──────┴──────┬───────┘
//!               │             │            │             │
//!          Track::init   EventProcessor  tracks read  Dispatcher
//! ```
//!
//! The context mirrors what it last told the UI (chat history, partial
//! message, view) so tracks can read current state without querying the
//! rendering layer.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::actions::{ActionDescriptor, ActionRegistry};
use crate::error::{ActionError, BridgeError};
use crate::messages::{ChatHistoryItem, HostEvent, Notice, View};
use crate::processor::{Disposition, EventProcessor};
use crate::ui_bridge::{UiBridge, UiSlot};

/// Handler for a track-specific host event
pub type TrackEventHandler = Arc<dyn Fn(&Value) -> anyhow::Result<()> + Send + Sync>;

/// Session lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Tracks are loading; registration open, dispatch rejected
    Loading,
    /// All tracks loaded
    Ready,
    /// A track failed to load; the rest of the UI stays usable
    Degraded,
    /// Session shut down
    Closed,
}

impl Lifecycle {
    /// Whether actions may be dispatched
    #[must_use]
    pub fn accepts_dispatch(&self) -> bool {
        matches!(self, Self::Ready | Self::Degraded)
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Degraded => "degraded",
            Self::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// Mirror of the state last pushed to the UI
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BridgeState {
    /// Current chat history
    pub chat_history: Vec<ChatHistoryItem>,
    /// Current streaming buffer
    pub partial_message: Option<String>,
    /// Active view
    pub view: View,
}

struct ContextInner {
    actions: ActionRegistry,
    ui: UiSlot,
    state: RwLock<BridgeState>,
    lifecycle: RwLock<Lifecycle>,
    track_handlers: RwLock<HashMap<(String, String), Vec<TrackEventHandler>>>,
}

/// Shared context passed to every track
#[derive(Clone)]
pub struct BridgeContext {
    inner: Arc<ContextInner>,
}

impl Default for BridgeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeContext {
    /// Create a context in the `Loading` state
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ContextInner {
                actions: ActionRegistry::new(),
                ui: UiSlot::new(),
                state: RwLock::new(BridgeState::default()),
                lifecycle: RwLock::new(Lifecycle::Loading),
                track_handlers: RwLock::new(HashMap::new()),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Track surface
    // ------------------------------------------------------------------

    /// Register an action
    ///
    /// # Errors
    ///
    /// See [`ActionRegistry::register`].
    pub fn register_action(&self, descriptor: ActionDescriptor) -> Result<(), ActionError> {
        self.inner.actions.register(descriptor)
    }

    /// The action registry
    #[must_use]
    pub fn actions(&self) -> &ActionRegistry {
        &self.inner.actions
    }

    /// Switch the active view
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UiNotInstalled`] before the UI is wired.
    pub fn set_view(&self, view: View) -> Result<(), BridgeError> {
        let ui = self.ui()?;
        // Held across the setter so the mirror and the UI agree on the last view
        let mut state = self.inner.state.write();
        state.view = view;
        ui.set_view(view);
        Ok(())
    }

    /// Show a notice on the chat/action surface
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UiNotInstalled`] before the UI is wired.
    pub fn notify(&self, notice: Notice) -> Result<(), BridgeError> {
        self.ui()?.show_notice(notice);
        Ok(())
    }

    /// Subscribe to a track-specific host event
    pub fn on_track_event<F>(&self, track: impl Into<String>, name: impl Into<String>, handler: F)
    where
        F: Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let key = (track.into(), name.into());
        tracing::debug!(track = %key.0, event = %key.1, "Track event handler registered");
        self.inner
            .track_handlers
            .write()
            .entry(key)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Current chat history
    #[must_use]
    pub fn chat_history(&self) -> Vec<ChatHistoryItem> {
        self.inner.state.read().chat_history.clone()
    }

    /// Current streaming buffer
    #[must_use]
    pub fn partial_message(&self) -> Option<String> {
        self.inner.state.read().partial_message.clone()
    }

    /// Active view
    #[must_use]
    pub fn view(&self) -> View {
        self.inner.state.read().view
    }

    /// Snapshot of all mirrored UI state
    #[must_use]
    pub fn state(&self) -> BridgeState {
        self.inner.state.read().clone()
    }

    // ------------------------------------------------------------------
    // Rendering-layer surface
    // ------------------------------------------------------------------

    /// Install the rendering layer's setters
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UiAlreadyInstalled`] on a second call.
    pub fn install_ui(&self, ui: Arc<dyn UiBridge>) -> Result<(), BridgeError> {
        self.inner.ui.install(ui)
    }

    /// The installed UI
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UiNotInstalled`] before installation.
    pub fn ui(&self) -> Result<Arc<dyn UiBridge>, BridgeError> {
        self.inner.ui.get().cloned()
    }

    /// Apply a host-pushed event
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UiNotInstalled`] before installation.
    pub fn process_event(&self, event: HostEvent) -> Result<Disposition, BridgeError> {
        EventProcessor::new(self.clone()).process_event(event)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Current lifecycle
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        *self.inner.lifecycle.read()
    }

    /// Whether every track loaded
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.lifecycle() == Lifecycle::Ready
    }

    /// End the session: dispatch and registration are rejected afterwards
    pub fn close(&self) {
        *self.inner.lifecycle.write() = Lifecycle::Closed;
        self.inner.actions.seal();
        tracing::info!("Bridge context closed");
    }

    pub(crate) fn mark_ready(&self) {
        self.finish_loading(Lifecycle::Ready);
    }

    pub(crate) fn mark_degraded(&self) {
        self.finish_loading(Lifecycle::Degraded);
    }

    fn finish_loading(&self, next: Lifecycle) {
        {
            let mut lifecycle = self.inner.lifecycle.write();
            if *lifecycle != Lifecycle::Loading {
                tracing::warn!(current = %lifecycle, next = %next, "Ignoring late lifecycle change");
                return;
            }
            *lifecycle = next;
        }
        self.inner.actions.seal();
        tracing::info!(lifecycle = %next, actions = self.inner.actions.len(), "Track loading finished");
    }

    // ------------------------------------------------------------------
    // Event processor hooks
    // ------------------------------------------------------------------

    pub(crate) fn mirror_chat_history(&self, items: &[ChatHistoryItem]) {
        self.inner.state.write().chat_history = items.to_vec();
    }

    pub(crate) fn mirror_partial_message(&self, text: Option<&str>) {
        self.inner.state.write().partial_message = text.map(str::to_string);
    }

    pub(crate) fn track_handlers(&self, track: &str, name: &str) -> Vec<TrackEventHandler> {
        self.inner
            .track_handlers
            .read()
            .get(&(track.to_string(), name.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

impl fmt::Debug for BridgeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeContext")
            .field("lifecycle", &self.lifecycle())
            .field("actions", &self.inner.actions)
            .field("ui", &self.inner.ui)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct NullUi {
        notices: Mutex<Vec<Notice>>,
    }

    impl UiBridge for NullUi {
        fn set_chat_history(&self, _items: Vec<ChatHistoryItem>) {}
        fn set_partial_message(&self, _text: Option<String>) {}
        fn set_view(&self, _view: View) {}
        fn show_notice(&self, notice: Notice) {
            self.notices.lock().push(notice);
        }
    }

    #[test]
    fn test_new_context_is_loading() {
        let ctx = BridgeContext::new();
        assert_eq!(ctx.lifecycle(), Lifecycle::Loading);
        assert!(!ctx.is_ready());
        assert!(!ctx.lifecycle().accepts_dispatch());
        assert_eq!(ctx.view(), View::Prompt);
    }

    #[test]
    fn test_set_view_requires_ui() {
        let ctx = BridgeContext::new();
        assert_eq!(ctx.set_view(View::Chat), Err(BridgeError::UiNotInstalled));
        // State untouched when the setter fails
        assert_eq!(ctx.view(), View::Prompt);

        ctx.install_ui(Arc::new(NullUi::default())).unwrap();
        ctx.set_view(View::Chat).unwrap();
        assert_eq!(ctx.view(), View::Chat);
    }

    /// Remembers the last view it was told
    #[derive(Default)]
    struct LastViewUi {
        last: Mutex<Option<View>>,
    }

    impl UiBridge for LastViewUi {
        fn set_chat_history(&self, _items: Vec<ChatHistoryItem>) {}
        fn set_partial_message(&self, _text: Option<String>) {}
        fn set_view(&self, view: View) {
            *self.last.lock() = Some(view);
        }
        fn show_notice(&self, _notice: Notice) {}
    }

    #[test]
    fn test_concurrent_set_view_keeps_mirror_and_ui_in_step() {
        for _ in 0..500 {
            let ctx = BridgeContext::new();
            let ui = Arc::new(LastViewUi::default());
            ctx.install_ui(ui.clone()).unwrap();

            let barrier = Arc::new(std::sync::Barrier::new(2));
            let handles: Vec<_> = [View::Chat, View::Settings]
                .into_iter()
                .map(|view| {
                    let ctx = ctx.clone();
                    let barrier = barrier.clone();
                    std::thread::spawn(move || {
                        barrier.wait();
                        ctx.set_view(view).unwrap();
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(Some(ctx.view()), *ui.last.lock());
        }
    }

    #[test]
    fn test_notify_reaches_ui() {
        let ctx = BridgeContext::new();
        let ui = Arc::new(NullUi::default());
        ctx.install_ui(ui.clone()).unwrap();

        ctx.notify(Notice::error("host unreachable")).unwrap();
        assert_eq!(ui.notices.lock()[0].message, "host unreachable");
    }

    #[test]
    fn test_ready_seals_registry() {
        let ctx = BridgeContext::new();
        ctx.register_action(ActionDescriptor::new("chat")).unwrap();
        ctx.mark_ready();

        assert!(ctx.is_ready());
        assert!(ctx.actions().is_sealed());
        assert!(matches!(
            ctx.register_action(ActionDescriptor::new("late")),
            Err(ActionError::RegistrySealed { .. })
        ));
    }

    #[test]
    fn test_degraded_accepts_dispatch() {
        let ctx = BridgeContext::new();
        ctx.mark_degraded();
        assert_eq!(ctx.lifecycle(), Lifecycle::Degraded);
        assert!(ctx.lifecycle().accepts_dispatch());
        assert!(!ctx.is_ready());
    }

    #[test]
    fn test_lifecycle_only_leaves_loading_once() {
        let ctx = BridgeContext::new();
        ctx.mark_degraded();
        ctx.mark_ready();
        assert_eq!(ctx.lifecycle(), Lifecycle::Degraded);
    }

    #[test]
    fn test_close() {
        let ctx = BridgeContext::new();
        ctx.mark_ready();
        ctx.close();
        assert_eq!(ctx.lifecycle(), Lifecycle::Closed);
        assert!(!ctx.lifecycle().accepts_dispatch());
    }

    #[test]
    fn test_track_handlers_keyed_by_track_and_name() {
        let ctx = BridgeContext::new();
        ctx.on_track_event("chat", "typing", |_| Ok(()));
        ctx.on_track_event("chat", "typing", |_| Ok(()));
        ctx.on_track_event("notes", "typing", |_| Ok(()));

        assert_eq!(ctx.track_handlers("chat", "typing").len(), 2);
        assert_eq!(ctx.track_handlers("notes", "typing").len(), 1);
        assert!(ctx.track_handlers("chat", "other").is_empty());
    }

    #[test]
    fn test_clone_shares_state() {
        let ctx = BridgeContext::new();
        let clone = ctx.clone();
        clone.mirror_chat_history(&[ChatHistoryItem::user("hi")]);
        assert_eq!(ctx.chat_history(), vec![ChatHistoryItem::user("hi")]);
    }
}
