//! Display State Types
//!
//! The TUI is a thin client: it renders what the bridge tells it to. The
//! bridge calls [`ChannelUi`] setters from the event pump and from action
//! tasks; each call becomes a [`DisplayUpdate`] queued to the render loop,
//! which folds it into [`DisplayState`].
//!
//! Setters never touch terminal state directly, so they stay cheap and
//! non-blocking no matter which task calls them.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::mpsc;

use bridge_core::{ChatHistoryItem, MessageRole, Notice, NotifyLevel, UiBridge, View};

/// How many notices stay on screen at once
const MAX_NOTICES: usize = 3;

/// How long a notice stays visible
const NOTICE_TTL: Duration = Duration::from_secs(6);

/// A setter call queued for the render loop
#[derive(Clone, Debug, PartialEq)]
pub enum DisplayUpdate {
    /// Replace the chat history
    ChatHistory(Vec<ChatHistoryItem>),
    /// Replace the streaming buffer
    PartialMessage(Option<String>),
    /// Switch view
    View(View),
    /// Show a notice
    Notice(Notice),
}

/// [`UiBridge`] that forwards every setter call over a channel
#[derive(Clone, Debug)]
pub struct ChannelUi {
    tx: mpsc::UnboundedSender<DisplayUpdate>,
}

impl ChannelUi {
    /// Create the bridge and the receiver the render loop drains
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DisplayUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, update: DisplayUpdate) {
        if self.tx.send(update).is_err() {
            tracing::debug!("Render loop gone, dropping display update");
        }
    }
}

impl UiBridge for ChannelUi {
    fn set_chat_history(&self, items: Vec<ChatHistoryItem>) {
        self.forward(DisplayUpdate::ChatHistory(items));
    }

    fn set_partial_message(&self, text: Option<String>) {
        self.forward(DisplayUpdate::PartialMessage(text));
    }

    fn set_view(&self, view: View) {
        self.forward(DisplayUpdate::View(view));
    }

    fn show_notice(&self, notice: Notice) {
        self.forward(DisplayUpdate::Notice(notice));
    }
}

/// Display role for chat lines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayRole {
    /// User input
    User,
    /// Assistant response
    Assistant,
    /// System message
    System,
}

impl From<MessageRole> for DisplayRole {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => DisplayRole::User,
            MessageRole::Assistant => DisplayRole::Assistant,
            MessageRole::System => DisplayRole::System,
        }
    }
}

impl DisplayRole {
    /// Get the prefix for this role
    pub fn prefix(&self) -> &'static str {
        match self {
            DisplayRole::User => "You: ",
            DisplayRole::Assistant => "Assistant: ",
            DisplayRole::System => "",
        }
    }
}

/// A notice plus its remaining screen time
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayNotice {
    /// The notice
    pub notice: Notice,
    /// Time left before it disappears
    pub remaining: Duration,
}

impl DisplayNotice {
    /// Whether this notice reports a failure
    pub fn is_error(&self) -> bool {
        self.notice.level == NotifyLevel::Error
    }
}

/// Everything the renderer draws
#[derive(Clone, Debug, Default)]
pub struct DisplayState {
    /// Chat history as last pushed
    pub chat_history: Vec<ChatHistoryItem>,
    /// Streaming buffer
    pub partial_message: Option<String>,
    /// Active view
    pub view: View,
    /// Visible notices, oldest first
    pub notices: VecDeque<DisplayNotice>,
    /// Actions in flight
    pub pending_actions: usize,
}

impl DisplayState {
    /// Create empty display state
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a queued setter call into the state
    pub fn apply(&mut self, update: DisplayUpdate) {
        match update {
            DisplayUpdate::ChatHistory(items) => self.chat_history = items,
            DisplayUpdate::PartialMessage(text) => self.partial_message = text,
            DisplayUpdate::View(view) => self.view = view,
            DisplayUpdate::Notice(notice) => {
                if self.notices.len() == MAX_NOTICES {
                    self.notices.pop_front();
                }
                self.notices.push_back(DisplayNotice {
                    notice,
                    remaining: NOTICE_TTL,
                });
            }
        }
    }

    /// Age notices by `delta`, dropping expired ones
    pub fn update(&mut self, delta: Duration) {
        for notice in &mut self.notices {
            notice.remaining = notice.remaining.saturating_sub(delta);
        }
        self.notices.retain(|n| !n.remaining.is_zero());
    }

    /// Whether the assistant is mid-response
    pub fn is_streaming(&self) -> bool {
        self.partial_message.is_some()
    }

    /// Whether anything is waiting on the host
    pub fn is_busy(&self) -> bool {
        self.pending_actions > 0 || self.is_streaming()
    }

    /// Status bar text for the current state
    pub fn status(&self) -> &'static str {
        if self.is_streaming() {
            "Responding"
        } else if self.pending_actions > 0 {
            "Thinking"
        } else {
            "Ready"
        }
    }
}
