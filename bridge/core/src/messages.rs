//! Host Events
//!
//! Events pushed from the host process to the renderer. The host owns the
//! conversation; the renderer only mirrors what it is told.
//!
//! # Wire shape
//!
//! Every payload is a JSON object carrying a `kind` discriminator:
//!
//! ```json
//! { "kind": "chat_history", "items": [{ "role": "user", "content": "hi" }] }
//! { "kind": "partial_message", "text": "Thinking about" }
//! { "kind": "set_view", "view": "chat" }
//! { "kind": "track", "track": "chat", "name": "typing", "payload": {} }
//! ```
//!
//! The transport guarantees in-order, at-least-once delivery per session.
//! There is no dedup key at this layer: every event is a full replacement of
//! the state it targets, so a duplicate is harmless.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events from Host to Renderer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostEvent {
    /// Full chat history snapshot (replaces the renderer copy)
    ChatHistory {
        /// Ordered chat items
        items: Vec<ChatHistoryItem>,
    },

    /// Streaming buffer update (`None` = no stream in progress)
    PartialMessage {
        /// Current partial response text
        #[serde(default)]
        text: Option<String>,
    },

    /// Switch the active top-level view
    SetView {
        /// The view to show
        view: View,
    },

    /// Track-specific custom event
    Track {
        /// Track that owns the event
        track: String,
        /// Event name within the track
        name: String,
        /// Arbitrary payload
        #[serde(default)]
        payload: Value,
    },

    /// User-visible notification
    Notice {
        /// Severity
        #[serde(default)]
        level: NotifyLevel,
        /// Optional title
        #[serde(default)]
        title: Option<String>,
        /// Message body
        message: String,
    },
}

impl HostEvent {
    /// Discriminators the renderer understands
    pub const KNOWN_KINDS: &'static [&'static str] = &[
        "chat_history",
        "partial_message",
        "set_view",
        "track",
        "notice",
    ];

    /// The `kind` discriminator of this event
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ChatHistory { .. } => "chat_history",
            Self::PartialMessage { .. } => "partial_message",
            Self::SetView { .. } => "set_view",
            Self::Track { .. } => "track",
            Self::Notice { .. } => "notice",
        }
    }

    /// Check whether a raw discriminator names a known event
    #[must_use]
    pub fn is_known_kind(kind: &str) -> bool {
        Self::KNOWN_KINDS.contains(&kind)
    }
}

/// One entry of the chat history
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistoryItem {
    /// Who sent this item
    pub role: MessageRole,
    /// The message content
    pub content: String,
}

impl ChatHistoryItem {
    /// A user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// An assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// A system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Who sent a chat item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User input
    User,
    /// Assistant response
    #[serde(alias = "ai")]
    Assistant,
    /// System message
    System,
}

/// Top-level screen selector
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Settings screen
    Settings,
    /// Prompt input with the action list
    #[default]
    Prompt,
    /// Chat history plus prompt input
    Chat,
}

impl View {
    /// Human-readable name
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Settings => "Settings",
            Self::Prompt => "Prompt",
            Self::Chat => "Chat",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Notification levels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyLevel {
    /// Informational
    #[default]
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
    /// Success
    Success,
}

/// A user-visible message for the chat/action surface
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity
    #[serde(default)]
    pub level: NotifyLevel,
    /// Optional title
    #[serde(default)]
    pub title: Option<String>,
    /// Message body
    pub message: String,
}

impl Notice {
    /// An error notice
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotifyLevel::Error,
            title: None,
            message: message.into(),
        }
    }

    /// An informational notice
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotifyLevel::Info,
            title: None,
            message: message.into(),
        }
    }

    /// Attach a title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}
