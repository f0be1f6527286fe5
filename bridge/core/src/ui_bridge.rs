//! UI State Bridge
//!
//! The seam between the core and the rendering layer. The rendering layer
//! implements [`UiBridge`] and installs it exactly once; the core calls the
//! setters and never reads anything back from the rendering layer.
//!
//! Calling a setter before installation is a programming error and fails
//! with [`BridgeError::UiNotInstalled`] instead of silently doing nothing.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::BridgeError;
use crate::messages::{ChatHistoryItem, Notice, View};

/// Setters supplied by the rendering layer
///
/// Implementations must be cheap and non-blocking: they run on the event
/// pump and on the dispatching task.
pub trait UiBridge: Send + Sync {
    /// Replace the full chat history
    fn set_chat_history(&self, items: Vec<ChatHistoryItem>);

    /// Replace the streaming buffer (`None` = no stream)
    fn set_partial_message(&self, text: Option<String>);

    /// Switch the active screen
    fn set_view(&self, view: View);

    /// Show a user-visible notice
    fn show_notice(&self, notice: Notice);
}

/// Install-once slot holding the rendering layer's setters
#[derive(Clone, Default)]
pub struct UiSlot {
    inner: Arc<OnceLock<Arc<dyn UiBridge>>>,
}

impl UiSlot {
    /// Create an empty slot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the UI
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UiAlreadyInstalled`] on a second call.
    pub fn install(&self, ui: Arc<dyn UiBridge>) -> Result<(), BridgeError> {
        self.inner
            .set(ui)
            .map_err(|_| BridgeError::UiAlreadyInstalled)?;
        tracing::debug!("UI state bridge installed");
        Ok(())
    }

    /// Get the installed UI
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UiNotInstalled`] before installation.
    pub fn get(&self) -> Result<&Arc<dyn UiBridge>, BridgeError> {
        self.inner.get().ok_or(BridgeError::UiNotInstalled)
    }

    /// Whether the UI has been installed
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.inner.get().is_some()
    }
}

impl fmt::Debug for UiSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiSlot")
            .field("installed", &self.is_installed())
            .finish()
    }
}
