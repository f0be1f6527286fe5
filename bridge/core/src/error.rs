//! Error Types
//!
//! Errors raised by the bridge. Action errors are recoverable and surface to
//! the caller; track initialization errors stop the loader but not the
//! process.

use std::time::Duration;

use thiserror::Error;

use crate::context::Lifecycle;
use crate::transport::TransportError;

/// Errors from registering or executing actions
#[derive(Debug, Error)]
pub enum ActionError {
    /// Action invoked (or registered) without a name
    #[error("Cannot execute action without a name")]
    InvalidAction,

    /// Action name not in the registry
    #[error("Action {name} does not exist")]
    UnknownAction {
        /// The requested name
        name: String,
    },

    /// Two registrations under the same name
    #[error("Action {name} is already registered")]
    DuplicateAction {
        /// The contested name
        name: String,
    },

    /// Registration attempted after tracks finished loading
    #[error("Action {name} registered after track loading finished")]
    RegistrySealed {
        /// The rejected name
        name: String,
    },

    /// Dispatch attempted outside the ready/degraded lifecycle
    #[error("Actions cannot run while the renderer is {state}")]
    NotReady {
        /// Lifecycle at the time of the call
        state: Lifecycle,
    },

    /// Local handler failed and the policy aborts the remote call
    #[error("Local handler for {name} failed: {source}")]
    LocalHandler {
        /// Action name
        name: String,
        /// Handler failure
        #[source]
        source: anyhow::Error,
    },

    /// Remote call failed
    #[error("Action {name} failed on the host: {source}")]
    Remote {
        /// Action name
        name: String,
        /// Transport failure
        #[source]
        source: TransportError,
    },

    /// Remote call did not settle in time
    #[error("Action {name} timed out after {}ms", .after.as_millis())]
    Timeout {
        /// Action name
        name: String,
        /// Configured timeout
        after: Duration,
    },
}

impl ActionError {
    /// Whether the remote call was never attempted
    #[must_use]
    pub fn before_remote(&self) -> bool {
        !matches!(self, Self::Remote { .. } | Self::Timeout { .. })
    }
}

/// A track's `init()` failed; later tracks were not loaded
#[derive(Debug, Error)]
#[error("Track {track} (#{index}) failed to initialize: {source}")]
pub struct TrackInitError {
    /// Name of the failing track
    pub track: String,
    /// Position in the load order
    pub index: usize,
    /// Underlying failure
    #[source]
    pub source: anyhow::Error,
}

/// UI state bridge misuse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// A setter was called before the rendering layer installed the UI
    #[error("UI state bridge used before installation")]
    UiNotInstalled,

    /// The rendering layer installed the UI twice
    #[error("UI state bridge is already installed")]
    UiAlreadyInstalled,
}

/// Renderer session startup failures
#[derive(Debug, Error)]
pub enum SessionError {
    /// UI bridge problem
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// Track loading stopped
    #[error(transparent)]
    TrackInit(#[from] TrackInitError),

    /// `start` called twice
    #[error("Renderer session already started")]
    AlreadyStarted,
}
