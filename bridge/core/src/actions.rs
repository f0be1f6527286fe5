//! Action Registry
//!
//! Tracks register named actions here during loading. Each action pairs an
//! optional renderer-side handler with a host-side counterpart the core never
//! sees; the dispatcher always calls the host.
//!
//! # Lifecycle
//!
//! The registry accepts registrations only while tracks are loading. Once
//! the loader finishes (successfully or not) the registry is sealed and
//! further registrations fail with [`ActionError::RegistrySealed`]. This is
//! what makes "register before dispatch" structural instead of a convention.
//!
//! # Thread Safety
//!
//! `Arc<RwLock<HashMap>>` as in the rest of the crate: lookups on every
//! dispatch, writes only during loading.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::ActionError;
use crate::events::Prompt;

/// Synchronous local handler: runs to completion before the remote call
pub type SyncHandler = Arc<dyn Fn(&Prompt, &[Value]) -> anyhow::Result<()> + Send + Sync>;

/// Asynchronous local handler: spawned before the remote call, not awaited
pub type AsyncHandler =
    Arc<dyn Fn(Prompt, Vec<Value>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Renderer-side half of an action
#[derive(Clone)]
pub enum RendererHandler {
    /// Runs inline on the dispatching task
    Sync(SyncHandler),
    /// Spawned onto the runtime
    Async(AsyncHandler),
}

impl RendererHandler {
    /// Wrap a synchronous closure
    pub fn sync<F>(handler: F) -> Self
    where
        F: Fn(&Prompt, &[Value]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(handler))
    }

    /// Wrap an async closure
    pub fn spawned<F, Fut>(handler: F) -> Self
    where
        F: Fn(Prompt, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::Async(Arc::new(move |prompt, args| handler(prompt, args).boxed()))
    }

    /// Short label for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sync(_) => "sync",
            Self::Async(_) => "async",
        }
    }
}

impl fmt::Debug for RendererHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RendererHandler::{}", self.kind())
    }
}

/// A registered action
#[derive(Clone, Debug)]
pub struct ActionDescriptor {
    /// Unique action name
    pub name: String,
    /// Human-readable description for the action list
    pub description: Option<String>,
    /// Track that registered the action
    pub track: Option<String>,
    /// Optional renderer-side handler
    pub renderer_handler: Option<RendererHandler>,
}

impl ActionDescriptor {
    /// Create a descriptor with no local handler
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            track: None,
            renderer_handler: None,
        }
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the owning track
    #[must_use]
    pub fn with_track(mut self, track: impl Into<String>) -> Self {
        self.track = Some(track.into());
        self
    }

    /// Attach a local handler
    #[must_use]
    pub fn with_handler(mut self, handler: RendererHandler) -> Self {
        self.renderer_handler = Some(handler);
        self
    }

    /// Attach a synchronous local handler
    #[must_use]
    pub fn with_sync_handler<F>(self, handler: F) -> Self
    where
        F: Fn(&Prompt, &[Value]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.with_handler(RendererHandler::sync(handler))
    }
}

/// Listing entry for the prompt view
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionSummary {
    /// Action name
    pub name: String,
    /// Description, if any
    pub description: Option<String>,
    /// Owning track, if any
    pub track: Option<String>,
}

/// Registry of actions keyed by name
#[derive(Clone, Default)]
pub struct ActionRegistry {
    inner: Arc<RwLock<HashMap<String, Arc<ActionDescriptor>>>>,
    sealed: Arc<AtomicBool>,
}

impl ActionRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action
    ///
    /// # Errors
    ///
    /// - [`ActionError::InvalidAction`] for an empty name
    /// - [`ActionError::RegistrySealed`] once loading finished
    /// - [`ActionError::DuplicateAction`] if the name is taken
    pub fn register(&self, descriptor: ActionDescriptor) -> Result<(), ActionError> {
        if descriptor.name.trim().is_empty() {
            return Err(ActionError::InvalidAction);
        }
        if self.is_sealed() {
            return Err(ActionError::RegistrySealed {
                name: descriptor.name,
            });
        }

        let mut inner = self.inner.write();
        if inner.contains_key(&descriptor.name) {
            tracing::warn!(action = %descriptor.name, "Duplicate action registration");
            return Err(ActionError::DuplicateAction {
                name: descriptor.name,
            });
        }

        tracing::debug!(
            action = %descriptor.name,
            track = descriptor.track.as_deref().unwrap_or("-"),
            handler = descriptor.renderer_handler.as_ref().map_or("none", RendererHandler::kind),
            "Action registered"
        );
        inner.insert(descriptor.name.clone(), Arc::new(descriptor));
        Ok(())
    }

    /// Look up an action
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<ActionDescriptor>> {
        self.inner.read().get(name).cloned()
    }

    /// Check if an action is registered
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.inner.read().contains_key(name)
    }

    /// Number of registered actions
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether no actions are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// All actions, sorted by name
    #[must_use]
    pub fn list(&self) -> Vec<ActionSummary> {
        let mut summaries: Vec<ActionSummary> = self
            .inner
            .read()
            .values()
            .map(|d| ActionSummary {
                name: d.name.clone(),
                description: d.description.clone(),
                track: d.track.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    /// Whether registration is closed
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::SeqCst)
    }

    /// Close registration
    pub(crate) fn seal(&self) {
        if !self.sealed.swap(true, Ordering::SeqCst) {
            tracing::debug!(actions = self.len(), "Action registry sealed");
        }
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.len())
            .field("sealed", &self.is_sealed())
            .finish()
    }
}
