//! Renderer Session
//!
//! Wires the pieces together in startup order:
//!
//! 1. install the rendering layer's setters
//! 2. start the event pump
//! 3. load tracks (lifecycle becomes `ready` or `degraded`)
//!
//! The pump starts before tracks load so host pushes are applied while
//! loading runs. Track event handlers registered later do not see events
//! that were processed before they existed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::BridgeConfig;
use crate::context::BridgeContext;
use crate::dispatcher::ActionDispatcher;
use crate::error::{ActionError, BridgeError, SessionError};
use crate::events::Prompt;
use crate::layout::SizeReporter;
use crate::messages::{HostEvent, Notice};
use crate::processor::{EventPump, PumpStats};
use crate::tracks::{LoadReport, TrackLoader};
use crate::transport::{HostTransport, TransportError};
use crate::ui_bridge::UiBridge;

type PumpHandle = JoinHandle<Result<PumpStats, BridgeError>>;

/// One renderer's connection to the host
pub struct RendererSession {
    ctx: BridgeContext,
    dispatcher: ActionDispatcher,
    sizes: SizeReporter,
    pump: Mutex<Option<PumpHandle>>,
    started: AtomicBool,
}

impl RendererSession {
    /// Create a session over a transport
    pub fn new(transport: Arc<dyn HostTransport>, config: &BridgeConfig) -> Self {
        let ctx = BridgeContext::new();
        Self {
            dispatcher: ActionDispatcher::new(ctx.clone(), transport.clone(), config),
            sizes: SizeReporter::new(transport),
            ctx,
            pump: Mutex::new(None),
            started: AtomicBool::new(false),
        }
    }

    /// The shared context
    #[must_use]
    pub fn context(&self) -> &BridgeContext {
        &self.ctx
    }

    /// The dispatcher, for callers that handle errors themselves
    #[must_use]
    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    /// Install the UI, start the pump, load tracks
    ///
    /// # Errors
    ///
    /// - [`SessionError::AlreadyStarted`] on a second call
    /// - [`SessionError::Bridge`] if a UI was already installed on the context
    /// - [`SessionError::TrackInit`] if a track failed; the session stays
    ///   usable in the `degraded` state and an error notice is shown
    pub async fn start(
        &self,
        ui: Arc<dyn UiBridge>,
        events: mpsc::Receiver<HostEvent>,
        loader: TrackLoader,
    ) -> Result<LoadReport, SessionError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(SessionError::AlreadyStarted);
        }

        self.ctx.install_ui(ui)?;
        *self.pump.lock() = Some(EventPump::spawn(self.ctx.clone(), events));

        match loader.load(&self.ctx).await {
            Ok(report) => {
                tracing::info!(
                    tracks = report.tracks_loaded,
                    actions = report.actions_registered,
                    "Renderer session ready"
                );
                Ok(report)
            }
            Err(e) => {
                self.ctx.notify(
                    Notice::error(e.to_string()).with_title(format!("Track {} unavailable", e.track)),
                )?;
                Err(e.into())
            }
        }
    }

    /// Run an action, showing an error notice if it fails
    ///
    /// # Errors
    ///
    /// See [`ActionDispatcher::execute`].
    pub async fn invoke_action(
        &self,
        name: &str,
        prompt: Prompt,
        args: Vec<Value>,
    ) -> Result<Value, ActionError> {
        let result = self.dispatcher.execute(name, prompt, args).await;
        if let Err(ref e) = result {
            let notice = Notice::error(e.to_string()).with_title("Action failed");
            if let Err(bridge) = self.ctx.notify(notice) {
                tracing::warn!(action = %name, error = %bridge, "Could not show action failure");
            }
        }
        result
    }

    /// Report a new layout size
    ///
    /// # Errors
    ///
    /// Propagates the transport failure.
    pub async fn resize(&self, width: f64, height: f64) -> Result<bool, TransportError> {
        self.sizes.report(width, height).await
    }

    /// Close the context and stop the pump
    ///
    /// Returns the pump's counters if it had already drained its channel.
    pub async fn shutdown(&self) -> Option<PumpStats> {
        self.ctx.close();

        let handle = self.pump.lock().take()?;
        if !handle.is_finished() {
            handle.abort();
        }

        match handle.await {
            Ok(Ok(stats)) => Some(stats),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Event pump stopped with an error");
                None
            }
            Err(e) if e.is_cancelled() => None,
            Err(e) => {
                tracing::error!(error = %e, "Event pump panicked");
                None
            }
        }
    }
}

impl std::fmt::Debug for RendererSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererSession")
            .field("ctx", &self.ctx)
            .field("started", &self.started.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
