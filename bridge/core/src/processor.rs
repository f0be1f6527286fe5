//! Event Processor
//!
//! The single inbound funnel for host-pushed events. Each event is applied
//! synchronously: the context mirror is updated first, then the matching
//! UI setter is called.
//!
//! # Ordering
//!
//! [`EventPump`] is the only consumer of the pushed-event channel and applies
//! events one at a time, so application order is delivery order. The pump
//! runs as its own task; in-flight action calls never hold it up.

use futures::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use crate::context::BridgeContext;
use crate::error::BridgeError;
use crate::messages::{HostEvent, Notice};

/// What happened to an event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// State was updated
    Applied,
    /// Logged and discarded
    Dropped,
}

/// Applies host events to the bridge context and UI
#[derive(Clone, Debug)]
pub struct EventProcessor {
    ctx: BridgeContext,
}

impl EventProcessor {
    /// Create a processor for a context
    #[must_use]
    pub fn new(ctx: BridgeContext) -> Self {
        Self { ctx }
    }

    /// Apply a typed event
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UiNotInstalled`] if the rendering layer has not
    /// installed its setters yet. Nothing is mutated in that case.
    pub fn process_event(&self, event: HostEvent) -> Result<Disposition, BridgeError> {
        let ui = self.ctx.ui()?;
        tracing::trace!(kind = event.kind(), "Processing host event");

        match event {
            HostEvent::ChatHistory { items } => {
                self.ctx.mirror_chat_history(&items);
                ui.set_chat_history(items);
            }
            HostEvent::PartialMessage { text } => {
                self.ctx.mirror_partial_message(text.as_deref());
                ui.set_partial_message(text);
            }
            HostEvent::SetView { view } => {
                self.ctx.set_view(view)?;
            }
            HostEvent::Notice {
                level,
                title,
                message,
            } => {
                ui.show_notice(Notice {
                    level,
                    title,
                    message,
                });
            }
            HostEvent::Track {
                track,
                name,
                payload,
            } => {
                return Ok(self.dispatch_track_event(&track, &name, &payload));
            }
        }

        Ok(Disposition::Applied)
    }

    /// Apply an untyped payload
    ///
    /// Unknown discriminators and malformed payloads are logged and dropped.
    ///
    /// # Errors
    ///
    /// Same as [`EventProcessor::process_event`].
    pub fn process_raw(&self, raw: Value) -> Result<Disposition, BridgeError> {
        let kind = match raw.get("kind").and_then(Value::as_str) {
            Some(kind) => kind,
            None => {
                tracing::warn!("Dropping host event without a kind");
                return Ok(Disposition::Dropped);
            }
        };

        if !HostEvent::is_known_kind(kind) {
            tracing::warn!(kind = %kind, "Dropping host event with unknown kind");
            return Ok(Disposition::Dropped);
        }

        let kind = kind.to_string();
        match serde_json::from_value::<HostEvent>(raw) {
            Ok(event) => self.process_event(event),
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "Dropping malformed host event");
                Ok(Disposition::Dropped)
            }
        }
    }

    fn dispatch_track_event(&self, track: &str, name: &str, payload: &Value) -> Disposition {
        let handlers = self.ctx.track_handlers(track, name);
        if handlers.is_empty() {
            tracing::debug!(track = %track, event = %name, "No handler for track event");
            return Disposition::Dropped;
        }

        for handler in handlers {
            if let Err(e) = handler(payload) {
                tracing::warn!(
                    track = %track,
                    event = %name,
                    error = %e,
                    "Track event handler failed"
                );
            }
        }
        Disposition::Applied
    }
}

/// Counters reported when a pump stops
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PumpStats {
    /// Events that changed state
    pub applied: u64,
    /// Events logged and discarded
    pub dropped: u64,
}

impl PumpStats {
    fn record(&mut self, disposition: Disposition) {
        match disposition {
            Disposition::Applied => self.applied += 1,
            Disposition::Dropped => self.dropped += 1,
        }
    }
}

/// Single-consumer loop feeding pushed events to the processor
pub struct EventPump;

impl EventPump {
    /// Spawn a pump over typed events
    pub fn spawn(
        ctx: BridgeContext,
        events: mpsc::Receiver<HostEvent>,
    ) -> JoinHandle<Result<PumpStats, BridgeError>> {
        tokio::spawn(Self::run(ctx, events))
    }

    /// Spawn a pump over untyped payloads
    pub fn spawn_raw(
        ctx: BridgeContext,
        events: mpsc::Receiver<Value>,
    ) -> JoinHandle<Result<PumpStats, BridgeError>> {
        tokio::spawn(Self::run_raw(ctx, events))
    }

    /// Drain typed events until the host side closes
    ///
    /// # Errors
    ///
    /// Stops at the first [`BridgeError`]; that is a wiring bug, not a
    /// runtime condition.
    pub async fn run(
        ctx: BridgeContext,
        events: mpsc::Receiver<HostEvent>,
    ) -> Result<PumpStats, BridgeError> {
        let processor = EventProcessor::new(ctx);
        let mut stream = ReceiverStream::new(events);
        let mut stats = PumpStats::default();

        while let Some(event) = stream.next().await {
            stats.record(processor.process_event(event)?);
        }

        tracing::debug!(applied = stats.applied, dropped = stats.dropped, "Event pump stopped");
        Ok(stats)
    }

    /// Drain untyped payloads until the host side closes
    ///
    /// # Errors
    ///
    /// Same as [`EventPump::run`].
    pub async fn run_raw(
        ctx: BridgeContext,
        events: mpsc::Receiver<Value>,
    ) -> Result<PumpStats, BridgeError> {
        let processor = EventProcessor::new(ctx);
        let mut stream = ReceiverStream::new(events);
        let mut stats = PumpStats::default();

        while let Some(raw) = stream.next().await {
            stats.record(processor.process_raw(raw)?);
        }

        tracing::debug!(applied = stats.applied, dropped = stats.dropped, "Raw event pump stopped");
        Ok(stats)
    }
}
