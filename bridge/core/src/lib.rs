//! Bridge Core - Renderer-side track and action bridge for Trackside
//!
//! The renderer half of a desktop assistant. Tracks (pluggable feature
//! units) register named actions at startup; the bridge dispatches those
//! actions to the host process and applies host-pushed events to the UI.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     Rendering layer (TUI, ...)                   │
//! │        implements UiBridge            calls invoke_action        │
//! └──────────────┬───────────────────────────────┬───────────────────┘
//!                │ setters (down)                │ actions (up)
//! ┌──────────────┴───────────────────────────────┴───────────────────┐
//! │                          BRIDGE CORE                             │
//! │  ┌──────────────┐   ┌─────────────────┐   ┌───────────────────┐  │
//! │  │ EventPump    │──▶│ BridgeContext   │◀──│ ActionDispatcher  │  │
//! │  │ (sequential) │   │ registry, state │   │ local → remote    │  │
//! │  └──────▲───────┘   │ lifecycle       │   └─────────┬─────────┘  │
//! │         │           └────────▲────────┘             │            │
//! │         │                    │ Track::init          │            │
//! │         │              ┌─────┴──────┐               │            │
//! │         │              │TrackLoader │               │            │
//! │         │              └────────────┘               │            │
//! └─────────┼───────────────────────────────────────────┼────────────┘
//!           │ HostEvent (pushed)          HostTransport │
//! ┌─────────┴───────────────────────────────────────────▼────────────┐
//! │                              Host                                │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`RendererSession`]: startup, dispatch with error notices, resize, shutdown
//! - [`BridgeContext`]: shared handle passed to every track
//! - [`Track`] / [`TrackLoader`]: pluggable units and their sequential loader
//! - [`ActionDispatcher`]: local handler, then host call
//! - [`EventProcessor`] / [`EventPump`]: applies pushed events in order
//! - [`UiBridge`]: setters the rendering layer installs once
//! - [`HostTransport`]: the outbound seam (`InProcessTransport` for embedded hosts)
//!
//! # Quick Start
//!
//! ```ignore
//! use bridge_core::{BridgeConfig, InProcessTransport, RendererSession, TrackLoader};
//!
//! let (transport, events, host) = InProcessTransport::new_pair();
//! let session = RendererSession::new(Arc::new(transport), &BridgeConfig::default());
//!
//! session.start(ui, events, TrackLoader::new().with_track(ChatTrack::new)).await?;
//! session.invoke_action("chat", json!({ "text": "hello" }), vec![]).await?;
//! ```
//!
//! # No UI Dependencies
//!
//! This crate has no dependency on ratatui, crossterm, or any other UI
//! framework. The rendering layer is reached only through [`UiBridge`].

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod actions;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod layout;
pub mod messages;
pub mod processor;
pub mod session;
pub mod tracks;
pub mod transport;
pub mod ui_bridge;

pub use actions::{ActionDescriptor, ActionRegistry, ActionSummary, RendererHandler};
pub use config::{
    default_config_path, load_config, load_config_from_path, BridgeConfig, ConfigError,
    ConfigOverrides, ConfigSource, LocalFailurePolicy,
};
pub use context::{BridgeContext, BridgeState, Lifecycle};
pub use dispatcher::ActionDispatcher;
pub use error::{ActionError, BridgeError, SessionError, TrackInitError};
pub use events::{ActionCall, CallId, Prompt, SizeReport};
pub use layout::SizeReporter;
pub use messages::{ChatHistoryItem, HostEvent, MessageRole, Notice, NotifyLevel, View};
pub use processor::{Disposition, EventProcessor, EventPump, PumpStats};
pub use session::RendererSession;
pub use tracks::{LoadReport, Track, TrackConstructor, TrackLoader};
pub use transport::{HostEndpoint, HostRequest, HostTransport, InProcessTransport, TransportError};
pub use ui_bridge::{UiBridge, UiSlot};
