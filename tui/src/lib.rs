//! Trackside TUI - Terminal surface for the renderer bridge
//!
//! A reference renderer built on `bridge-core`. It shows how a surface plugs
//! into the bridge: a [`display::ChannelUi`] receives the bridge's setter
//! calls, the [`App`] event loop turns keys into action invocations, and
//! [`tracks::demo_tracks`] registers the actions the user can run.
//!
//! # Architecture
//!
//! - **App**: crossterm event loop, input buffer, frame ticks
//! - **Display**: setter calls queued to the render loop
//! - **Views**: prompt, chat and settings rendering
//! - **Tracks**: the `chat`, `settings` and `clear` demo tracks
//! - **Echo host**: in-process host so the surface runs standalone

pub mod app;
pub mod display;
pub mod echo_host;
pub mod theme;
pub mod tracks;
pub mod views;

pub use app::App;
