//! Demo Tracks
//!
//! The tracks the terminal surface ships with:
//!
//! - `chat`: send a prompt to the assistant; switches to the chat view
//! - `settings`: open the settings view; `home` goes back to the prompt
//! - `clear`: ask the host to drop the conversation (host-only action)

use async_trait::async_trait;

use bridge_core::{ActionDescriptor, BridgeContext, Notice, Track, TrackLoader, View};

/// Build the loader with every demo track, in load order
pub fn demo_tracks() -> TrackLoader {
    TrackLoader::new()
        .with_track(ChatTrack::new)
        .with_track(SettingsTrack::new)
        .with_track(ClearTrack::new)
}

/// Sends prompts to the assistant
pub struct ChatTrack {
    ctx: BridgeContext,
}

impl ChatTrack {
    /// Track name
    pub const NAME: &'static str = "chat";

    /// Create the track
    pub fn new(ctx: BridgeContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Track for ChatTrack {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn init(&mut self) -> anyhow::Result<()> {
        let ctx = self.ctx.clone();
        self.ctx.register_action(
            ActionDescriptor::new("chat")
                .with_track(Self::NAME)
                .with_description("Send the prompt to the assistant")
                .with_sync_handler(move |_, _| {
                    ctx.set_view(View::Chat)?;
                    Ok(())
                }),
        )?;

        // Host announces model switches as a track event
        let ctx = self.ctx.clone();
        self.ctx.on_track_event(Self::NAME, "model", move |payload| {
            let model = payload
                .get("name")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown");
            ctx.notify(Notice::info(format!("Now chatting with {model}")))?;
            Ok(())
        });

        Ok(())
    }
}

/// Navigates between the settings and prompt views
pub struct SettingsTrack {
    ctx: BridgeContext,
}

impl SettingsTrack {
    /// Track name
    pub const NAME: &'static str = "settings";

    /// Create the track
    pub fn new(ctx: BridgeContext) -> Self {
        Self { ctx }
    }

    fn view_action(&self, name: &str, description: &str, view: View) -> ActionDescriptor {
        let ctx = self.ctx.clone();
        ActionDescriptor::new(name)
            .with_track(Self::NAME)
            .with_description(description)
            .with_sync_handler(move |_, _| {
                ctx.set_view(view)?;
                Ok(())
            })
    }
}

#[async_trait]
impl Track for SettingsTrack {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn init(&mut self) -> anyhow::Result<()> {
        self.ctx.register_action(self.view_action(
            "settings",
            "Show the effective configuration",
            View::Settings,
        ))?;
        self.ctx
            .register_action(self.view_action("home", "Back to the prompt", View::Prompt))?;
        Ok(())
    }
}

/// Clears the conversation on the host
pub struct ClearTrack {
    ctx: BridgeContext,
}

impl ClearTrack {
    /// Track name
    pub const NAME: &'static str = "clear";

    /// Create the track
    pub fn new(ctx: BridgeContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Track for ClearTrack {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn init(&mut self) -> anyhow::Result<()> {
        self.ctx.register_action(
            ActionDescriptor::new("clear")
                .with_track(Self::NAME)
                .with_description("Start a new conversation"),
        )?;
        Ok(())
    }
}
