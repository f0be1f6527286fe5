//! Main Application
//!
//! The App is a thin display client over a [`RendererSession`]:
//! 1. Converts terminal events into action invocations and size reports
//! 2. Drains the display updates the bridge queued through `ChannelUi`
//! 3. Renders based on [`DisplayState`]
//!
//! Action invocations run as their own tasks so a slow host never stalls
//! input handling or rendering. Size reports go through one long-lived task
//! fed by a `watch` channel: bursts coalesce and the host always ends up with
//! the latest size.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use serde_json::{json, Value};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};

use bridge_core::{ActionSummary, BridgeConfig, RendererSession, View};

use crate::display::{DisplayState, DisplayUpdate};
use crate::views::{self, ViewModel};

/// ~30 FPS redraw while idle
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Main application state
pub struct App {
    // === Core State ===
    /// Is the app still running?
    running: bool,

    // === Bridge Integration ===
    /// Session connecting the renderer to the host
    session: Arc<RendererSession>,
    /// Setter calls queued by `ChannelUi`
    updates: mpsc::UnboundedReceiver<DisplayUpdate>,
    /// Completion signals from spawned action tasks
    finished_tx: mpsc::UnboundedSender<()>,
    finished_rx: mpsc::UnboundedReceiver<()>,
    /// Latest terminal size, drained by the size task
    sizes: watch::Sender<Option<(u16, u16)>>,
    /// Display state folded from the updates
    display: DisplayState,

    // === View Data ===
    /// Registered actions, captured once the registry is sealed
    actions: Vec<ActionSummary>,
    /// Highlighted action in the prompt view
    selected_action: usize,
    /// Effective configuration rows for the settings view
    settings: Vec<(String, String)>,

    // === Input State ===
    /// User input buffer
    input: String,
}

impl App {
    /// Create the app for a started session
    pub fn new(
        session: Arc<RendererSession>,
        updates: mpsc::UnboundedReceiver<DisplayUpdate>,
        config: &BridgeConfig,
    ) -> Self {
        let (finished_tx, finished_rx) = mpsc::unbounded_channel();
        let (sizes, size_rx) = watch::channel(None);
        spawn_size_task(session.clone(), size_rx);
        let actions = session.context().actions().list();
        Self {
            running: true,
            session,
            updates,
            finished_tx,
            finished_rx,
            sizes,
            display: DisplayState::new(),
            actions,
            selected_action: 0,
            settings: settings_rows(config),
            input: String::new(),
        }
    }

    /// Whether the event loop should keep going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current display state
    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// Current input buffer
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();
        let mut frames = tokio::time::interval(FRAME_INTERVAL);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let size = terminal.size()?;
        self.report_size(size.width, size.height);

        let mut last_frame = Instant::now();
        while self.running {
            tokio::select! {
                biased;

                maybe_event = event_stream.next() => match maybe_event {
                    Some(Ok(event)) => self.handle_event(event),
                    Some(Err(e)) => tracing::warn!(error = %e, "Terminal event error"),
                    None => self.running = false,
                },

                _ = frames.tick() => {}
            }

            self.drain_updates();

            let now = Instant::now();
            self.display.update(now - last_frame);
            last_frame = now;

            terminal.draw(|frame| {
                let model = ViewModel {
                    input: &self.input,
                    actions: &self.actions,
                    selected_action: self.selected_action,
                    settings: &self.settings,
                };
                views::render(&self.display, &model, frame.area(), frame.buffer_mut());
            })?;
        }

        Ok(())
    }

    /// Fold every queued update and finished action into the display state
    pub fn drain_updates(&mut self) {
        while let Ok(update) = self.updates.try_recv() {
            self.display.apply(update);
        }
        while self.finished_rx.try_recv().is_ok() {
            self.display.pending_actions = self.display.pending_actions.saturating_sub(1);
        }
    }

    /// Handle one terminal event
    pub fn handle_event(&mut self, event: Event) {
        match event {
            // Only handle Press events (not Release or Repeat)
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Resize(w, h) => self.report_size(w, h),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.running = false,
            KeyCode::Char('c') if ctrl => self.running = false,
            KeyCode::Char('l') if ctrl => self.invoke("clear", Value::Null),
            KeyCode::F(2) => self.invoke("settings", Value::Null),
            KeyCode::F(1) | KeyCode::Home => self.invoke("home", Value::Null),
            KeyCode::Up => {
                self.selected_action = self.selected_action.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_action + 1 < self.actions.len() {
                    self.selected_action += 1;
                }
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) if !ctrl => self.input.push(c),
            _ => {}
        }
    }

    /// Enter: send typed text as a chat prompt, or run the highlighted action
    fn submit(&mut self) {
        let text = std::mem::take(&mut self.input);
        if !text.trim().is_empty() {
            self.invoke("chat", json!({ "text": text }));
            return;
        }
        if self.display.view == View::Prompt {
            if let Some(action) = self.actions.get(self.selected_action) {
                let name = action.name.clone();
                self.invoke(&name, Value::Null);
            }
        }
    }

    fn invoke(&mut self, name: &str, prompt: Value) {
        self.display.pending_actions += 1;

        let session = self.session.clone();
        let finished = self.finished_tx.clone();
        let name = name.to_string();
        tokio::spawn(async move {
            // Failures already surface as notices through the session
            if let Err(e) = session.invoke_action(&name, prompt, Vec::new()).await {
                tracing::debug!(action = %name, error = %e, "Action failed");
            }
            let _ = finished.send(());
        });
    }

    fn report_size(&self, width: u16, height: u16) {
        self.sizes.send_replace(Some((width, height)));
    }
}

/// Report sizes in the order they were observed, skipping superseded ones
///
/// Ends when the [`App`] (and with it the sender) is dropped.
fn spawn_size_task(session: Arc<RendererSession>, mut sizes: watch::Receiver<Option<(u16, u16)>>) {
    tokio::spawn(async move {
        while sizes.changed().await.is_ok() {
            let Some((width, height)) = *sizes.borrow_and_update() else {
                continue;
            };
            if let Err(e) = session.resize(f64::from(width), f64::from(height)).await {
                tracing::warn!(width, height, error = %e, "Size report failed");
            }
        }
    });
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("running", &self.running)
            .field("view", &self.display.view)
            .field("pending_actions", &self.display.pending_actions)
            .finish_non_exhaustive()
    }
}

/// Effective configuration, as settings view rows
pub fn settings_rows(config: &BridgeConfig) -> Vec<(String, String)> {
    let timeout = match config.action_timeout {
        Some(d) => format!("{} ms", d.as_millis()),
        None => "none".to_string(),
    };
    let file = config
        .config_file_path
        .as_ref()
        .map_or_else(|| "(none)".to_string(), |p| p.display().to_string());

    vec![
        ("Action timeout".to_string(), timeout),
        (
            "On local handler error".to_string(),
            config.on_local_handler_error.to_string(),
        ),
        (
            "Event queue capacity".to_string(),
            config.event_queue_capacity.to_string(),
        ),
        ("Config file".to_string(), file),
        ("Source".to_string(), config.source().to_string()),
    ]
}
