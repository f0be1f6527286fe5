//! Trackside TUI Entry Point
//!
//! Usage:
//!   trackside-tui [OPTIONS]
//!
//! Options:
//!   --config <PATH>                  Config file (default: ~/.config/trackside/renderer.toml)
//!   --log-file <PATH>                Write logs here instead of discarding them
//!   --action-timeout-ms <MS>         Remote action timeout, 0 disables it
//!   --on-local-handler-error <MODE>  continue | abort

use std::fs::File;
use std::io::{self, IsTerminal};
use std::panic;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bridge_core::{
    load_config_from_path, BridgeConfig, ConfigOverrides, InProcessTransport, LocalFailurePolicy,
    RendererSession,
};
use trackside_tui::display::ChannelUi;
use trackside_tui::echo_host::DemoHost;
use trackside_tui::tracks::demo_tracks;
use trackside_tui::App;

#[derive(Debug, Parser)]
#[command(name = "trackside-tui", version, about = "Terminal surface for Trackside")]
struct Args {
    /// Path to the renderer config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write logs to this file (the terminal is busy with the UI)
    #[arg(long, value_name = "PATH", env = "TRACKSIDE_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Remote action timeout in milliseconds (0 = none)
    #[arg(long, value_name = "MS")]
    action_timeout_ms: Option<u64>,

    /// What to do when a local action handler fails
    #[arg(long, value_name = "MODE")]
    on_local_handler_error: Option<LocalFailurePolicy>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            action_timeout_ms: self.action_timeout_ms,
            on_local_handler_error: self.on_local_handler_error,
            event_queue_capacity: None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    let mut config = load_config_from_path(args.config.clone())?;
    args.overrides().apply(&mut config)?;
    tracing::info!(
        source = %config.source(),
        timeout_ms = config.action_timeout_ms(),
        on_local_handler_error = %config.on_local_handler_error,
        "Configuration loaded"
    );

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: trackside-tui requires a terminal (TTY)");
        std::process::exit(1);
    }

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &config).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &BridgeConfig,
) -> anyhow::Result<()> {
    let (transport, events, endpoint) =
        InProcessTransport::new_pair_with_capacity(config.event_queue_capacity);
    let (_host, host_task) = DemoHost::spawn(endpoint);

    let session = Arc::new(RendererSession::new(Arc::new(transport), config));
    let (ui, updates) = ChannelUi::new();

    // A failed track leaves the session degraded; the notice is already queued
    if let Err(e) = session.start(Arc::new(ui), events, demo_tracks()).await {
        tracing::warn!(error = %e, "Session started degraded");
    }

    let mut app = App::new(session.clone(), updates, config);
    let result = app.run(terminal).await;

    if let Some(stats) = session.shutdown().await {
        tracing::info!(
            applied = stats.applied,
            dropped = stats.dropped,
            "Event pump drained"
        );
    }
    host_task.abort();

    result
}

fn init_logging(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Without a log file, stay silent: stderr belongs to the alternate screen
    let Some(path) = log_file else {
        return Ok(());
    };

    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Arc::new(file)),
        )
        .with(filter)
        .init();
    Ok(())
}
