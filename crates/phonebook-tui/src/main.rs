use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use phonebook_core::{Config, FileStorage, SessionStorage, SharedStorage};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;
mod views;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "phonebook", version)]
#[command(about = "Look up companies, people and news, and generate images, from the terminal")]
struct Cli {
    /// Forget the passphrase and cached conversations before starting
    #[arg(long)]
    new_session: bool,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// API base URL (overrides config and environment)
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = init_logging();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load().unwrap_or_else(|e| {
            warn!(error = %e, "could not load config, using defaults");
            Config::new()
        }),
    }
    .with_env_overrides();
    if let Some(base) = cli.api_base {
        config.api_base = Some(base);
    }

    let session = FileStorage::new(config.session_dir()?);
    if cli.new_session {
        session.clear().context("clearing session")?;
        info!(dir = %session.dir().display(), "started a new session");
    }
    let storage: SharedStorage = Arc::new(session);

    info!(api_base = %config.api_base(), "starting");
    let mut app = App::new(&config, storage);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event);
        app.poll_tasks().await;
    }

    info!("exiting");
    Ok(())
}

/// Log to a daily file under the cache dir; stderr belongs to the terminal.
/// Returns `None` (no logging) when there is no cache dir.
fn init_logging() -> Option<WorkerGuard> {
    let log_dir = dirs::cache_dir()?.join("phonebook").join("logs");
    std::fs::create_dir_all(&log_dir).ok()?;

    let appender = tracing_appender::rolling::daily(&log_dir, "phonebook.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .init();

    Some(guard)
}
