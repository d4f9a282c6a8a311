use clap::{Parser, ValueEnum};
use color_eyre::Result;
use crossterm::event::{Event as CEvent, EventStream};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use futures::StreamExt;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use statlens::config::Config;
use statlens::core::{WorkflowState, shared_state};
use statlens::services::HttpAnalysisService;
use statlens::tui::{App, AppEvent};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tracing::{error, info};

/// Terminal client for a remote tabular-data analysis service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable file logging at the given level (overrides RUST_LOG)
    #[arg(long = "logging", value_enum)]
    logging: Option<LogLevel>,
    /// Path to a config file (overrides default config discovery)
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
    /// Base URL of the analysis service, e.g. http://127.0.0.1:5000
    #[arg(long = "service-url", value_name = "URL")]
    service_url: Option<String>,
    /// Dataset to upload on startup
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LogLevel { Error, Warn, Info, Debug, Trace }

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

type Term = Terminal<CrosstermBackend<io::Stdout>>;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    statlens::logging::init_with(None, args.logging.map(Into::into))?;

    let config = Config::from_path(args.config.as_ref())?.with_service_url(args.service_url.clone());
    info!(service = %config.service.base_url, "starting");

    let service = Arc::new(HttpAnalysisService::new(config.service.clone())?);
    let state = shared_state(WorkflowState::new());
    let (tx, rx) = unbounded_channel();
    let mut app = App::new(service, state, &config, tx);

    // Put the terminal back before the panic report is printed
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        default_hook(info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    // Controllers are not Send, so everything runs on one thread
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let local = tokio::task::LocalSet::new();
    if let Some(path) = args.file {
        app.prefill_upload(path);
    }
    let res = local.block_on(&runtime, run_app(&mut terminal, &mut app, rx));

    restore_terminal()?;
    if let Err(e) = res {
        error!("Error: {e}");
        return Err(color_eyre::eyre::eyre!(e));
    }
    Ok(())
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)
}

async fn run_app(
    terminal: &mut Term,
    app: &mut App<HttpAnalysisService>,
    mut events: UnboundedReceiver<AppEvent>,
) -> anyhow::Result<()> {
    let mut input = EventStream::new();
    // Redraw periodically so the status clock and pending count stay current
    let mut tick = tokio::time::interval(Duration::from_millis(250));

    while !app.should_quit() {
        terminal.draw(|f| app.render(f))?;
        tokio::select! {
            maybe_event = input.next() => match maybe_event {
                Some(Ok(CEvent::Key(key))) => app.handle_key_event(key),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            Some(event) = events.recv() => app.handle_event(event),
            _ = tick.tick() => {}
        }
    }
    Ok(())
}
