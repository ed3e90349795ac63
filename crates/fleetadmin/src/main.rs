use std::env;
use std::io::{self, Stdout};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use fleetadmin::app::App;
use fleetadmin::config;
use fleetadmin::schema::EntityKind;
use fleetadmin::service::{HttpStore, MemoryStore, RecordStore};

fn print_version() {
    println!("fleetadmin {}", env!("CARGO_PKG_VERSION"));
}

fn print_usage() {
    eprintln!("fleetadmin - fleet management console for the terminal");
    eprintln!();
    eprintln!("Usage: fleetadmin [OPTIONS] [API_URL]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [API_URL]         Base URL of the fleet API");
    eprintln!("                    (e.g., https://fleet.example.com/api)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -h, --help        Print this help message");
    eprintln!("  -V, --version     Print version information");
    eprintln!("      --demo        Run against built-in sample data (no backend)");
    eprintln!();
    eprintln!("Environment Variables:");
    eprintln!("  FLEET_API_URL     Default API URL if not provided as argument");
    eprintln!("  FLEETADMIN_LOG    Log filter (logs go to the config directory)");
    eprintln!();
    eprintln!("Configuration:");
    if let Some(path) = config::config_path() {
        eprintln!("  Config file: {}", path.display());
    }
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  fleetadmin --demo");
    eprintln!("  fleetadmin https://fleet.example.com/api");
    eprintln!("  FLEET_API_URL=http://localhost:8080/api fleetadmin");
}

fn init_logging() {
    let Some(path) = config::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(file) = std::fs::File::options().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_env("FLEETADMIN_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // The TUI owns stdout, so logs go to a file. Ignore double-init in
    // tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .try_init();
}

/// Restores the terminal on every exit path, including panics.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage();
        return Ok(());
    }

    if args.iter().any(|a| a == "-V" || a == "--version") {
        print_version();
        return Ok(());
    }

    let demo = args.iter().any(|a| a == "--demo");

    let cfg = config::load_config().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {e}");
        config::Config::default()
    });

    init_logging();

    // API URL priority: CLI arg > FLEET_API_URL env var > config file
    let api_url = args
        .iter()
        .skip(1)
        .find(|a| !a.starts_with('-'))
        .cloned()
        .or_else(|| env::var("FLEET_API_URL").ok())
        .or_else(|| cfg.api.base_url.clone());

    let store: Arc<dyn RecordStore> = if demo {
        Arc::new(MemoryStore::with_demo_data())
    } else {
        let Some(url) = api_url else {
            bail!(
                "no fleet API configured; pass an API_URL argument, set FLEET_API_URL, \
                 or run with --demo"
            );
        };
        Arc::new(HttpStore::new(&url).with_context(|| format!("invalid API URL: {url}"))?)
    };

    let rt = Runtime::new().context("failed to initialize tokio runtime")?;
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let mut guard =
        TerminalGuard::new().context("failed to initialize terminal; are you running in a real TTY?")?;

    let mut app = App::new(
        store,
        EntityKind::Vehicles,
        cfg,
        rt.handle().clone(),
        events_tx,
        events_rx,
    );

    app.run(&mut guard.terminal)
}
