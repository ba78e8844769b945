use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
};
use stint::{
    app::{App, Flow, View},
    app_dirs::AppDirs,
    clock::{Clock, SystemClock},
    commands::{self, Command},
    config::{Config, ConfigStore, FileConfigStore},
    error::CommandError,
    runtime::{CrosstermEventSource, FixedTicker, Runner, TickSubscription},
    ui, FileStore, KeyValueStore, MemoryStore, Tracker,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// single-timer time tracker with a persisted session history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Start and stop one timer, watch it tick live, and keep every finished session in a history you can browse and prune. A running timer survives restarts."
)]
pub struct Cli {
    /// state file holding the running timer and the session history
    #[clap(long, value_name = "PATH")]
    data_file: Option<PathBuf>,

    /// keep all state in memory; nothing survives exit
    #[clap(long, conflicts_with = "data_file")]
    ephemeral: bool,

    /// config file to read instead of the default location
    #[clap(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// redisplay interval in milliseconds while the timer runs
    #[clap(short = 't', long)]
    tick_ms: Option<u64>,

    /// view to open on
    #[clap(long, value_enum)]
    view: Option<View>,

    /// append logs to this file instead of the state directory
    #[clap(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// log at debug level
    #[clap(short, long)]
    verbose: bool,

    #[clap(subcommand)]
    command: Option<Command>,
}

impl Cli {
    /// Command line flags win over the config file
    fn apply(&self, mut config: Config) -> Config {
        if let Some(ms) = self.tick_ms {
            config.refresh_interval_ms = ms;
        }
        if let Some(view) = self.view {
            config.start_view = view;
        }
        config
    }

    fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

/// Logs go to a file; the terminal belongs to the TUI.
fn init_logging(cli: &Cli) {
    let Some(path) = cli.log_file.clone().or_else(AppDirs::log_path) else {
        return;
    };
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("stint: logging disabled, cannot create {}: {e}", parent.display());
            return;
        }
    }
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("stint: logging disabled, cannot open {}: {e}", path.display());
            return;
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stint={}", cli.log_level())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config_store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let config = cli.apply(config_store.load());

    if cli.ephemeral {
        run(&cli, &config, MemoryStore::new())
    } else {
        let store = cli
            .data_file
            .as_ref()
            .map(FileStore::with_path)
            .unwrap_or_default();
        info!(path = %store.path().display(), "using state file");
        run(&cli, &config, store)
    }
}

fn run<S: KeyValueStore + Clone>(cli: &Cli, config: &Config, store: S) -> Result<(), Box<dyn Error>> {
    let mut tracker = Tracker::open(store, SystemClock);

    if let Some(command) = &cli.command {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if let Err(e) = commands::run(&mut tracker, command, &mut out) {
            let kind = match e {
                CommandError::UnknownSession(_) => ErrorKind::InvalidValue,
                _ => ErrorKind::Io,
            };
            Cli::command().error(kind, e).exit();
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(tracker, config);
    let result = start_tui(&mut terminal, &mut app, config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, S: KeyValueStore, C: Clock>(
    terminal: &mut Terminal<B>,
    app: &mut App<S, C>,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(config.refresh_interval()),
    );
    let mut ticks: Option<TickSubscription> = None;

    loop {
        // hold a tick subscription exactly while the timer runs
        match (app.wants_ticks(), ticks.is_some()) {
            (true, false) => ticks = Some(runner.subscribe_ticks()),
            (false, true) => ticks = None,
            _ => {}
        }

        terminal.draw(|f| ui::draw(app, f))?;

        let Some(event) = runner.step() else {
            break;
        };
        if app.handle_event(event) == Flow::Quit {
            break;
        }
    }

    info!("leaving tui");
    Ok(())
}
