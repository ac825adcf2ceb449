//! vitalis: biometric companion in the terminal.
//!
//! Run: cargo run -p vitalis-terminal --bin vitalis -- --offline

use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vitalis_core::{Dialer, Engine, EngineConfig, LoopbackDialer};
use vitalis_terminal::{
    run, App, CellBuffer, ColorMode, CrosstermBackend, DemoFeed, GenericTerminal, RunOptions,
    TerminalError, WsDialer,
};

/// Biometric HUD, dashboard and atmosphere for the terminal
#[derive(Parser)]
#[command(name = "vitalis", version, about, long_about = None)]
struct Cli {
    /// Event server URL (overrides the config file)
    #[arg(short, long, value_name = "URL")]
    url: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log file (the terminal is in raw mode, so logs never go to stdout)
    #[arg(long, value_name = "PATH", default_value = "vitalis.log")]
    log_file: PathBuf,

    /// Seed for particles and jitter
    #[arg(long)]
    seed: Option<u64>,

    /// Run against the built-in demo feed instead of a server
    #[arg(long)]
    offline: bool,

    /// Color depth (detected from the environment by default)
    #[arg(long, value_enum)]
    color: Option<ColorMode>,

    /// Dump the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,

    /// Render a few offline frames to stdout as plain text and exit
    #[arg(long)]
    render_once: bool,

    /// Terminal width for render-once mode
    #[arg(long, default_value = "100")]
    width: u16,

    /// Terminal height for render-once mode
    #[arg(long, default_value = "30")]
    height: u16,
}

fn init_logging(path: &Path) -> Result<(), TerminalError> {
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| TerminalError::Logging(e.to_string()))
}

fn load_config(cli: &Cli) -> Result<EngineConfig, TerminalError> {
    let mut config = EngineConfig::load(cli.config.as_deref())?;
    if let Some(url) = &cli.url {
        config.url.clone_from(url);
        config.validate()?;
    }
    Ok(config)
}

fn offline_app(
    config: EngineConfig,
    width: u16,
    height: u16,
    seed: Option<u64>,
) -> App<LoopbackDialer> {
    let (dialer, handle) = LoopbackDialer::new();
    App::new(Engine::new(config, dialer), width, height, seed)
        .with_demo_feed(DemoFeed::new(handle))
}

fn render_once(cli: &Cli, config: EngineConfig) -> Result<(), TerminalError> {
    let seed = cli.seed.or(Some(0));
    let mut app = offline_app(config, cli.width, cli.height, seed);
    app.start(0);
    for frame in 1..=30 {
        app.tick(frame * 16);
    }
    let mut buffer = CellBuffer::new(cli.width, cli.height);
    app.render(&mut buffer, 30 * 16);
    app.shutdown();

    let mut stdout = io::stdout().lock();
    for y in 0..buffer.height() {
        writeln!(stdout, "{}", buffer.row_text(y))?;
    }
    stdout.flush()?;
    Ok(())
}

fn launch<D: Dialer>(mut app: App<D>, options: RunOptions) -> Result<(), TerminalError> {
    let mut terminal = GenericTerminal::new(CrosstermBackend::new());
    run(&mut app, &mut terminal, options)?;
    Ok(())
}

fn try_main(cli: &Cli) -> Result<(), TerminalError> {
    let config = load_config(cli)?;

    if cli.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }
    if cli.render_once {
        return render_once(cli, config);
    }
    if !io::stdout().is_terminal() {
        return Err(TerminalError::TerminalNotAvailable);
    }

    init_logging(&cli.log_file)?;
    let options = RunOptions {
        color_mode: cli.color.unwrap_or_else(ColorMode::detect),
        ..RunOptions::default()
    };
    let (width, height) = crossterm::terminal::size()?;

    if cli.offline {
        info!("starting offline with the demo feed");
        launch(offline_app(config, width, height, cli.seed), options)
    } else {
        info!(url = %config.url, "starting");
        let engine = Engine::new(config, WsDialer::default());
        launch(App::new(engine, width, height, cli.seed), options)
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = try_main(&cli) {
        error!(error = %e, "vitalis exited with an error");
        eprintln!("vitalis: {e}");
        std::process::exit(1);
    }
}
