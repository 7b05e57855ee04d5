//! Polar Kiosk Entry Point
//!
//! Launches the terminal display for the polar fish kiosk.
//!
//! Usage:
//!   polar-kiosk [OPTIONS]
//!
//! Options:
//!   --config <PATH>          Config file (env: KIOSK_CONFIG)
//!   --display-seconds <S>    How long a scanned specimen stays up
//!   --debug-key <CHAR>       Key that requests a random specimen
//!   --catalog <PATH>         Catalog JSON
//!   --feed <PATH>            Scanner feed (file or FIFO)
//!   --no-fullscreen          Stay windowed
//!   --layout <card|compact>  Specimen layout
//!   --log-file <PATH>        Write logs here (the screen belongs to the kiosk)

use std::fs::File;
use std::io;
use std::panic;
use std::sync::Mutex;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kiosk_core::ConfigOverrides;
use polar_kiosk::{App, Args, StartupError, TerminalWindow};

fn init_logging(args: &Args) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("polar_kiosk=info".parse()?)
        .add_directive("kiosk_core=info".parse()?);
    let registry = tracing_subscriber::registry().with(filter);

    match &args.log_file {
        Some(path) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(File::create(path)?)),
            )
            .init(),
        None => registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::sink))
            .init(),
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let (config, source) = args.resolve_config(ConfigOverrides::from_env())?;
    tracing::info!(source = %source, layout = ?args.layout, "configuration loaded");

    // Check if we have a TTY before attempting initialization
    use std::io::IsTerminal;

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        return Err(StartupError::NotATerminal.into());
    }

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    terminal.hide_cursor()?;

    let size = terminal.size()?;
    let area = Rect::new(0, 0, size.width, size.height);

    let mut app = App::new(config, args.layout, area).await;
    app.start(Some(Box::new(TerminalWindow::stdout())));
    let result = app.run(&mut terminal).await;
    drop(app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Propagate any errors
    result
}
