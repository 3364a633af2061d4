use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use ratatui::crossterm::event;
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use report_reader_core::Config;
use report_reader_http::ReportUpload;

mod action;
mod app;
mod backend;
mod input;
mod model;
mod theme;
mod tui_event;
mod view;

use app::App;

/// Medical Report Reader TUI - upload report images and watch them being analyzed.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Report images to choose from
    report_paths: Vec<PathBuf>,

    /// Processing endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Time spent on the "Extracting Text" stage, in milliseconds
    #[arg(long)]
    extract_delay_ms: Option<u64>,

    /// Time spent on the "Analyzing with AI" stage, in milliseconds
    #[arg(long)]
    analyze_delay_ms: Option<u64>,

    /// Give up on the request after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

/// Command line flags win over everything resolved before them.
fn apply_args(config: &mut Config, args: &Args) {
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(ms) = args.extract_delay_ms {
        config.delays.extracting = Duration::from_millis(ms);
    }
    if let Some(ms) = args.analyze_delay_ms {
        config.delays.analyzing = Duration::from_millis(ms);
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout = Some(Duration::from_secs(secs));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    for path in &args.report_paths {
        if !path.exists() {
            anyhow::bail!("Report file not found: {}", path.display());
        }
    }

    // Resolve config from CLI flags > env vars > config file > defaults
    let mut config = Config::resolve(args.config.as_deref())?;
    apply_args(&mut config, &args);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let backend = backend::http_backend(&config, tx)?;

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // Install panic hook that restores terminal before printing panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    // Drain any stray input events (e.g. Enter keypress from launching the command)
    while event::poll(Duration::from_millis(50)).unwrap_or(false) {
        let _ = event::read();
    }

    let mut app = App::new(args.report_paths.clone(), config.endpoint.clone());

    // Also handle Ctrl+C at the OS level for clean shutdown
    let cancel = CancellationToken::new();
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_for_signal.cancel();
        }
    });

    let tick_rate = Duration::from_millis(100);

    loop {
        terminal.draw(|f| app.view(f))?;

        tokio::select! {
            Some(backend_event) = rx.recv() => {
                app.handle_backend_event(backend_event);
                while let Ok(evt) = rx.try_recv() {
                    app.handle_backend_event(evt);
                }
            }
            _ = async {
                if event::poll(tick_rate).unwrap_or(false) {
                    if let Ok(evt) = event::read() {
                        app.update(input::map_event(&evt));
                    }
                }
            } => {}
        }

        if let Some(index) = app.take_submit_request() {
            let path = app.reports[index].path.clone();
            let id = backend.submit(index, ReportUpload::new(path));
            app.begin_submission(index, id);
        }

        app.update(action::Action::Tick);

        if app.should_quit || cancel.is_cancelled() {
            backend.shutdown();
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_resolved_config() {
        let args = Args::parse_from([
            "report-reader-tui",
            "a.png",
            "b.png",
            "--analyze-delay-ms",
            "250",
        ]);
        let mut config = Config::default();
        apply_args(&mut config, &args);

        assert_eq!(args.report_paths.len(), 2);
        assert_eq!(config.delays.analyzing, Duration::from_millis(250));
        assert_eq!(config.delays.extracting, Config::default().delays.extracting);
        assert_eq!(config.timeout, None);
    }
}
