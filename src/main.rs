mod app;
mod assets;
mod config;
mod estimator;
mod form;
mod gateway;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{App, Popup};
use config::AppConfig;
use form::InputRecord;
use gateway::{format_currency, PredictionGateway, PredictionOutcome};

#[derive(Parser, Debug)]
#[command(name = "premia")]
#[command(author = "Sean Fournier")]
#[command(version = "0.1.0")]
#[command(about = "Estimate health insurance premiums from pre-trained regression models")]
struct Args {
    /// Use this config file instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Estimate the cost for a record in a JSON file and exit
    #[arg(short, long, value_name = "RECORD")]
    estimate: Option<PathBuf>,

    /// Print the --estimate result as JSON
    #[arg(long, requires = "estimate")]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let one_shot = args.estimate.is_some();
    init_logging(one_shot);

    let config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load().unwrap_or_default(),
    };
    let gateway = PredictionGateway::new(estimator::from_config(&config.estimator));
    tracing::info!("Using estimator: {}", gateway.describe());

    if let Some(path) = args.estimate {
        let estimated = estimate_once(&gateway, &path, args.json).await?;
        return Ok(if estimated { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    ui::init_theme(theme::Theme::from_config(&config.theme));
    run_tui(&config, gateway).await?;
    Ok(ExitCode::SUCCESS)
}

/// Log to stderr for one-shot runs, to a file while the TUI owns the screen
fn init_logging(one_shot: bool) {
    let registry = tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::from_default_env());

    if one_shot {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
        return;
    }

    let log_file = AppConfig::config_dir()
        .and_then(|dir| Ok(std::fs::File::create(dir.join("premia.log"))?));

    match log_file {
        Ok(file) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
            .init(),
        // No writable log location; stay silent rather than draw over the UI
        Err(_) => registry.init(),
    }
}

/// Print the outcome for one record file; false when no estimate was made
async fn estimate_once(gateway: &PredictionGateway, path: &Path, json: bool) -> Result<bool> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read record {}", path.display()))?;
    let record: InputRecord = serde_json::from_str(&content)
        .with_context(|| format!("Invalid record in {}", path.display()))?;

    let outcome = gateway.submit(record).await;

    if json {
        let output = match &outcome {
            PredictionOutcome::Estimated { cost, family } => serde_json::json!({
                "cost": cost,
                "display": format_currency(*cost),
                "model": family.model_name(),
            }),
            PredictionOutcome::Failed(reason) => serde_json::json!({
                "error": outcome.message(),
                "reason": reason,
            }),
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", outcome.message());
        if let Some(note) = outcome.model_note() {
            println!("{}", note);
        }
    }

    Ok(outcome.is_success())
}

async fn run_tui(config: &AppConfig, gateway: PredictionGateway) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = App::new(config, gateway);

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        // A submission was requested: the busy state is on screen, now block on the estimator
        if app.busy {
            app.run_prediction().await;
            continue;
        }

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if app.popup == Popup::None && !app.is_editing() => return Ok(()),
                        KeyCode::Char('c') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key) {
                                app.status_message = Some(format!("Error: {}", e));
                            }
                        }
                    }
                }
            }
        }

        app.tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::{Estimator, EstimatorError};
    use std::sync::Arc;

    struct Fixed(Result<f64, &'static str>);

    impl Estimator for Fixed {
        fn predict(&self, _record: &InputRecord) -> Result<f64, EstimatorError> {
            self.0.map_err(|e| EstimatorError::Failed(e.to_string()))
        }

        fn describe(&self) -> String {
            "fixed".to_string()
        }
    }

    fn record_file() -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        let record = serde_json::to_string(&InputRecord::default()).unwrap();
        std::fs::write(file.path(), record).unwrap();
        file
    }

    #[tokio::test]
    async fn test_estimate_once_reports_success() {
        let file = record_file();
        let gateway = PredictionGateway::new(Arc::new(Fixed(Ok(12345.67))));
        assert!(estimate_once(&gateway, file.path(), false).await.unwrap());
    }

    #[tokio::test]
    async fn test_estimate_once_failure_returns_instead_of_exiting() {
        let file = record_file();
        let gateway = PredictionGateway::new(Arc::new(Fixed(Err("model file not found"))));
        assert!(!estimate_once(&gateway, file.path(), true).await.unwrap());
    }

    #[tokio::test]
    async fn test_estimate_once_rejects_bad_record() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{"Age": 12}"#).unwrap();
        let gateway = PredictionGateway::new(Arc::new(Fixed(Ok(1.0))));
        let err = estimate_once(&gateway, file.path(), false).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid record"));
    }
}
