//! `vitae` — terminal UI for résumé analysis.
//!
//! # Usage
//!
//! ```
//! vitae --url http://localhost:3001
//! vitae --mode simulated
//! vitae --config ~/.config/vitae/config.toml analyze resume.pdf
//! vitae history
//! vitae show 42
//! ```

mod analyze;
mod app;
mod client;
mod ui;

#[cfg(test)]
mod test_support;

use std::{
  fs::File,
  io,
  path::{Path, PathBuf},
  sync::Mutex,
  time::Duration,
};

use analyze::{AnalyzeMode, Analyzer, Timing};
use anyhow::{Context, Result, bail};
use app::App;
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vitae_core::{resume::AnalysisResult, upload::UploadState};

const DEFAULT_URL: &str = "http://localhost:3001";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "vitae", about = "Terminal UI for résumé analysis")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the analysis backend (default: http://localhost:3001).
  #[arg(long, env = "VITAE_URL")]
  url: Option<String>,

  /// How to choose between the backend and the built-in simulator.
  #[arg(long, env = "VITAE_MODE", value_enum)]
  mode: Option<AnalyzeMode>,

  /// Append logs to this file. The interactive UI logs nowhere otherwise.
  #[arg(long, env = "VITAE_LOG", value_name = "FILE")]
  log_file: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Analyze one PDF and print the result as JSON.
  Analyze { file: PathBuf },
  /// Load the backend's history and print it as a table.
  History,
  /// Print one stored analysis as JSON.
  Show { id: i64 },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file. There is deliberately no place for
/// API keys: the backend holds its own credentials.
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
  #[serde(default)]
  url:                  String,
  mode:                 Option<AnalyzeMode>,
  timeout_secs:         Option<u64>,
  simulated_delay_ms:   Option<u64>,
  progress_interval_ms: Option<u64>,
  progress_step:        Option<u8>,
  progress_cap:         Option<u8>,
}

impl ConfigFile {
  fn timing(&self) -> Timing {
    let defaults = Timing::default();
    Timing {
      progress_interval: self
        .progress_interval_ms
        .map_or(defaults.progress_interval, Duration::from_millis),
      progress_step:     self.progress_step.unwrap_or(defaults.progress_step),
      progress_cap:      self.progress_cap.unwrap_or(defaults.progress_cap),
      simulated_delay:   self
        .simulated_delay_ms
        .map_or(defaults.simulated_delay, Duration::from_millis),
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  init_tracing(args.log_file.as_deref(), args.command.is_some())?;

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
    timeout:  Duration::from_secs(file_cfg.timeout_secs.unwrap_or(30)),
  };
  let mode = args.mode.or(file_cfg.mode).unwrap_or_default();

  let client = ApiClient::new(api_config)?;
  let analyzer = Analyzer::new(client, mode, file_cfg.timing());
  tracing::debug!(url = analyzer.client().base_url(), ?mode, "configured");

  match args.command {
    Some(Command::Analyze { file }) => run_analyze(analyzer, &file).await,
    Some(Command::History) => run_history(analyzer).await,
    Some(Command::Show { id }) => run_show(analyzer, id).await,
    None => run_tui(analyzer).await,
  }
}

fn init_tracing(log_file: Option<&Path>, headless: bool) -> Result<()> {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();

  match log_file {
    Some(path) => {
      let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    }
    // Headless commands own stdout for their output; logs go to stderr.
    None if headless => {
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    }
    None => {}
  }
  Ok(())
}

// ─── Headless commands ────────────────────────────────────────────────────────

async fn run_analyze(analyzer: Analyzer, path: &Path) -> Result<()> {
  let mut app = App::new(analyzer);
  app.select_path(path).await;
  if let Some(notice) = app.notice.take() {
    bail!("{notice}");
  }

  app.start_analysis();
  app.wait_for_analysis().await;

  match app.flow.state() {
    UploadState::Succeeded { result, .. } => {
      println!("{}", serde_json::to_string_pretty(result)?);
      Ok(())
    }
    UploadState::Failed { error, .. } => bail!("{error}"),
    other => bail!("analysis ended in unexpected state {other:?}"),
  }
}

async fn run_history(analyzer: Analyzer) -> Result<()> {
  let mut app = App::new(analyzer);
  app
    .history
    .refresh(app.analyzer.client())
    .await
    .context("loading history")?;

  for r in app.history.entries() {
    println!(
      "{:>8}  {:<32}  {:<24}  {}",
      r.id.map(|id| id.to_string()).unwrap_or_default(),
      r.file_name,
      r.display_name(),
      ui::resume_detail::format_rating(r.resume_rating),
    );
  }
  Ok(())
}

async fn run_show(analyzer: Analyzer, id: i64) -> Result<()> {
  let result = load_analysis(analyzer.client(), id).await?;
  println!("{}", serde_json::to_string_pretty(&result)?);
  Ok(())
}

/// Point lookup of one stored analysis.
async fn load_analysis(client: &ApiClient, id: i64) -> Result<AnalysisResult> {
  client.get_resume(id).await.with_context(|| format!("loading analysis {id}"))
}

// ─── Interactive UI ───────────────────────────────────────────────────────────

async fn run_tui(analyzer: Analyzer) -> Result<()> {
  let mut app = App::new(analyzer);

  // Seed history from the backend when one may exist; failure is only a notice.
  if app.analyzer.mode() != AnalyzeMode::Simulated {
    app.refresh_history().await;
  }

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Run the event loop; restore terminal even on error.
  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    app.poll_analysis();
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && !app.handle_key(key).await?
    {
      break;
    }
  }

  Ok(())
}
