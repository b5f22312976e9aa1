//! Application state machine and event dispatcher.

use std::path::Path;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use tokio::sync::mpsc::error::TryRecvError;
use vitae_core::{
  history::HistoryStore,
  resume::AnalysisResult,
  upload::{CandidateFile, UploadFlow, UploadState},
};

use crate::analyze::{AnalysisEvent, AnalysisHandle, Analyzer};

/// Shown after any failed analysis, above the underlying reason.
pub const RETRY_HINT: &str = "Failed to analyze resume. Please try again.";

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
  /// File picker, progress, and the latest result.
  Analyze,
  /// Table of past analyses.
  History,
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  pub tab: Tab,

  /// Per-upload state machine.
  pub flow: UploadFlow,

  /// The in-flight operation, if any. Replacing it aborts the previous one.
  pub in_flight: Option<AnalysisHandle>,

  /// Most recent successful result, shown under the uploader.
  pub latest: Option<AnalysisResult>,

  /// Session history, newest first.
  pub history: HistoryStore,

  /// Path being typed into the file prompt.
  pub path_input: String,

  /// Whether the file prompt has keyboard focus.
  pub path_active: bool,

  /// Inline message under the uploader (rejections and failures).
  pub notice: Option<String>,

  /// Current fuzzy-filter string for the history table.
  pub filter: String,

  pub filter_active: bool,

  /// Cursor position within the *filtered* history.
  pub list_cursor: usize,

  /// Result shown in the detail modal.
  pub selected: Option<AnalysisResult>,

  /// Scroll offset for whichever detail view is visible.
  pub detail_scroll: usize,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  pub analyzer: Analyzer,
}

impl App {
  pub fn new(analyzer: Analyzer) -> Self {
    Self {
      tab: Tab::Analyze,
      flow: UploadFlow::new(),
      in_flight: None,
      latest: None,
      history: HistoryStore::new(),
      path_input: String::new(),
      path_active: false,
      notice: None,
      filter: String::new(),
      filter_active: false,
      list_cursor: 0,
      selected: None,
      detail_scroll: 0,
      status_msg: String::new(),
      analyzer,
    }
  }

  pub fn is_analyzing(&self) -> bool { matches!(self.flow.state(), UploadState::Analyzing { .. }) }

  // ── Upload flow ───────────────────────────────────────────────────────────

  /// Read `path` and run it through validation. Any in-flight analysis is
  /// abandoned first.
  pub async fn select_path(&mut self, path: &Path) {
    let bytes = match tokio::fs::read(path).await {
      Ok(bytes) => bytes,
      Err(e) => {
        self.notice = Some(format!("Could not read {}: {e}", path.display()));
        return;
      }
    };
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| path.display().to_string());
    self.select_file(CandidateFile::from_name(name, bytes));
  }

  pub fn select_file(&mut self, file: CandidateFile) {
    self.in_flight = None;
    match self.flow.select(file) {
      Ok(valid) => {
        self.notice = None;
        self.status_msg = format!("Ready: {}", valid.name());
      }
      Err(e) => {
        tracing::debug!(error = %e, "file rejected");
        self.notice = Some(e.user_message().to_string());
      }
    }
  }

  /// Begin analysing the selected file. The previous operation, if any, is
  /// dropped and its ticker stops with it.
  pub fn start_analysis(&mut self) {
    match self.flow.begin() {
      Ok(file) => {
        self.notice = None;
        self.status_msg = format!("Analyzing {}…", file.name());
        self.in_flight = Some(self.analyzer.start(file));
      }
      Err(e) => self.status_msg = e.to_string(),
    }
  }

  /// Stop tracking the in-flight analysis and keep the file for another try.
  pub fn abandon_analysis(&mut self) {
    if self.in_flight.take().is_some() && self.flow.abandon().is_ok() {
      self.status_msg = "Analysis cancelled".into();
    }
  }

  /// Apply every event that is already waiting. Called once per frame.
  pub fn poll_analysis(&mut self) {
    let Some(mut handle) = self.in_flight.take() else {
      return;
    };
    loop {
      let event = match handle.try_next() {
        Ok(event) => event,
        Err(TryRecvError::Empty) => break,
        Err(TryRecvError::Disconnected) => {
          tracing::warn!(file = handle.file_name(), "analysis exited without a result");
          AnalysisEvent::stopped_early()
        }
      };
      if self.apply_event(event) {
        return;
      }
    }
    self.in_flight = Some(handle);
  }

  /// Wait for the in-flight analysis to finish, applying events as they
  /// arrive.
  pub async fn wait_for_analysis(&mut self) {
    let Some(mut handle) = self.in_flight.take() else {
      return;
    };
    while let Some(event) = handle.next().await {
      if self.apply_event(event) {
        return;
      }
    }
    self.apply_event(AnalysisEvent::stopped_early());
  }

  /// Returns `true` once the operation has finished.
  fn apply_event(&mut self, event: AnalysisEvent) -> bool {
    match event {
      AnalysisEvent::Progress(value) => {
        let _ = self.flow.set_progress(value);
        false
      }
      AnalysisEvent::Finished(Ok(result)) => {
        if self.flow.succeed(result.clone()).is_ok() {
          self.status_msg = format!("Analyzed {}", result.file_name);
          self.history.record(result.clone());
          self.latest = Some(result);
          self.detail_scroll = 0;
        }
        true
      }
      AnalysisEvent::Finished(Err(error)) => {
        self.notice = Some(format!("{RETRY_HINT} ({})", error.message()));
        self.status_msg = String::new();
        let _ = self.flow.fail(error);
        true
      }
    }
  }

  // ── History ───────────────────────────────────────────────────────────────

  /// Replace the history with the backend listing. A failure only changes the
  /// status line.
  pub async fn refresh_history(&mut self) {
    self.status_msg = "Loading history…".into();
    match self.history.refresh(self.analyzer.client()).await {
      Ok(entries) => {
        self.status_msg = format!("Loaded {} analyses", entries.len());
        self.list_cursor = 0;
      }
      Err(e) => {
        tracing::warn!(error = %e, "history refresh failed");
        self.status_msg = format!("Error: {e}");
      }
    }
  }

  /// History entries that match the current filter query, in history order.
  pub fn filtered_history(&self) -> Vec<&AnalysisResult> {
    if self.filter.is_empty() {
      return self.history.entries().iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .history
      .entries()
      .iter()
      .filter(|r| {
        matcher.fuzzy_match(r.display_name(), &self.filter).is_some()
          || matcher.fuzzy_match(&r.file_name, &self.filter).is_some()
      })
      .collect()
  }

  pub fn cursor_entry(&self) -> Option<&AnalysisResult> {
    self.filtered_history().get(self.list_cursor).copied()
  }

  /// Open the detail modal for the entry under the cursor. Entries with an
  /// identifier are resolved through the store so the modal shows the stored
  /// copy.
  pub fn open_detail(&mut self) {
    let Some(entry) = self.cursor_entry() else {
      return;
    };
    let resolved = match entry.id {
      Some(id) => self.history.find_by_id(id).cloned(),
      None => Some(entry.clone()),
    };
    if let Some(result) = resolved {
      self.selected = Some(result);
      self.detail_scroll = 0;
    }
  }

  pub fn close_detail(&mut self) {
    self.selected = None;
    self.detail_scroll = 0;
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    if self.path_active {
      return self.handle_path_key(key).await;
    }
    if self.filter_active {
      return Ok(self.handle_filter_key(key));
    }
    if self.selected.is_some() {
      return Ok(self.handle_modal_key(key));
    }

    match key.code {
      KeyCode::Tab | KeyCode::BackTab => {
        self.tab = match self.tab {
          Tab::Analyze => Tab::History,
          Tab::History => Tab::Analyze,
        };
        return Ok(true);
      }
      KeyCode::Char('q') => return Ok(false),
      _ => {}
    }

    match self.tab {
      Tab::Analyze => Ok(self.handle_analyze_key(key)),
      Tab::History => self.handle_history_key(key).await,
    }
  }

  async fn handle_path_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Esc => {
        self.path_active = false;
      }
      KeyCode::Enter => {
        self.path_active = false;
        let raw = self.path_input.trim().to_string();
        if !raw.is_empty() {
          self.select_path(Path::new(&raw)).await;
        }
      }
      KeyCode::Backspace => {
        self.path_input.pop();
      }
      KeyCode::Char(c) => self.path_input.push(c),
      _ => {}
    }
    Ok(true)
  }

  fn handle_filter_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Enter => {
        self.filter_active = false;
        self.list_cursor = 0;
        // Immediately open detail if there's exactly one match.
        if self.filtered_history().len() == 1 {
          self.open_detail();
        }
      }
      KeyCode::Backspace => {
        self.filter.pop();
        self.list_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.list_cursor = 0;
      }
      _ => {}
    }
    true
  }

  fn handle_modal_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => self.close_detail(),
      KeyCode::Down | KeyCode::Char('j') => self.detail_scroll += 1,
      KeyCode::Up | KeyCode::Char('k') => self.detail_scroll = self.detail_scroll.saturating_sub(1),
      _ => {}
    }
    true
  }

  fn handle_analyze_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      // File prompt
      KeyCode::Char('o') | KeyCode::Char('/') => {
        self.path_active = true;
      }

      // Analyze / retry
      KeyCode::Enter | KeyCode::Char('a') if !self.is_analyzing() => self.start_analysis(),

      KeyCode::Esc if self.is_analyzing() => self.abandon_analysis(),

      // Scroll the latest result
      KeyCode::Down | KeyCode::Char('j') => self.detail_scroll += 1,
      KeyCode::Up | KeyCode::Char('k') => self.detail_scroll = self.detail_scroll.saturating_sub(1),

      _ => {}
    }
    true
  }

  async fn handle_history_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      // Navigation
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.filtered_history().len();
        if len > 0 && self.list_cursor + 1 < len {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.list_cursor = self.list_cursor.saturating_sub(1);
      }

      // Open detail
      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => self.open_detail(),

      // Filter
      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.list_cursor = 0;
      }

      // Refresh from backend
      KeyCode::Char('r') => self.refresh_history().await,

      _ => {}
    }
    Ok(true)
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;
  use crate::{
    analyze::{AnalyzeMode, Timing},
    client::{ApiClient, ApiConfig},
    test_support::{Backend, spawn_backend, unreachable_url},
  };
  use vitae_core::upload::PDF_MEDIA_TYPE;

  fn app(url: String, mode: AnalyzeMode) -> App {
    let client = ApiClient::new(ApiConfig { base_url: url, timeout: Duration::from_secs(5) })
      .unwrap();
    let timing = Timing {
      progress_interval: Duration::from_millis(10),
      simulated_delay: Duration::from_millis(40),
      ..Timing::default()
    };
    App::new(Analyzer::new(client, mode, timing))
  }

  fn pdf(name: &str) -> CandidateFile {
    CandidateFile::new(name, PDF_MEDIA_TYPE, b"%PDF-1.7".to_vec())
  }

  fn key(code: KeyCode) -> KeyEvent { KeyEvent::new(code, KeyModifiers::NONE) }

  #[tokio::test]
  async fn poll_fails_analysis_whose_task_exited_silently() {
    let mut app = app(unreachable_url().await, AnalyzeMode::Simulated);
    app.select_file(pdf("cv.pdf"));
    app.flow.begin().unwrap();
    app.in_flight =
      Some(AnalysisHandle::exited("cv.pdf", vec![AnalysisEvent::Progress(0)]));

    app.poll_analysis();

    assert!(app.in_flight.is_none());
    assert!(matches!(app.flow.state(), UploadState::Failed { .. }));
    assert!(app.notice.as_deref().is_some_and(|n| n.contains("stopped before")));
    assert!(app.history.is_empty());
  }

  #[tokio::test]
  async fn poll_keeps_handle_while_operation_is_quiet() {
    let mut app = app(unreachable_url().await, AnalyzeMode::Simulated);
    app.select_file(pdf("cv.pdf"));
    app.start_analysis();

    app.poll_analysis();

    assert!(app.in_flight.is_some());
    assert!(app.is_analyzing());
  }

  #[tokio::test]
  async fn text_file_shows_notice_and_never_analyzes() {
    let mut app = app(unreachable_url().await, AnalyzeMode::Auto);
    app.select_file(CandidateFile::from_name("notes.txt", b"hi".to_vec()));

    assert_eq!(app.notice.as_deref(), Some("Please upload a valid PDF file"));
    app.start_analysis();
    assert!(app.in_flight.is_none());
    assert!(!app.is_analyzing());
    assert!(app.history.is_empty());
  }

  #[tokio::test]
  async fn offline_analysis_lands_at_front_of_history() {
    let mut app = app(unreachable_url().await, AnalyzeMode::Auto);
    app.select_file(pdf("cv.pdf"));
    app.start_analysis();
    assert!(app.is_analyzing());
    app.wait_for_analysis().await;

    assert!(matches!(app.flow.state(), UploadState::Succeeded { .. }));
    assert_eq!(app.history.get(0).map(|r| r.file_name.as_str()), Some("cv.pdf"));
    assert_eq!(app.latest.as_ref().map(|r| r.file_name.as_str()), Some("cv.pdf"));
    assert!(app.in_flight.is_none());
  }

  #[tokio::test]
  async fn server_error_resets_progress_and_keeps_history() {
    let url = spawn_backend(Backend { upload_status: 500, ..Backend::default() }).await;
    let mut app = app(url, AnalyzeMode::Auto);
    app.select_file(pdf("cv.pdf"));
    app.start_analysis();
    app.wait_for_analysis().await;

    assert!(matches!(app.flow.state(), UploadState::Failed { .. }));
    assert_eq!(app.flow.state().progress(), 0);
    assert!(app.history.is_empty());
    assert!(app.latest.is_none());
    assert!(app.notice.as_deref().unwrap().starts_with(RETRY_HINT));

    // The same file can be retried without reselecting it.
    app.start_analysis();
    assert!(app.is_analyzing());
  }

  #[tokio::test]
  async fn sequential_analyses_are_newest_first() {
    let mut app = app(unreachable_url().await, AnalyzeMode::Simulated);
    for name in ["a.pdf", "b.pdf"] {
      app.select_file(pdf(name));
      app.start_analysis();
      app.wait_for_analysis().await;
    }
    let files: Vec<_> = app.history.entries().iter().map(|r| r.file_name.as_str()).collect();
    assert_eq!(files, vec!["b.pdf", "a.pdf"]);
  }

  #[tokio::test]
  async fn new_selection_drops_in_flight_operation() {
    let mut app = app(unreachable_url().await, AnalyzeMode::Simulated);
    app.select_file(pdf("a.pdf"));
    app.start_analysis();
    app.select_file(pdf("b.pdf"));

    assert!(app.in_flight.is_none());
    assert!(matches!(app.flow.state(), UploadState::Validated(f) if f.name() == "b.pdf"));
    app.wait_for_analysis().await;
    assert!(app.history.is_empty());
  }

  #[tokio::test]
  async fn esc_abandons_and_keeps_file() {
    let mut app = app(unreachable_url().await, AnalyzeMode::Simulated);
    app.select_file(pdf("a.pdf"));
    app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
    assert!(app.is_analyzing());

    app.handle_key(key(KeyCode::Esc)).await.unwrap();
    assert!(app.in_flight.is_none());
    assert!(matches!(app.flow.state(), UploadState::Validated(_)));
  }

  #[tokio::test]
  async fn refresh_replaces_history_from_backend() {
    let url = spawn_backend(Backend::default()).await;
    let mut app = app(url, AnalyzeMode::Auto);
    app.refresh_history().await;
    let ids: Vec<_> = app.history.entries().iter().filter_map(|r| r.id).collect();
    assert_eq!(ids, vec![2, 1]);
  }

  #[tokio::test]
  async fn failed_refresh_keeps_local_history() {
    let mut app = app(unreachable_url().await, AnalyzeMode::Simulated);
    app.select_file(pdf("a.pdf"));
    app.start_analysis();
    app.wait_for_analysis().await;
    let before = app.history.entries().to_vec();

    app.refresh_history().await;
    assert!(app.status_msg.starts_with("Error:"), "{}", app.status_msg);
    assert_eq!(app.history.entries(), before.as_slice());
  }

  #[tokio::test]
  async fn history_modal_opens_and_closes() {
    let url = spawn_backend(Backend::default()).await;
    let mut app = app(url, AnalyzeMode::Auto);
    app.refresh_history().await;
    app.handle_key(key(KeyCode::Tab)).await.unwrap();
    app.handle_key(key(KeyCode::Char('j'))).await.unwrap();
    app.handle_key(key(KeyCode::Enter)).await.unwrap();
    assert_eq!(app.selected.as_ref().and_then(|r| r.id), Some(1));

    app.handle_key(key(KeyCode::Esc)).await.unwrap();
    assert!(app.selected.is_none());
  }

  #[tokio::test]
  async fn filter_matches_file_name() {
    let url = spawn_backend(Backend::default()).await;
    let mut app = app(url, AnalyzeMode::Auto);
    app.refresh_history().await;
    app.filter = "second".into();
    let hits: Vec<_> = app.filtered_history().iter().filter_map(|r| r.id).collect();
    assert_eq!(hits, vec![2]);
  }
}
