//! The upload-and-analyze driver.
//!
//! [`Analyzer::start`] spawns one in-flight operation and returns its
//! [`AnalysisHandle`]. The operation checks the backend (unless the mode says
//! otherwise), produces a result through the selected [`AnalysisSource`], and
//! runs the progress ticker alongside it. Dropping the handle aborts the task,
//! ticker included, so a newer operation always wins.

use std::{
  sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
  },
  time::Duration,
};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::{
  sync::mpsc::{self, error::TryRecvError},
  task::JoinHandle,
  time::{Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};
use vitae_core::{
  AnalysisError, RequestError,
  progress::{self, Progress},
  resume::AnalysisResult,
  sample,
  upload::ValidFile,
};

use crate::client::ApiClient;

// ─── Configuration ────────────────────────────────────────────────────────────

/// How the analyzer chooses between the backend and the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzeMode {
  /// Check `/api/health`; simulate if the backend is unreachable.
  #[default]
  Auto,
  /// Skip the health check and always upload.
  Backend,
  /// Skip the health check and always simulate.
  Simulated,
}

/// Timer settings for the progress ticker and the simulator.
#[derive(Debug, Clone)]
pub struct Timing {
  pub progress_interval: Duration,
  pub progress_step:     u8,
  pub progress_cap:      u8,
  pub simulated_delay:   Duration,
}

impl Default for Timing {
  fn default() -> Self {
    Self {
      progress_interval: Duration::from_millis(200),
      progress_step:     progress::DEFAULT_STEP,
      progress_cap:      progress::DEFAULT_CAP,
      simulated_delay:   Duration::from_secs(2),
    }
  }
}

// ─── Connectivity ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectivityStatus {
  Connected,
  Disconnected { reason: RequestError },
}

// ─── Sources ──────────────────────────────────────────────────────────────────

/// Hands out strictly increasing millisecond identifiers for simulated
/// results, so two analyses in the same millisecond never collide in history.
#[derive(Debug, Default)]
pub struct IdClock {
  last: AtomicI64,
}

impl IdClock {
  pub fn next(&self, now: DateTime<Utc>) -> i64 {
    let candidate = now.timestamp_millis();
    let prev = self
      .last
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
        Some(candidate.max(last + 1))
      })
      .unwrap_or_else(|last| last);
    candidate.max(prev + 1)
  }
}

/// One way of turning a validated file into an [`AnalysisResult`].
#[derive(Clone)]
pub enum AnalysisSource {
  Backend(ApiClient),
  Simulated { delay: Duration, ids: Arc<IdClock> },
}

impl AnalysisSource {
  pub fn label(&self) -> &'static str {
    match self {
      Self::Backend(_) => "backend",
      Self::Simulated { .. } => "simulated",
    }
  }

  pub async fn produce(&self, file: &ValidFile) -> Result<AnalysisResult, AnalysisError> {
    match self {
      Self::Backend(client) => client.upload_resume(file).await.map_err(AnalysisError),
      Self::Simulated { delay, ids } => {
        tokio::time::sleep(*delay).await;
        let now = Utc::now();
        Ok(sample::simulated_result(file.name(), ids.next(now), now))
      }
    }
  }
}

// ─── Events & handle ──────────────────────────────────────────────────────────

/// What an in-flight operation reports. Every operation sends `Progress(0)`
/// first and exactly one `Finished` last; on success `Progress(100)` comes
/// immediately before `Finished`.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisEvent {
  Progress(u8),
  Finished(Result<AnalysisResult, AnalysisError>),
}

impl AnalysisEvent {
  /// Stands in for the `Finished` of an operation that went away without
  /// sending one.
  pub fn stopped_early() -> Self {
    Self::Finished(Err(AnalysisError(RequestError::Transport(
      "analysis stopped before reporting a result".into(),
    ))))
  }
}

/// Owner of one in-flight operation. Dropping it aborts the task.
pub struct AnalysisHandle {
  file_name: String,
  events:    mpsc::UnboundedReceiver<AnalysisEvent>,
  task:      JoinHandle<()>,
}

impl AnalysisHandle {
  pub fn file_name(&self) -> &str { &self.file_name }

  /// Next event without waiting. `Disconnected` means the operation is gone
  /// and nothing more will arrive.
  pub fn try_next(&mut self) -> Result<AnalysisEvent, TryRecvError> { self.events.try_recv() }

  /// Next event; `None` once the operation is gone.
  pub async fn next(&mut self) -> Option<AnalysisEvent> { self.events.recv().await }

  /// Abort the operation and wait for it to stop. Returns `true` if it was
  /// still running.
  pub async fn cancel(mut self) -> bool {
    self.task.abort();
    (&mut self.task).await.is_err_and(|e| e.is_cancelled())
  }
}

#[cfg(test)]
impl AnalysisHandle {
  /// A handle whose operation already exited after sending `events`.
  pub(crate) fn exited(file_name: &str, events: Vec<AnalysisEvent>) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    for event in events {
      let _ = tx.send(event);
    }
    Self { file_name: file_name.into(), events: rx, task: tokio::spawn(async {}) }
  }
}

impl Drop for AnalysisHandle {
  fn drop(&mut self) { self.task.abort(); }
}

// ─── Analyzer ─────────────────────────────────────────────────────────────────

/// Cheap to clone; every clone shares the simulated-id clock.
#[derive(Clone)]
pub struct Analyzer {
  client: ApiClient,
  mode:   AnalyzeMode,
  timing: Timing,
  ids:    Arc<IdClock>,
}

impl Analyzer {
  pub fn new(client: ApiClient, mode: AnalyzeMode, timing: Timing) -> Self {
    Self { client, mode, timing, ids: Arc::new(IdClock::default()) }
  }

  pub fn client(&self) -> &ApiClient { &self.client }

  pub fn mode(&self) -> AnalyzeMode { self.mode }

  /// Advisory health check. Never fails: every error means `Disconnected`.
  pub async fn check_connectivity(&self) -> ConnectivityStatus {
    match self.client.health().await {
      Ok(health) => {
        debug!(
          status = %health.status,
          timestamp = %health.timestamp,
          url = self.client.base_url(),
          "backend reachable"
        );
        ConnectivityStatus::Connected
      }
      Err(reason) => {
        warn!(%reason, url = self.client.base_url(), "backend unreachable");
        ConnectivityStatus::Disconnected { reason }
      }
    }
  }

  /// Pick the source for the next analysis according to the configured mode.
  pub async fn select(&self) -> AnalysisSource {
    let connected = match self.mode {
      AnalyzeMode::Backend => true,
      AnalyzeMode::Simulated => false,
      AnalyzeMode::Auto => match self.check_connectivity().await {
        ConnectivityStatus::Connected => true,
        ConnectivityStatus::Disconnected { reason } => {
          info!(%reason, "falling back to simulated analysis");
          false
        }
      },
    };
    if connected {
      AnalysisSource::Backend(self.client.clone())
    } else {
      AnalysisSource::Simulated {
        delay: self.timing.simulated_delay,
        ids:   self.ids.clone(),
      }
    }
  }

  /// Spawn the analysis of `file`.
  pub fn start(&self, file: ValidFile) -> AnalysisHandle {
    let (tx, events) = mpsc::unbounded_channel();
    let file_name = file.name().to_string();
    let task = tokio::spawn(self.clone().run(file, tx));
    AnalysisHandle { file_name, events, task }
  }

  async fn run(self, file: ValidFile, tx: mpsc::UnboundedSender<AnalysisEvent>) {
    // Send failures mean the handle is gone; the task is about to be aborted.
    let mut progress = Progress::new(self.timing.progress_step, self.timing.progress_cap);
    let _ = tx.send(AnalysisEvent::Progress(progress.value()));

    let work = async {
      let source = self.select().await;
      info!(path = source.label(), file = file.name(), bytes = file.len(), "analyzing");
      source.produce(&file).await
    };
    tokio::pin!(work);

    let period = self.timing.progress_interval;
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut capped = false;

    let outcome = loop {
      tokio::select! {
        biased;
        outcome = &mut work => break outcome,
        _ = ticker.tick(), if !capped => match progress.tick() {
          Some(value) => { let _ = tx.send(AnalysisEvent::Progress(value)); }
          None => capped = true,
        },
      }
    };

    match &outcome {
      Ok(result) => {
        info!(file = %result.file_name, rating = ?result.resume_rating, "analysis complete");
        if let Some(done) = progress.complete() {
          let _ = tx.send(AnalysisEvent::Progress(done));
        }
      }
      Err(e) => warn!(error = %e, file = file.name(), "analysis failed"),
    }
    let _ = tx.send(AnalysisEvent::Finished(outcome));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    client::ApiConfig,
    test_support::{Backend, pdf, spawn_backend, unreachable_url},
  };

  fn analyzer(url: String, mode: AnalyzeMode, timing: Timing) -> Analyzer {
    let client = ApiClient::new(ApiConfig { base_url: url, timeout: Duration::from_secs(5) })
      .unwrap();
    Analyzer::new(client, mode, timing)
  }

  fn fast() -> Timing {
    Timing {
      progress_interval: Duration::from_millis(10),
      simulated_delay: Duration::from_millis(60),
      ..Timing::default()
    }
  }

  /// Drain every event up to and including `Finished`.
  async fn collect(mut handle: AnalysisHandle) -> (Vec<u8>, Result<AnalysisResult, AnalysisError>) {
    let mut progress = Vec::new();
    while let Some(event) = handle.next().await {
      match event {
        AnalysisEvent::Progress(v) => progress.push(v),
        AnalysisEvent::Finished(outcome) => return (progress, outcome),
      }
    }
    panic!("operation ended without Finished");
  }

  fn assert_well_formed(progress: &[u8]) {
    assert_eq!(progress.first(), Some(&0));
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");
    assert_eq!(progress.iter().filter(|v| **v == 100).count(), 1);
    assert_eq!(progress.last(), Some(&100));
  }

  #[tokio::test(start_paused = true)]
  async fn simulated_progress_sequence_is_exact() {
    let a = analyzer("http://127.0.0.1:9".into(), AnalyzeMode::Simulated, Timing::default());
    let (progress, outcome) = collect(a.start(pdf("cv.pdf"))).await;

    assert_eq!(progress, vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
    let result = outcome.unwrap();
    assert_eq!(result.file_name, "cv.pdf");
    result.validate().unwrap();
  }

  #[tokio::test(start_paused = true)]
  async fn slow_result_holds_at_cap() {
    let timing = Timing { simulated_delay: Duration::from_secs(10), ..Timing::default() };
    let a = analyzer("http://127.0.0.1:9".into(), AnalyzeMode::Simulated, timing);
    let (progress, _) = collect(a.start(pdf("cv.pdf"))).await;

    assert_well_formed(&progress);
    assert_eq!(progress[progress.len() - 2], 90);
  }

  #[tokio::test]
  async fn disconnected_backend_falls_back_to_simulator() {
    let a = analyzer(unreachable_url().await, AnalyzeMode::Auto, fast());
    assert!(matches!(
      a.check_connectivity().await,
      ConnectivityStatus::Disconnected { .. }
    ));

    let (progress, outcome) = collect(a.start(pdf("a.pdf"))).await;
    assert_well_formed(&progress);
    let result = outcome.unwrap();
    assert_eq!(result.name.as_deref(), Some("John Doe"));
    assert_eq!(result.file_name, "a.pdf");
  }

  #[tokio::test]
  async fn connected_backend_is_used() {
    let url = spawn_backend(Backend {
      upload_delay: Duration::from_millis(80),
      ..Backend::default()
    })
    .await;
    let a = analyzer(url, AnalyzeMode::Auto, fast());
    assert_eq!(a.check_connectivity().await, ConnectivityStatus::Connected);

    let (progress, outcome) = collect(a.start(pdf("b.pdf"))).await;
    assert_well_formed(&progress);
    assert_eq!(outcome.unwrap().id, Some(77));
  }

  #[tokio::test]
  async fn unhealthy_status_counts_as_disconnected() {
    let url = spawn_backend(Backend { health_status: 503, ..Backend::default() }).await;
    let a = analyzer(url, AnalyzeMode::Auto, fast());
    assert!(matches!(a.select().await, AnalysisSource::Simulated { .. }));
  }

  #[tokio::test]
  async fn upload_failure_never_reaches_100() {
    let url = spawn_backend(Backend { upload_status: 500, ..Backend::default() }).await;
    let a = analyzer(url, AnalyzeMode::Auto, fast());

    let (progress, outcome) = collect(a.start(pdf("c.pdf"))).await;
    assert!(!progress.contains(&100), "{progress:?}");
    let err = outcome.unwrap_err();
    assert!(err.message().contains("extraction failed"), "{err}");
  }

  #[tokio::test]
  async fn backend_mode_skips_health_check() {
    let url = spawn_backend(Backend { health_status: 500, ..Backend::default() }).await;
    let a = analyzer(url, AnalyzeMode::Backend, fast());
    let (_, outcome) = collect(a.start(pdf("d.pdf"))).await;
    assert_eq!(outcome.unwrap().file_name, "d.pdf");
  }

  #[tokio::test(start_paused = true)]
  async fn cancel_stops_running_operation() {
    let a = analyzer("http://127.0.0.1:9".into(), AnalyzeMode::Simulated, Timing::default());
    let mut handle = a.start(pdf("cv.pdf"));
    assert_eq!(handle.next().await, Some(AnalysisEvent::Progress(0)));
    assert!(handle.cancel().await);
  }

  #[test]
  fn id_clock_is_strictly_increasing() {
    let clock = IdClock::default();
    let now = Utc::now();
    let a = clock.next(now);
    let b = clock.next(now);
    let c = clock.next(now);
    assert_eq!(a, now.timestamp_millis());
    assert!(a < b && b < c);
  }
}
