//! The session history of analysis results.
//!
//! Ordering is insertion order, most recent first, and is never re-sorted.
//! Nothing here is durable; a backend listing, when reachable, is the
//! authoritative copy and replaces the local one wholesale.

use std::future::Future;

use crate::{error::FetchError, resume::AnalysisResult};

// ─── Source trait ────────────────────────────────────────────────────────────

/// Anything that can produce the authoritative listing, newest first.
///
/// Implemented by the HTTP client in `vitae-cli`; tests use in-memory fakes.
pub trait HistorySource: Send + Sync {
  fn list(&self) -> impl Future<Output = Result<Vec<AnalysisResult>, FetchError>> + Send + '_;
}

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
  entries: Vec<AnalysisResult>,
}

impl HistoryStore {
  pub fn new() -> Self { Self::default() }

  /// Newest first.
  pub fn entries(&self) -> &[AnalysisResult] { &self.entries }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  pub fn get(&self, index: usize) -> Option<&AnalysisResult> { self.entries.get(index) }

  /// Prepend `result`. An older entry with the same identifier is dropped;
  /// entries without an identifier are never deduplicated, not even by file
  /// name.
  pub fn record(&mut self, result: AnalysisResult) {
    if let Some(id) = result.id {
      self.entries.retain(|e| e.id != Some(id));
    }
    self.entries.insert(0, result);
  }

  /// Replace the local sequence with `source`'s listing. On any failure the
  /// local sequence is left exactly as it was.
  pub async fn refresh<S: HistorySource>(
    &mut self,
    source: &S,
  ) -> Result<&[AnalysisResult], FetchError> {
    let listing = source.list().await?;
    for entry in &listing {
      entry.validate().map_err(|e| FetchError(e.into()))?;
    }
    self.entries = listing;
    Ok(&self.entries)
  }

  /// Exact identifier match, linear scan.
  pub fn find_by_id(&self, id: i64) -> Option<&AnalysisResult> {
    self.entries.iter().find(|e| e.id == Some(id))
  }
}
