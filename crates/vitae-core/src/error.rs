//! Error types for `vitae-core`.
//!
//! Nothing here is fatal to the process: every variant maps back to an
//! interactive state in the caller.

use thiserror::Error;

/// A selected file was refused before any network call was attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("not a PDF (media type {media_type:?})")]
  NotPdf { media_type: String },
}

impl ValidationError {
  /// The message shown to the user when a selection is refused.
  pub fn user_message(&self) -> &'static str {
    match self {
      Self::NotPdf { .. } => "Please upload a valid PDF file",
    }
  }
}

/// A response body parsed as JSON but broke an [`AnalysisResult`] invariant.
///
/// [`AnalysisResult`]: crate::resume::AnalysisResult
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
  #[error("rating {0} is outside 0..=10")]
  RatingOutOfRange(f64),

  #[error("file_name is empty")]
  EmptyFileName,
}

/// Why a single HTTP exchange with the backend failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
  #[error("network error: {0}")]
  Transport(String),

  #[error("{message}")]
  Status { status: u16, message: String },

  #[error("malformed response: {0}")]
  Malformed(String),
}

impl From<ShapeError> for RequestError {
  fn from(e: ShapeError) -> Self { Self::Malformed(e.to_string()) }
}

impl From<serde_json::Error> for RequestError {
  fn from(e: serde_json::Error) -> Self { Self::Malformed(e.to_string()) }
}

/// The upload-and-analyze call failed. The user may retry the same file.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("analysis failed: {0}")]
pub struct AnalysisError(#[from] pub RequestError);

impl AnalysisError {
  pub fn message(&self) -> String { self.0.to_string() }
}

/// A history refresh failed. The stale local list stays visible.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("could not refresh history: {0}")]
pub struct FetchError(#[from] pub RequestError);

/// An upload state transition was requested from a state that does not allow
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
  #[error("no validated file to analyze")]
  NoValidatedFile,

  #[error("no analysis is in flight")]
  NotAnalyzing,
}

/// Result of decoding or exchanging with the backend.
pub type Result<T, E = RequestError> = std::result::Result<T, E>;
