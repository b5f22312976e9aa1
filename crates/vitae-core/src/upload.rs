//! File selection, validation, and the per-upload state machine.
//!
//! ```text
//! Idle ─select─▶ Rejected
//!   │              ▲
//!   └────select────┴─▶ Validated ─begin─▶ Analyzing ─┬─▶ Succeeded
//!                                                    └─▶ Failed
//! ```
//!
//! `FileSelected` and `Validating` are transient inside [`UploadFlow::select`]
//! and never observable. An abandoned analysis falls back to `Validated`. Every state accepts a new selection. `Failed` and
//! `Succeeded` keep their file so the caller can analyze it again.

use std::path::Path;

use bytes::Bytes;

use crate::{
  error::{AnalysisError, FlowError, ValidationError},
  resume::AnalysisResult,
};

/// The only media type the analyzer accepts.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

// ─── Files ───────────────────────────────────────────────────────────────────

/// A file the user picked, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
  pub name:       String,
  pub media_type: String,
  pub bytes:      Bytes,
}

impl CandidateFile {
  pub fn new(
    name: impl Into<String>,
    media_type: impl Into<String>,
    bytes: impl Into<Bytes>,
  ) -> Self {
    Self {
      name:       name.into(),
      media_type: media_type.into(),
      bytes:      bytes.into(),
    }
  }

  /// Build a candidate whose media type is derived from the file extension.
  pub fn from_name(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
    let name = name.into();
    let media_type = guess_media_type(&name).to_string();
    Self::new(name, media_type, bytes)
  }
}

/// A file that passed [`validate_file`]. Only obtainable through validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidFile(CandidateFile);

impl ValidFile {
  pub fn name(&self) -> &str { &self.0.name }

  pub fn media_type(&self) -> &str { &self.0.media_type }

  /// Cheap: [`Bytes`] is reference-counted.
  pub fn bytes(&self) -> Bytes { self.0.bytes.clone() }

  pub fn len(&self) -> usize { self.0.bytes.len() }

  pub fn is_empty(&self) -> bool { self.0.bytes.is_empty() }
}

/// Accept `file` only if its declared media type is `application/pdf`.
pub fn validate_file(file: CandidateFile) -> Result<ValidFile, ValidationError> {
  let declared = file.media_type.split(';').next().unwrap_or_default().trim();
  if declared.eq_ignore_ascii_case(PDF_MEDIA_TYPE) {
    Ok(ValidFile(file))
  } else {
    Err(ValidationError::NotPdf { media_type: file.media_type })
  }
}

/// Map a file name to a media type by extension, the way a browser file
/// picker declares it.
pub fn guess_media_type(name: &str) -> &'static str {
  let ext = Path::new(name)
    .extension()
    .and_then(|e| e.to_str())
    .map(str::to_ascii_lowercase);
  match ext.as_deref() {
    Some("pdf") => PDF_MEDIA_TYPE,
    Some("txt") => "text/plain",
    Some("md") => "text/markdown",
    Some("doc") => "application/msword",
    Some("docx") => {
      "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    }
    Some("rtf") => "application/rtf",
    Some("png") => "image/png",
    Some("jpg" | "jpeg") => "image/jpeg",
    _ => "application/octet-stream",
  }
}

// ─── State machine ───────────────────────────────────────────────────────────

/// Where a single upload currently stands.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum UploadState {
  #[default]
  Idle,
  Rejected(ValidationError),
  Validated(ValidFile),
  Analyzing { file: ValidFile, progress: u8 },
  Succeeded { file: ValidFile, result: AnalysisResult },
  Failed { file: ValidFile, error: AnalysisError },
}

impl UploadState {
  pub fn is_terminal(&self) -> bool {
    matches!(
      self,
      Self::Rejected(_) | Self::Succeeded { .. } | Self::Failed { .. }
    )
  }

  /// The validated file this state holds, if any.
  pub fn file(&self) -> Option<&ValidFile> {
    match self {
      Self::Validated(file)
      | Self::Analyzing { file, .. }
      | Self::Succeeded { file, .. }
      | Self::Failed { file, .. } => Some(file),
      Self::Idle | Self::Rejected(_) => None,
    }
  }

  /// Progress to display: only meaningful while analyzing.
  pub fn progress(&self) -> u8 {
    match self {
      Self::Analyzing { progress, .. } => *progress,
      _ => 0,
    }
  }
}

/// Owned upload state. The caller drives transitions; this type only enforces
/// which ones are legal.
#[derive(Debug, Default)]
pub struct UploadFlow {
  state: UploadState,
}

impl UploadFlow {
  pub fn new() -> Self { Self::default() }

  pub fn state(&self) -> &UploadState { &self.state }

  /// Select and validate a file. A new selection replaces whatever came before,
  /// including an in-flight analysis.
  pub fn select(&mut self, file: CandidateFile) -> Result<ValidFile, ValidationError> {
    match validate_file(file) {
      Ok(valid) => {
        self.state = UploadState::Validated(valid.clone());
        Ok(valid)
      }
      Err(e) => {
        self.state = UploadState::Rejected(e.clone());
        Err(e)
      }
    }
  }

  /// Enter `Analyzing` with progress 0. Allowed from `Validated` and from the
  /// terminal states that still hold a file (retry / re-analyze).
  pub fn begin(&mut self) -> Result<ValidFile, FlowError> {
    let file = match &self.state {
      UploadState::Validated(file)
      | UploadState::Succeeded { file, .. }
      | UploadState::Failed { file, .. } => file.clone(),
      _ => return Err(FlowError::NoValidatedFile),
    };
    self.state = UploadState::Analyzing { file: file.clone(), progress: 0 };
    Ok(file)
  }

  /// Record a progress value. Values below the current one are ignored.
  pub fn set_progress(&mut self, value: u8) -> Result<(), FlowError> {
    match &mut self.state {
      UploadState::Analyzing { progress, .. } => {
        *progress = (*progress).max(value.min(100));
        Ok(())
      }
      _ => Err(FlowError::NotAnalyzing),
    }
  }

  pub fn succeed(&mut self, result: AnalysisResult) -> Result<(), FlowError> {
    let file = self.take_analyzing()?;
    self.state = UploadState::Succeeded { file, result };
    Ok(())
  }

  /// Progress resets to 0 as a side effect of leaving `Analyzing`.
  pub fn fail(&mut self, error: AnalysisError) -> Result<(), FlowError> {
    let file = self.take_analyzing()?;
    self.state = UploadState::Failed { file, error };
    Ok(())
  }

  /// The caller gave up on the in-flight analysis; keep the file so it can be
  /// analyzed again.
  pub fn abandon(&mut self) -> Result<(), FlowError> {
    let file = self.take_analyzing()?;
    self.state = UploadState::Validated(file);
    Ok(())
  }

  fn take_analyzing(&mut self) -> Result<ValidFile, FlowError> {
    match std::mem::take(&mut self.state) {
      UploadState::Analyzing { file, .. } => Ok(file),
      other => {
        self.state = other;
        Err(FlowError::NotAnalyzing)
      }
    }
  }
}
