//! Async HTTP client wrapping the résumé analysis JSON API.

use anyhow::{Context, Result};
use reqwest::{
  Client, Response,
  multipart::{Form, Part},
};
use serde::Deserialize;
use std::time::Duration;
use vitae_core::{
  FetchError, RequestError,
  history::HistorySource,
  resume::AnalysisResult,
  upload::{PDF_MEDIA_TYPE, ValidFile},
};

/// Multipart field the backend reads the PDF from.
const UPLOAD_FIELD: &str = "resume";

/// Connection settings for the analysis API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub timeout:  Duration,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
  pub status:    String,
  #[serde(default)]
  pub timestamp: String,
}

/// Error body the backend sends alongside non-2xx statuses.
#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

/// Async HTTP client for the analysis REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  pub fn base_url(&self) -> &str { &self.config.base_url }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  // ── Health ────────────────────────────────────────────────────────────────

  /// `GET /api/health`
  pub async fn health(&self) -> Result<HealthStatus, RequestError> {
    let resp = self
      .client
      .get(self.url("/health"))
      .send()
      .await
      .map_err(transport)?;
    let body = success_body(resp).await?;
    Ok(serde_json::from_slice(&body)?)
  }

  // ── Resumes ───────────────────────────────────────────────────────────────

  /// `POST /api/resumes/upload`, single-part multipart form.
  pub async fn upload_resume(&self, file: &ValidFile) -> Result<AnalysisResult, RequestError> {
    let part = Part::stream_with_length(file.bytes(), file.len() as u64)
      .file_name(file.name().to_string())
      .mime_str(PDF_MEDIA_TYPE)
      .map_err(transport)?;
    let form = Form::new().part(UPLOAD_FIELD, part);

    let resp = self
      .client
      .post(self.url("/resumes/upload"))
      .multipart(form)
      .send()
      .await
      .map_err(transport)?;
    let body = success_body(resp).await?;
    AnalysisResult::from_json(&body)
  }

  /// `GET /api/resumes`
  pub async fn list_resumes(&self) -> Result<Vec<AnalysisResult>, RequestError> {
    let resp = self
      .client
      .get(self.url("/resumes"))
      .send()
      .await
      .map_err(transport)?;
    let body = success_body(resp).await?;
    let listing: Vec<AnalysisResult> = serde_json::from_slice(&body)?;
    for entry in &listing {
      entry.validate()?;
    }
    Ok(listing)
  }

  /// `GET /api/resumes/:id`
  pub async fn get_resume(&self, id: i64) -> Result<AnalysisResult, RequestError> {
    let resp = self
      .client
      .get(self.url(&format!("/resumes/{id}")))
      .send()
      .await
      .map_err(transport)?;
    let body = success_body(resp).await?;
    AnalysisResult::from_json(&body)
  }
}

impl HistorySource for ApiClient {
  async fn list(&self) -> Result<Vec<AnalysisResult>, FetchError> {
    self.list_resumes().await.map_err(FetchError)
  }
}

// ─── Response helpers ─────────────────────────────────────────────────────────

fn transport(e: reqwest::Error) -> RequestError { RequestError::Transport(e.to_string()) }

/// Read the body of a 2xx response. Any other status becomes
/// [`RequestError::Status`], carrying the server's `error` field if it sent
/// one.
async fn success_body(resp: Response) -> Result<Vec<u8>, RequestError> {
  let status = resp.status();
  let body = resp.bytes().await.map_err(transport)?;
  if status.is_success() {
    return Ok(body.to_vec());
  }
  let message = serde_json::from_slice::<ErrorBody>(&body)
    .map(|b| b.error)
    .unwrap_or_else(|_| format!("HTTP error! status: {}", status.as_u16()));
  tracing::debug!(status = status.as_u16(), %message, "request failed");
  Err(RequestError::Status { status: status.as_u16(), message })
}
