//! In-process stand-in for the analysis backend, bound to an ephemeral port.

use std::{sync::Arc, time::Duration};

use axum::{
  Json, Router,
  extract::{Multipart, Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  routing::{get, post},
};
use serde_json::json;
use tokio::net::TcpListener;
use vitae_core::upload::{CandidateFile, PDF_MEDIA_TYPE, ValidFile, validate_file};

/// Knobs for the fake backend.
#[derive(Clone)]
pub struct Backend {
  pub health_status: u16,
  pub upload_status: u16,
  pub upload_delay:  Duration,
  pub rating:        f64,
  /// Make `GET /api/resumes` return an entry that fails validation.
  pub bad_listing:   bool,
}

impl Default for Backend {
  fn default() -> Self {
    Self {
      health_status: 200,
      upload_status: 200,
      upload_delay:  Duration::ZERO,
      rating:        7.0,
      bad_listing:   false,
    }
  }
}

/// Serve `backend` on `127.0.0.1:0` and return its base URL.
pub async fn spawn_backend(backend: Backend) -> String {
  let app = Router::new()
    .route("/api/health", get(health))
    .route("/api/resumes/upload", post(upload))
    .route("/api/resumes", get(list))
    .route("/api/resumes/{id}", get(get_one))
    .with_state(Arc::new(backend));

  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
  format!("http://{addr}")
}

/// A base URL nothing is listening on.
pub async fn unreachable_url() -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);
  format!("http://{addr}")
}

/// An eight-byte validated PDF named `name`.
pub fn pdf(name: &str) -> ValidFile {
  validate_file(CandidateFile::new(name, PDF_MEDIA_TYPE, b"%PDF-1.7".to_vec())).unwrap()
}

fn status(code: u16) -> StatusCode { StatusCode::from_u16(code).unwrap() }

async fn health(State(b): State<Arc<Backend>>) -> Response {
  if b.health_status != 200 {
    return status(b.health_status).into_response();
  }
  Json(json!({ "status": "ok", "timestamp": "2024-05-01T00:00:00Z" })).into_response()
}

async fn upload(State(b): State<Arc<Backend>>, mut multipart: Multipart) -> Response {
  tokio::time::sleep(b.upload_delay).await;
  if b.upload_status != 200 {
    return (status(b.upload_status), Json(json!({ "error": "extraction failed" })))
      .into_response();
  }
  while let Some(field) = multipart.next_field().await.unwrap() {
    if field.name() != Some("resume") {
      continue;
    }
    let file_name = field.file_name().unwrap_or_default().to_string();
    let bytes = field.bytes().await.unwrap();
    return Json(json!({
      "id": 77,
      "file_name": file_name,
      "uploaded_at": "2024-05-01T00:00:00Z",
      "summary": format!("{} bytes", bytes.len()),
      "resume_rating": b.rating,
    }))
    .into_response();
  }
  (StatusCode::BAD_REQUEST, Json(json!({ "error": "missing resume field" }))).into_response()
}

async fn list(State(b): State<Arc<Backend>>) -> Json<serde_json::Value> {
  let second_rating = if b.bad_listing { 42 } else { 6 };
  Json(json!([
    { "id": 2, "file_name": "second.pdf", "resume_rating": second_rating },
    { "id": 1, "file_name": "first.pdf", "resume_rating": 9 },
  ]))
}

async fn get_one(Path(id): Path<i64>) -> Response {
  match id {
    1 => Json(json!({ "id": 1, "file_name": "first.pdf" })).into_response(),
    2 => Json(json!({ "id": 2, "file_name": "second.pdf" })).into_response(),
    _ => StatusCode::NOT_FOUND.into_response(),
  }
}
