//! Core types for the Vitae résumé analyzer.
//!
//! This crate is deliberately free of HTTP, timer, and terminal dependencies.
//! It owns the analysis data model, the upload state machine, the progress
//! rules, and the session history. `vitae-cli` drives all of it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod history;
pub mod progress;
pub mod resume;
pub mod sample;
pub mod upload;

pub use error::{
  AnalysisError, FetchError, FlowError, RequestError, Result, ShapeError,
  ValidationError,
};
