//! The analysis data model: what the backend (or the simulator) returns for
//! one résumé.
//!
//! Every list field deserialises to an empty `Vec` when absent or `null`, so
//! rendering code can iterate without checking. Timestamps without an offset
//! are read as UTC. A value that parsed but breaks an
//! invariant is rejected by [`AnalysisResult::validate`].

use std::ops::RangeInclusive;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ShapeError;

/// Inclusive bounds of [`AnalysisResult::resume_rating`].
pub const RATING_RANGE: RangeInclusive<f64> = 0.0..=10.0;

/// Offset-less layouts accepted after RFC 3339 fails. `%.f` also matches no
/// fraction at all.
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

// ─── Lenient decoding ────────────────────────────────────────────────────────

/// Parse an ISO-8601 timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
  let raw = raw.trim();
  if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
    return Some(at.with_timezone(&Utc));
  }
  NAIVE_TIMESTAMP_FORMATS
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .map(|naive| naive.and_utc())
}

/// `uploaded_at` is display-only: a string we cannot read becomes `None`
/// instead of failing the whole body.
fn lenient_timestamp<'de, D>(d: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(Option::<String>::deserialize(d)?.as_deref().and_then(parse_timestamp))
}

/// `null` means the same as a missing key: empty.
fn null_as_empty<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<Vec<T>>::deserialize(d).map(Option::unwrap_or_default)
}

// ─── Sections ────────────────────────────────────────────────────────────────

/// One position held by the candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
  pub role:        String,
  pub company:     String,
  /// Free text, e.g. "2022 - Present". Never parsed.
  pub duration:    String,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub description: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
  pub degree:          String,
  pub institution:     String,
  /// Kept as text; résumés say "2019", "Expected 2026", "2015-2019".
  pub graduation_year: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
  pub name:         String,
  pub description:  String,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub technologies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
  pub name:   String,
  pub issuer: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub date:   Option<String>,
}

// ─── Result ──────────────────────────────────────────────────────────────────

/// The structured outcome of analysing one résumé.
///
/// Immutable once produced: the history only ever prepends or replaces whole
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
  #[serde(default)]
  pub id:                  Option<i64>,
  pub file_name:           String,
  #[serde(default, deserialize_with = "lenient_timestamp")]
  pub uploaded_at:         Option<DateTime<Utc>>,

  #[serde(default)]
  pub name:                Option<String>,
  #[serde(default)]
  pub email:               Option<String>,
  #[serde(default)]
  pub phone:               Option<String>,
  #[serde(default)]
  pub linkedin_url:        Option<String>,
  #[serde(default)]
  pub portfolio_url:       Option<String>,
  #[serde(default)]
  pub summary:             Option<String>,

  #[serde(default, deserialize_with = "null_as_empty")]
  pub work_experience:     Vec<WorkExperience>,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub education:           Vec<Education>,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub technical_skills:    Vec<String>,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub soft_skills:         Vec<String>,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub projects:            Vec<Project>,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub certifications:      Vec<Certification>,

  #[serde(default)]
  pub resume_rating:       Option<f64>,
  #[serde(default)]
  pub improvement_areas:   Option<String>,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub upskill_suggestions: Vec<String>,
}

impl AnalysisResult {
  /// An empty result for `file_name`; every optional field unset, every list
  /// empty.
  pub fn new(file_name: impl Into<String>) -> Self {
    Self {
      id:                  None,
      file_name:           file_name.into(),
      uploaded_at:         None,
      name:                None,
      email:               None,
      phone:               None,
      linkedin_url:        None,
      portfolio_url:       None,
      summary:             None,
      work_experience:     Vec::new(),
      education:           Vec::new(),
      technical_skills:    Vec::new(),
      soft_skills:         Vec::new(),
      projects:            Vec::new(),
      certifications:      Vec::new(),
      resume_rating:       None,
      improvement_areas:   None,
      upskill_suggestions: Vec::new(),
    }
  }

  /// Check the invariants serde cannot express.
  pub fn validate(&self) -> Result<(), ShapeError> {
    if self.file_name.trim().is_empty() {
      return Err(ShapeError::EmptyFileName);
    }
    if let Some(rating) = self.resume_rating
      && !RATING_RANGE.contains(&rating)
    {
      return Err(ShapeError::RatingOutOfRange(rating));
    }
    Ok(())
  }

  /// Parse and validate a JSON body in one step.
  pub fn from_json(body: &[u8]) -> crate::Result<Self> {
    let result: Self = serde_json::from_slice(body)?;
    result.validate()?;
    Ok(result)
  }

  /// A result counts as persisted once it carries both an identifier and an
  /// upload timestamp.
  pub fn is_persisted(&self) -> bool {
    self.id.is_some() && self.uploaded_at.is_some()
  }

  /// Display name, falling back to the file name.
  pub fn display_name(&self) -> &str {
    self.name.as_deref().unwrap_or(&self.file_name)
  }

  pub fn rating_band(&self) -> Option<RatingBand> {
    self.resume_rating.map(RatingBand::of)
  }
}

// ─── Rating bands ────────────────────────────────────────────────────────────

/// Coarse bucket used to colour a rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingBand {
  /// 8 and above.
  Strong,
  /// 6 up to 8.
  Fair,
  Weak,
}

impl RatingBand {
  pub fn of(rating: f64) -> Self {
    if rating >= 8.0 {
      Self::Strong
    } else if rating >= 6.0 {
      Self::Fair
    } else {
      Self::Weak
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::RequestError;

  #[test]
  fn missing_lists_default_to_empty() {
    let body = br#"{"file_name":"cv.pdf","resume_rating":7}"#;
    let r = AnalysisResult::from_json(body).unwrap();
    assert_eq!(r.file_name, "cv.pdf");
    assert!(r.work_experience.is_empty());
    assert!(r.education.is_empty());
    assert!(r.technical_skills.is_empty());
    assert!(r.soft_skills.is_empty());
    assert!(r.projects.is_empty());
    assert!(r.certifications.is_empty());
    assert!(r.upskill_suggestions.is_empty());
    assert_eq!(r.resume_rating, Some(7.0));
  }

  #[test]
  fn missing_file_name_is_malformed() {
    let err = AnalysisResult::from_json(br#"{"resume_rating":5}"#).unwrap_err();
    assert!(matches!(err, RequestError::Malformed(_)), "{err:?}");
  }

  #[test]
  fn rating_above_ten_is_malformed() {
    let err =
      AnalysisResult::from_json(br#"{"file_name":"a.pdf","resume_rating":11}"#)
        .unwrap_err();
    assert!(matches!(err, RequestError::Malformed(ref m) if m.contains("11")));
  }

  #[test]
  fn rating_bounds_are_inclusive() {
    let mut r = AnalysisResult::new("a.pdf");
    r.resume_rating = Some(0.0);
    assert!(r.validate().is_ok());
    r.resume_rating = Some(10.0);
    assert!(r.validate().is_ok());
    r.resume_rating = Some(-0.5);
    assert_eq!(r.validate(), Err(ShapeError::RatingOutOfRange(-0.5)));
  }

  #[test]
  fn blank_file_name_is_rejected() {
    let r = AnalysisResult::new("   ");
    assert_eq!(r.validate(), Err(ShapeError::EmptyFileName));
  }

  #[test]
  fn uploaded_at_parses_iso8601() {
    let body =
      br#"{"id":4,"file_name":"a.pdf","uploaded_at":"2024-03-01T12:30:00Z"}"#;
    let r = AnalysisResult::from_json(body).unwrap();
    assert!(r.is_persisted());
    assert_eq!(
      r.uploaded_at.unwrap().to_rfc3339(),
      "2024-03-01T12:30:00+00:00"
    );
  }

  #[test]
  fn uploaded_at_without_offset_reads_as_utc() {
    let body = br#"{"id":1,"file_name":"a.pdf","uploaded_at":"2024-03-01T12:30:00"}"#;
    let r = AnalysisResult::from_json(body).unwrap();
    assert_eq!(
      r.uploaded_at.unwrap().to_rfc3339(),
      "2024-03-01T12:30:00+00:00"
    );
  }

  #[test]
  fn uploaded_at_accepts_sql_layout() {
    let body = br#"{"id":1,"file_name":"a.pdf","uploaded_at":"2024-03-01 12:30:00.250"}"#;
    let r = AnalysisResult::from_json(body).unwrap();
    assert_eq!(
      r.uploaded_at.unwrap().to_rfc3339(),
      "2024-03-01T12:30:00.250+00:00"
    );
  }

  #[test]
  fn unreadable_or_null_timestamp_is_none() {
    for body in [
      &br#"{"file_name":"a.pdf","uploaded_at":"last tuesday"}"#[..],
      &br#"{"file_name":"a.pdf","uploaded_at":null}"#[..],
    ] {
      let r = AnalysisResult::from_json(body).unwrap();
      assert!(r.uploaded_at.is_none());
    }
  }

  #[test]
  fn offset_timestamp_is_normalised_to_utc() {
    assert_eq!(
      parse_timestamp("2024-03-01T14:30:00+02:00").map(|t| t.to_rfc3339()),
      Some("2024-03-01T12:30:00+00:00".to_string())
    );
  }

  #[test]
  fn null_lists_become_empty() {
    let body = br#"{
      "file_name": "a.pdf",
      "technical_skills": null,
      "soft_skills": null,
      "work_experience": [
        { "role": "Dev", "company": "Acme", "duration": "2020", "description": null }
      ],
      "education": null,
      "projects": [{ "name": "p", "description": "d", "technologies": null }],
      "certifications": null,
      "upskill_suggestions": null
    }"#;
    let r = AnalysisResult::from_json(body).unwrap();
    assert!(r.technical_skills.is_empty());
    assert!(r.soft_skills.is_empty());
    assert!(r.education.is_empty());
    assert!(r.certifications.is_empty());
    assert!(r.upskill_suggestions.is_empty());
    assert!(r.work_experience[0].description.is_empty());
    assert!(r.projects[0].technologies.is_empty());
  }

  #[test]
  fn rating_bands_follow_thresholds() {
    assert_eq!(RatingBand::of(8.0), RatingBand::Strong);
    assert_eq!(RatingBand::of(7.9), RatingBand::Fair);
    assert_eq!(RatingBand::of(6.0), RatingBand::Fair);
    assert_eq!(RatingBand::of(5.5), RatingBand::Weak);
  }
}
