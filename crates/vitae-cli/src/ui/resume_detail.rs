//! Renders one [`AnalysisResult`] as styled lines. Shared by the latest-result
//! pane and the history modal.

use ratatui::{
  style::{Color, Modifier, Style},
  text::{Line, Span},
};
use vitae_core::resume::{AnalysisResult, RatingBand};

pub fn band_color(band: RatingBand) -> Color {
  match band {
    RatingBand::Strong => Color::Green,
    RatingBand::Fair => Color::Yellow,
    RatingBand::Weak => Color::Red,
  }
}

/// "8/10", or "—" when the backend did not rate the résumé.
pub fn format_rating(rating: Option<f64>) -> String {
  rating.map_or_else(|| "—".to_string(), |r| format!("{r}/10"))
}

fn heading(title: &str) -> Line<'static> {
  Line::from(Span::styled(
    title.to_string(),
    Style::default()
      .fg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  ))
}

fn field(label: &str, value: Option<&str>) -> Line<'static> {
  Line::from(vec![
    Span::styled(format!("{label:<12}"), Style::default().fg(Color::DarkGray)),
    Span::raw(value.unwrap_or("Not provided").to_string()),
  ])
}

fn muted(text: &str) -> Line<'static> {
  Line::from(Span::styled(text.to_string(), Style::default().fg(Color::DarkGray)))
}

/// Build every line of the detail view.
pub fn lines(r: &AnalysisResult) -> Vec<Line<'static>> {
  let mut out = Vec::new();

  // Rating
  let rating_style = r
    .rating_band()
    .map_or(Style::default(), |b| Style::default().fg(band_color(b)))
    .add_modifier(Modifier::BOLD);
  out.push(Line::from(vec![
    Span::styled("Rating      ", Style::default().fg(Color::DarkGray)),
    Span::styled(format_rating(r.resume_rating), rating_style),
  ]));
  out.push(Line::from(""));

  // Contact
  out.push(heading("Contact"));
  out.push(field("Name", r.name.as_deref()));
  out.push(field("Email", r.email.as_deref()));
  out.push(field("Phone", r.phone.as_deref()));
  out.push(field("LinkedIn", r.linkedin_url.as_deref()));
  out.push(field("Portfolio", r.portfolio_url.as_deref()));
  if let Some(summary) = &r.summary {
    out.push(Line::from(""));
    out.push(Line::from(summary.clone()));
  }
  out.push(Line::from(""));

  // Experience
  out.push(heading("Work Experience"));
  if r.work_experience.is_empty() {
    out.push(muted("No work experience found"));
  }
  for job in &r.work_experience {
    out.push(Line::from(vec![
      Span::styled(job.role.clone(), Style::default().add_modifier(Modifier::BOLD)),
      Span::raw(format!(" @ {}", job.company)),
      Span::styled(format!("  {}", job.duration), Style::default().fg(Color::DarkGray)),
    ]));
    for bullet in &job.description {
      out.push(Line::from(format!("  • {bullet}")));
    }
  }
  out.push(Line::from(""));

  // Education
  out.push(heading("Education"));
  if r.education.is_empty() {
    out.push(muted("No education information found"));
  }
  for edu in &r.education {
    out.push(Line::from(format!(
      "{}, {} ({})",
      edu.degree, edu.institution, edu.graduation_year
    )));
  }
  out.push(Line::from(""));

  // Skills
  out.push(heading("Skills"));
  out.push(list_line("Technical", &r.technical_skills));
  out.push(list_line("Soft", &r.soft_skills));

  if !r.projects.is_empty() {
    out.push(Line::from(""));
    out.push(heading("Projects"));
    for p in &r.projects {
      out.push(Line::from(vec![
        Span::styled(p.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" — {}", p.description)),
      ]));
      if !p.technologies.is_empty() {
        out.push(muted(&format!("  {}", p.technologies.join(", "))));
      }
    }
  }

  if !r.certifications.is_empty() {
    out.push(Line::from(""));
    out.push(heading("Certifications"));
    for c in &r.certifications {
      let date = c.date.as_deref().map(|d| format!(" ({d})")).unwrap_or_default();
      out.push(Line::from(format!("{}, {}{date}", c.name, c.issuer)));
    }
  }

  out.push(Line::from(""));
  out.push(heading("Areas for Improvement"));
  out.push(Line::from(
    r.improvement_areas
      .clone()
      .unwrap_or_else(|| "None noted".to_string()),
  ));
  out.push(list_line("Upskill", &r.upskill_suggestions));

  out
}

fn list_line(label: &str, items: &[String]) -> Line<'static> {
  let value = if items.is_empty() {
    "None listed".to_string()
  } else {
    items.join(", ")
  };
  Line::from(vec![
    Span::styled(format!("{label:<12}"), Style::default().fg(Color::DarkGray)),
    Span::raw(value),
  ])
}
