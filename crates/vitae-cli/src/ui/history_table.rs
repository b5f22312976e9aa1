//! History pane: table of past analyses, newest first.

use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};
use vitae_core::resume::AnalysisResult;

use super::resume_detail::{band_color, format_rating};
use crate::app::App;

/// "Mar 1, 2024, 12:30 PM" in local time, or "Unknown".
fn format_uploaded(r: &AnalysisResult) -> String {
  r.uploaded_at
    .map(|at| {
      at.with_timezone(&chrono::Local)
        .format("%b %-d, %Y, %-I:%M %p")
        .to_string()
    })
    .unwrap_or_else(|| "Unknown".to_string())
}

/// Render the history table into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let filtered = app.filtered_history();
  let total = app.history.len();

  // Title with count.
  let title = if app.filter_active || !app.filter.is_empty() {
    format!(" Resume Analysis History ({}/{}) ", filtered.len(), total)
  } else {
    format!(" Resume Analysis History ({}) ", total)
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  if total == 0 {
    f.render_widget(
      Paragraph::new(vec![
        Line::from("No resumes analyzed yet."),
        Line::from("Analyze one on the Live Analysis tab, or press r to load from the backend."),
      ])
      .style(Style::default().fg(Color::DarkGray)),
      inner_area,
    );
    return;
  }

  // Filter bar at the bottom of the inner area.
  if (app.filter_active || !app.filter.is_empty()) && inner_area.height > 2 {
    let filter_area = Rect {
      x:      inner_area.x,
      y:      inner_area.y + inner_area.height - 1,
      width:  inner_area.width,
      height: 1,
    };
    inner_area.height = inner_area.height.saturating_sub(1);

    let filter_text = if app.filter_active {
      format!("/{}_", app.filter)
    } else {
      format!("/{}", app.filter)
    };
    f.render_widget(
      Paragraph::new(filter_text).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  let header = Row::new(["File", "Candidate", "Email", "Uploaded", "Rating"])
    .style(Style::default().add_modifier(Modifier::BOLD));

  let rows: Vec<Row> = filtered
    .iter()
    .map(|r| {
      let rating_style = r
        .rating_band()
        .map_or(Style::default(), |b| Style::default().fg(band_color(b)));
      Row::new(vec![
        Cell::from(r.file_name.clone()),
        Cell::from(r.name.clone().unwrap_or_else(|| "Unknown".into())),
        Cell::from(r.email.clone().unwrap_or_else(|| "—".into())),
        Cell::from(format_uploaded(r)),
        Cell::from(Span::styled(format_rating(r.resume_rating), rating_style)),
      ])
    })
    .collect();

  let mut state = TableState::default();
  state.select(if filtered.is_empty() {
    None
  } else {
    Some(app.list_cursor)
  });

  let table = Table::new(rows, [
    Constraint::Percentage(25),
    Constraint::Percentage(20),
    Constraint::Percentage(25),
    Constraint::Percentage(20),
    Constraint::Percentage(10),
  ])
  .header(header)
  .row_highlight_style(
    Style::default()
      .bg(Color::Blue)
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );

  f.render_stateful_widget(table, inner_area, &mut state);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_timestamp_is_unknown() {
    assert_eq!(format_uploaded(&AnalysisResult::new("a.pdf")), "Unknown");
  }
}
