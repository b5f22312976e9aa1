//! Live-analysis pane: file prompt, progress gauge, and the latest result.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Gauge, Paragraph},
};
use vitae_core::upload::UploadState;

use super::resume_detail;
use crate::app::App;

/// Render the uploader into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(5), // file box
      Constraint::Length(3), // gauge
      Constraint::Min(0),    // result
    ])
    .split(area);

  draw_file_box(f, rows[0], app);
  draw_gauge(f, rows[1], app);
  draw_result(f, rows[2], app);
}

fn draw_file_box(f: &mut Frame, area: Rect, app: &App) {
  let border = match app.flow.state() {
    UploadState::Rejected(_) | UploadState::Failed { .. } => Color::Red,
    UploadState::Idle => Color::DarkGray,
    _ => Color::Green,
  };
  let block = Block::default()
    .title(" Upload your resume ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  let mut lines = Vec::new();
  if app.path_active {
    lines.push(Line::from(vec![
      Span::styled("Path: ", Style::default().fg(Color::Yellow)),
      Span::raw(format!("{}_", app.path_input)),
    ]));
  } else if let Some(file) = app.flow.state().file() {
    lines.push(Line::from(vec![
      Span::styled(
        "File Ready  ",
        Style::default()
          .fg(Color::Green)
          .add_modifier(Modifier::BOLD),
      ),
      Span::raw(file.name().to_string()),
      Span::styled(
        format!("  {} bytes", file.len()),
        Style::default().fg(Color::DarkGray),
      ),
    ]));
  } else {
    lines.push(Line::from(Span::styled(
      "Press o and enter the path to a PDF file",
      Style::default().fg(Color::DarkGray),
    )));
  }

  if let Some(notice) = &app.notice {
    lines.push(Line::from(Span::styled(
      notice.clone(),
      Style::default().fg(Color::Red),
    )));
  } else if matches!(app.flow.state(), UploadState::Validated(_) | UploadState::Failed { .. }) {
    lines.push(Line::from(Span::styled(
      "Press a to analyze",
      Style::default().fg(Color::DarkGray),
    )));
  }

  f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_gauge(f: &mut Frame, area: Rect, app: &App) {
  if !app.is_analyzing() {
    return;
  }
  let progress = app.flow.state().progress();
  let title = app
    .in_flight
    .as_ref()
    .map(|h| format!(" Analyzing {}... ", h.file_name()))
    .unwrap_or_else(|| " Analyzing resume... ".to_string());
  let gauge = Gauge::default()
    .block(
      Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray)),
    )
    .gauge_style(Style::default().fg(Color::Cyan))
    .percent(u16::from(progress))
    .label(format!("{progress}%"));
  f.render_widget(gauge, area);
}

fn draw_result(f: &mut Frame, area: Rect, app: &App) {
  // Hidden while a newer analysis is running.
  let Some(result) = app.latest.as_ref().filter(|_| !app.is_analyzing()) else {
    return;
  };
  let block = Block::default()
    .title(format!(" Analysis Results: {} ", result.file_name))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let para = Paragraph::new(resume_detail::lines(result))
    .block(block)
    .scroll((app.detail_scroll as u16, 0));
  f.render_widget(para, area);
}
