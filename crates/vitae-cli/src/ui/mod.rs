//! TUI rendering. Orchestrates all panes.

pub mod history_table;
pub mod resume_detail;
pub mod uploader;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph, Tabs},
};

use crate::app::{App, Tab};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let area = f.area();

  // Vertical stack: header, tabs, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Length(1), // tabs
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  draw_tabs(f, rows[1], app);
  match app.tab {
    Tab::Analyze => uploader::draw(f, rows[2], app),
    Tab::History => history_table::draw(f, rows[2], app),
  }
  draw_status(f, rows[3], app);

  if let Some(selected) = &app.selected {
    draw_modal(f, area, selected, app.detail_scroll);
  }
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let date = Local::now().format("%Y-%m-%d").to_string();

  let left = Span::styled(
    " vitae  résumé analyzer",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(
    format!("{}  {date} ", app.analyzer.client().base_url()),
    Style::default().fg(Color::Gray),
  );

  // Simple left-right header: pad the middle.
  let left_width = left.width() as u16;
  let right_width = right.width() as u16;
  let pad = area
    .width
    .saturating_sub(left_width)
    .saturating_sub(right_width);

  let line = Line::from(vec![
    left,
    Span::raw(" ".repeat(pad as usize)),
    right,
  ]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

fn draw_tabs(f: &mut Frame, area: Rect, app: &App) {
  let selected = match app.tab {
    Tab::Analyze => 0,
    Tab::History => 1,
  };
  let tabs = Tabs::new(vec![
    " Live Analysis ".to_string(),
    format!(" History ({}) ", app.history.len()),
  ])
  .select(selected)
  .highlight_style(
    Style::default()
      .fg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  )
  .divider("│");
  f.render_widget(tabs, area);
}

// ─── Modal ────────────────────────────────────────────────────────────────────

fn draw_modal(f: &mut Frame, area: Rect, result: &vitae_core::resume::AnalysisResult, scroll: usize) {
  let popup = centered(area, 80, 80);
  f.render_widget(Clear, popup);

  let block = Block::default()
    .title(format!(" {} ", result.file_name))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let inner = block.inner(popup);
  f.render_widget(block, popup);

  let para = Paragraph::new(resume_detail::lines(result)).scroll((scroll as u16, 0));
  f.render_widget(para, inner);
}

/// A rectangle `pct_x`% × `pct_y`% of `area`, centred.
fn centered(area: Rect, pct_x: u16, pct_y: u16) -> Rect {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Percentage((100 - pct_y) / 2),
      Constraint::Percentage(pct_y),
      Constraint::Percentage((100 - pct_y) / 2),
    ])
    .split(area);
  Layout::default()
    .direction(Direction::Horizontal)
    .constraints([
      Constraint::Percentage((100 - pct_x) / 2),
      Constraint::Percentage(pct_x),
      Constraint::Percentage((100 - pct_x) / 2),
    ])
    .split(rows[1])[1]
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = if app.selected.is_some() {
    ("DETAIL", "↑↓/jk scroll  Esc close")
  } else if app.path_active {
    ("FILE", "Type a path to a PDF  Enter select  Esc cancel")
  } else if app.filter_active {
    ("SEARCH", "Type to filter  Esc cancel  Enter select")
  } else {
    match app.tab {
      Tab::Analyze if app.is_analyzing() => ("BUSY", "Esc cancel  Tab history  q quit"),
      Tab::Analyze => ("NORMAL", "o open file  a analyze  ↑↓ scroll  Tab history  q quit"),
      Tab::History => (
        "HISTORY",
        "↑↓/jk navigate  Enter detail  / search  r refresh  Tab analyze  q quit",
      ),
    }
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(
    format!("  {status}"),
    Style::default().fg(Color::DarkGray),
  );

  let line = Line::from(vec![mode_span, hint_span]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
