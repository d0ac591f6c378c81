//! Screen rendering: pure snapshot-to-row mapping plus ratatui layout.

use std::time::Duration;

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use tokio::time::Instant;

use redscope_scan::{SelectionSet, WorkerSummary};
use redscope_store::{KeyStore, KeyValue};

use super::app::{App, DetailView, Screen};

const NAME_WIDTH: usize = 20;
const PATTERN_WIDTH: usize = 30;
const COUNT_WIDTH: usize = 7;
const AGE_WIDTH: usize = 10;
const KIND_WIDTH: usize = 6;

/// Age bands for the overview "updated" column. Passed into the row
/// renderer explicitly so the thresholds stay configuration, not globals.
#[derive(Debug, Clone, Copy)]
pub struct AgeBands {
    pub fresh: Duration,
    pub warm: Duration,
}

impl Default for AgeBands {
    fn default() -> Self {
        Self {
            fresh: Duration::from_secs(30),
            warm: Duration::from_secs(60),
        }
    }
}

/// Draw the entire UI: the active screen above, help and message preview
/// panes below.
pub fn draw<S: KeyStore>(frame: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(5)])
        .split(frame.area());

    match app.screen {
        Screen::Overview => draw_overview(frame, chunks[0], app),
        Screen::Selection => draw_selection(frame, chunks[0], app),
        Screen::Detail => draw_detail(frame, chunks[0], app),
        Screen::Log => draw_log(frame, chunks[0], app),
    }

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    draw_help(frame, bottom[0], app.screen);
    draw_preview(frame, bottom[1], app);
}

fn draw_overview<S: KeyStore>(frame: &mut Frame, area: Rect, app: &mut App<S>) {
    let now = Instant::now();
    let items: Vec<ListItem> = app
        .overview_rows
        .iter()
        .map(|summary| ListItem::new(overview_row(summary, now, app.age_bands)))
        .collect();

    let title = format!(" Scanners [{}] ", app.overview_rows.len());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));
    frame.render_stateful_widget(list, area, &mut app.overview_cursor.list);
}

fn draw_selection<S: KeyStore>(frame: &mut Frame, area: Rect, app: &mut App<S>) {
    let rows = app
        .selection
        .as_ref()
        .map(selection_rows)
        .unwrap_or_default();
    let items: Vec<ListItem> = rows.into_iter().map(ListItem::new).collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Select a key to inspect "),
        )
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));
    frame.render_stateful_widget(list, area, &mut app.selection_cursor.list);
}

fn draw_detail<S: KeyStore>(frame: &mut Frame, area: Rect, app: &mut App<S>) {
    let rows = app.detail.as_ref().map(detail_rows).unwrap_or_default();
    let paragraph = Paragraph::new(rows)
        .block(Block::default().borders(Borders::ALL).title(" Details "))
        .scroll((app.detail_scroll.min(u16::MAX as usize) as u16, 0));
    frame.render_widget(paragraph, area);
}

fn draw_log<S: KeyStore>(frame: &mut Frame, area: Rect, app: &mut App<S>) {
    let rows: Vec<Line> = app
        .messages
        .entries()
        .iter()
        .map(|entry| Line::from(entry.clone()))
        .collect();

    let title = format!(" Messages [{}] ", app.messages.len());
    let paragraph = Paragraph::new(rows)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false })
        .scroll((app.log_scroll.min(u16::MAX as usize) as u16, 0));
    frame.render_widget(paragraph, area);
}

fn draw_help(frame: &mut Frame, area: Rect, screen: Screen) {
    let paragraph = Paragraph::new(help_text(screen))
        .block(Block::default().borders(Borders::ALL).title(" Help "));
    frame.render_widget(paragraph, area);
}

fn draw_preview<S: KeyStore>(frame: &mut Frame, area: Rect, app: &mut App<S>) {
    let preview = app.messages.preview().join("\n");
    let paragraph = Paragraph::new(preview)
        .block(Block::default().borders(Borders::ALL).title(" Messages "))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn help_text(screen: Screen) -> &'static str {
    match screen {
        Screen::Overview => {
            "Up/Down move   Enter select   e enable   d disable\nPgUp/PgDn page   Home/End jump\nm messages   q quit"
        }
        Screen::Selection => {
            "Up/Down move   Enter inspect   Esc back\nPgUp/PgDn page   Home/End jump\nm messages   q quit"
        }
        Screen::Detail => "Up/Down scroll   Esc back\nm messages   q quit",
        Screen::Log => "Up/Down scroll   Esc back\nq quit",
    }
}

/// One overview row: name, kind, pattern, match count, age.
pub fn overview_row(summary: &WorkerSummary, now: Instant, bands: AgeBands) -> Line<'static> {
    let name_style = if summary.enabled {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Red)
    };

    let (age_text, age_color) = match summary.updated {
        None => ("n/a".to_string(), Color::White),
        Some(updated) => {
            let age = now.saturating_duration_since(updated);
            let color = if age <= bands.fresh {
                Color::Green
            } else if age <= bands.warm {
                Color::Yellow
            } else {
                Color::Red
            };
            (format_age(age), color)
        }
    };

    Line::from(vec![
        Span::styled(
            format!("{:<NAME_WIDTH$}", clip(&summary.name, NAME_WIDTH)),
            name_style,
        ),
        Span::styled(
            format!(" {:<KIND_WIDTH$}", summary.kind.tag()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(format!(
            " {:<PATTERN_WIDTH$}",
            clip(&summary.pattern, PATTERN_WIDTH)
        )),
        Span::raw(format!("{:>COUNT_WIDTH$}", summary.key_count)),
        Span::styled(
            format!("{:>AGE_WIDTH$}", age_text),
            Style::default().fg(age_color),
        ),
    ])
}

/// Selection rows: the kind tag followed by the key.
pub fn selection_rows(set: &SelectionSet) -> Vec<Line<'static>> {
    let tag = set.kind().tag();
    set.keys()
        .iter()
        .map(|key| {
            Line::from(vec![
                Span::styled(
                    format!("{:<KIND_WIDTH$}", tag),
                    Style::default().fg(Color::Green),
                ),
                Span::raw(format!(" {}", key)),
            ])
        })
        .collect()
}

/// Detail rows: a Type/Key header followed by the payload, one element per
/// row. Also used to clamp the detail scroll cursor.
pub fn detail_rows(detail: &DetailView) -> Vec<Line<'static>> {
    let label = |text: &str| Span::styled(text.to_string(), Style::default().fg(Color::Cyan));

    let header = |len: Option<usize>| {
        let mut spans = vec![
            label("Type"),
            Span::raw(format!(": {}   ", detail.kind.tag())),
            label("Key"),
            Span::raw(format!(": {}", detail.key)),
        ];
        if let Some(len) = len {
            spans.push(Span::raw("   "));
            spans.push(label("Length"));
            spans.push(Span::raw(format!(": {len}")));
        }
        Line::from(spans)
    };

    match &detail.result {
        Err(err) => vec![
            header(None),
            Line::from(Span::styled(
                format!("Error: {err}"),
                Style::default().fg(Color::Red),
            )),
        ],
        Ok(KeyValue::Scalar(value)) => vec![
            header(None),
            Line::from(vec![label("Value"), Span::raw(format!(": {value}"))]),
        ],
        Ok(KeyValue::List(items)) => {
            let mut rows = vec![header(Some(items.len())), Line::from(label("Items:"))];
            rows.extend(items.iter().enumerate().map(|(i, item)| {
                Line::from(vec![
                    Span::styled(format!("{i:>5}) "), Style::default().fg(Color::Cyan)),
                    Span::raw(item.clone()),
                ])
            }));
            rows
        }
        Ok(KeyValue::Set(members)) => {
            let mut rows = vec![header(Some(members.len())), Line::from(label("Members:"))];
            rows.extend(members.iter().map(|member| {
                Line::from(vec![
                    Span::styled("  - ".to_string(), Style::default().fg(Color::Cyan)),
                    Span::raw(member.clone()),
                ])
            }));
            rows
        }
        Ok(KeyValue::SortedSet(members)) => {
            let mut rows = vec![header(Some(members.len())), Line::from(label("Members:"))];
            rows.extend(members.iter().map(|(member, score)| {
                Line::from(vec![
                    Span::styled(
                        format!("{score:>12.2} "),
                        Style::default().fg(Color::Green),
                    ),
                    Span::raw(format!("- {member}")),
                ])
            }));
            rows
        }
        Ok(KeyValue::Hash(fields)) => {
            let mut rows = vec![header(Some(fields.len())), Line::from(label("Fields:"))];
            rows.extend(fields.iter().map(|(field, value)| {
                Line::from(vec![
                    Span::styled(
                        format!("{field:>20}"),
                        Style::default().fg(Color::Green),
                    ),
                    Span::raw(format!(": {value}")),
                ])
            }));
            rows
        }
    }
}

/// Compact age rendering for the overview column.
fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    if secs >= 3600 {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        text.chars().take(width).collect()
    }
}
