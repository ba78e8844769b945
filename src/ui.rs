pub mod history_view;
pub mod timer_view;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    app::{App, View},
    clock::Clock,
    storage::KeyValueStore,
};

/// Draw the whole screen: the active view, the view switcher and a status line
pub fn draw<S: KeyValueStore, C: Clock>(app: &App<S, C>, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Active view
            Constraint::Length(1), // Navigation
            Constraint::Length(1), // Status / key help
        ])
        .split(f.area());

    match app.view {
        View::Timer => timer_view::render(app, f, chunks[0]),
        View::History => history_view::render(app, f, chunks[0]),
    }

    f.render_widget(navigation(app.view), chunks[1]);
    render_status(app, f, chunks[2]);
}

fn navigation(active: View) -> Paragraph<'static> {
    let tab = |view: View, label: &'static str| {
        let style = if view == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        Span::styled(format!(" {label} "), style)
    };

    Paragraph::new(Line::from(vec![
        tab(View::Timer, "1 Timer"),
        Span::raw("  "),
        tab(View::History, "2 History"),
    ]))
    .alignment(Alignment::Center)
}

fn render_status<S: KeyValueStore, C: Clock>(app: &App<S, C>, f: &mut Frame, area: Rect) {
    let line = match &app.status {
        Some(message) => Paragraph::new(message.as_str()).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        None => Paragraph::new(key_help(app)).style(Style::default().add_modifier(Modifier::DIM)),
    };
    f.render_widget(line.alignment(Alignment::Center), area);
}

fn key_help<S: KeyValueStore, C: Clock>(app: &App<S, C>) -> &'static str {
    match app.view {
        View::Timer => "(space) start/finish  (tab) history  (q) quit",
        View::History if app.tracker.history().is_empty() => {
            "(space) start/finish  (tab) timer  (q) quit"
        }
        View::History => "(↑/↓) select  (d) delete  (C) clear all  (tab) timer  (q) quit",
    }
}
