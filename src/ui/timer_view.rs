use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::{app::App, clock::Clock, storage::KeyValueStore};

const CARD_WIDTH: u16 = 40;
const CARD_HEIGHT: u16 = 11;

/// Render the live timer card
pub fn render<S: KeyValueStore, C: Clock>(app: &App<S, C>, f: &mut Frame, area: Rect) {
    let running = app.tracker.is_running();
    let elapsed = app.tracker.elapsed();

    let accent = if running { Color::Red } else { Color::Cyan };
    let card = centered(area, CARD_WIDTH, CARD_HEIGHT);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(accent))
        .title(" Timer Tracker ")
        .title_alignment(Alignment::Center);
    let inner = block.inner(card);
    f.render_widget(block, card);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // HH:MM:SS
            Constraint::Length(1), // decimal hours
            Constraint::Length(1),
            Constraint::Length(1), // toggle
            Constraint::Length(1),
            Constraint::Length(1), // state
        ])
        .split(inner);

    let clock_face = Paragraph::new(Span::styled(
        elapsed.display,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    f.render_widget(clock_face, rows[0]);

    let hours = Paragraph::new(format!("{} Total Hours", elapsed.hours_decimal))
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    f.render_widget(hours, rows[1]);

    let (symbol, label, style) = if running {
        ("■", "Finish", Style::default().fg(Color::LightRed))
    } else {
        ("▶", "Start", Style::default().fg(Color::LightGreen))
    };
    let toggle = Paragraph::new(Line::from(vec![
        Span::styled(format!("{symbol} "), style),
        Span::styled(label, style.add_modifier(Modifier::BOLD)),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(toggle, rows[3]);

    let state = Paragraph::new(if running {
        "Session Active"
    } else {
        "Ready to Start"
    })
    .style(Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC))
    .alignment(Alignment::Center);
    f.render_widget(state, rows[5]);
}

/// A `width` x `height` rect centred in `area`, shrunk to fit
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
