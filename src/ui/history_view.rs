use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::{app::App, clock::Clock, session::Session, storage::KeyValueStore};

/// Pure presenter for a single history row: started, date, duration, hours
pub fn present_row(session: &Session) -> Row<'static> {
    let started = session
        .started_at_local()
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "—".to_string());
    let date = session
        .ended_at_local()
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "—".to_string());

    Row::new(vec![
        Cell::from(started).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(date).style(Style::default().fg(Color::Gray)),
        Cell::from(session.duration_display.clone()),
        Cell::from(format!("{} h", session.duration_hours)).style(Style::default().fg(Color::Cyan)),
    ])
}

/// Render the History screen
pub fn render<S: KeyValueStore, C: Clock>(app: &App<S, C>, f: &mut Frame, area: Rect) {
    let history = app.tracker.history();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Sessions
        ])
        .split(area);

    let title_text = if history.is_empty() {
        "History".to_string()
    } else {
        format!(
            "History · {} sessions · {} h",
            history.len(),
            history.total_hours()
        )
    };
    let title = Paragraph::new(title_text)
        .block(Block::default().borders(Borders::ALL))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    if history.is_empty() {
        let empty = Paragraph::new("No sessions yet")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(empty, chunks[1]);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Started"),
        Cell::from("Date"),
        Cell::from("Duration"),
        Cell::from("Hours"),
    ])
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = history.sessions().iter().map(present_row).collect();
    let widths = [
        Constraint::Length(8),  // Started
        Constraint::Length(12), // Date
        Constraint::Length(12), // Duration
        Constraint::Min(8),     // Hours
    ];

    let block_title = if app.history_state.pending_clear {
        "Clear All History? (y/n)"
    } else {
        "Sessions"
    };
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(block_title))
        .column_spacing(2)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("› ");

    let mut state = TableState::default().with_selected(Some(app.history_state.selected));
    f.render_stateful_widget(table, chunks[1], &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::Config;
    use crate::app::View;
    use crate::session::SessionId;
    use crate::storage::{MemoryStore, HISTORY_KEY};
    use crate::tracker::Tracker;
    use crate::ui::test_support::render_to_string;

    fn history_app(sessions: usize) -> App<MemoryStore, ManualClock> {
        let clock = ManualClock::new(1_700_000_000_000);
        let mut tracker = Tracker::open(MemoryStore::new(), clock.clone());
        for _ in 0..sessions {
            tracker.start();
            clock.advance(3_725_000);
            tracker.stop();
        }
        let config = Config {
            start_view: View::History,
            ..Config::default()
        };
        App::new(tracker, &config)
    }

    #[test]
    fn empty_history_placeholder() {
        let content = render_to_string(&history_app(0), 80, 24);
        assert!(content.contains("No sessions yet"));
        assert!(!content.contains("clear all"));
    }

    #[test]
    fn sessions_are_listed_with_totals() {
        let content = render_to_string(&history_app(2), 80, 24);
        assert!(content.contains("01:02:05"));
        assert!(content.contains("1.03 h"));
        assert!(content.contains("2 sessions"));
        assert!(content.contains("2.07 h"));
        assert!(content.contains("(C) clear all"));
    }

    #[test]
    fn pending_clear_is_announced() {
        let mut app = history_app(1);
        app.history_state.pending_clear = true;
        let content = render_to_string(&app, 80, 24);
        assert!(content.contains("Clear All History? (y/n)"));
    }

    #[test]
    fn rows_show_the_stored_strings() {
        let store = MemoryStore::new();
        let mut session = Session::new(SessionId::new(1), 0, 1_000);
        session.duration_display = "07:07:07".to_string();
        session.duration_hours = "7.12".to_string();
        store
            .set(HISTORY_KEY, &serde_json::to_string(&[session]).unwrap())
            .unwrap();

        let tracker = Tracker::open(store, ManualClock::new(0));
        let config = Config {
            start_view: View::History,
            ..Config::default()
        };
        let content = render_to_string(&App::new(tracker, &config), 80, 24);
        assert!(content.contains("07:07:07"));
        assert!(content.contains("7.12 h"));
    }
}
