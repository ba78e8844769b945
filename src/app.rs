use clap::ValueEnum;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;
use crate::config::Config;
use crate::runtime::AppEvent;
use crate::session::Session;
use crate::storage::KeyValueStore;
use crate::tracker::{Toggle, Tracker};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum View {
    #[default]
    Timer,
    History,
}

impl View {
    pub fn next(self) -> Self {
        match self {
            View::Timer => View::History,
            View::History => View::Timer,
        }
    }
}

#[derive(Debug, Default)]
pub struct HistoryViewState {
    pub selected: usize,
    /// Waiting for `y` to confirm "clear all"
    pub pending_clear: bool,
}

/// Whether the event loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Terminal-facing application state wrapped around the tracker
#[derive(Debug)]
pub struct App<S, C> {
    pub tracker: Tracker<S, C>,
    pub view: View,
    pub history_state: HistoryViewState,
    /// One-line message for the status bar, replaced on the next key
    pub status: Option<String>,
    confirm_clear: bool,
}

impl<S: KeyValueStore, C: Clock> App<S, C> {
    pub fn new(tracker: Tracker<S, C>, config: &Config) -> Self {
        let mut app = Self {
            tracker,
            view: config.start_view,
            history_state: HistoryViewState::default(),
            status: None,
            confirm_clear: config.confirm_clear,
        };
        // restoring may already have hit a storage problem worth showing
        app.collect_warning();
        app
    }

    /// Live refresh is only needed while a session is running
    pub fn wants_ticks(&self) -> bool {
        self.tracker.is_running()
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Flow {
        match event {
            AppEvent::Key(key) => self.on_key(key),
            AppEvent::Resize | AppEvent::Tick => Flow::Continue,
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }
        self.status = None;

        if self.history_state.pending_clear {
            self.history_state.pending_clear = false;
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                self.clear_history();
            } else {
                self.status = Some("Clear cancelled".to_string());
            }
            return Flow::Continue;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle(),
            KeyCode::Tab | KeyCode::BackTab => self.view = self.view.next(),
            KeyCode::Char('1') => self.view = View::Timer,
            KeyCode::Char('2') => self.view = View::History,
            _ if self.view == View::History => self.on_history_key(key),
            _ => {}
        }
        self.collect_warning();
        Flow::Continue
    }

    pub fn selected_session(&self) -> Option<&Session> {
        self.tracker
            .history()
            .sessions()
            .get(self.history_state.selected)
    }

    fn on_history_key(&mut self, key: KeyEvent) {
        let len = self.tracker.history().len();
        let selected = self.history_state.selected;
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.history_state.selected = selected.saturating_sub(1)
            }
            KeyCode::Down | KeyCode::Char('j') if selected + 1 < len => {
                self.history_state.selected = selected + 1
            }
            KeyCode::Home | KeyCode::Char('g') => self.history_state.selected = 0,
            KeyCode::End | KeyCode::Char('G') => self.history_state.selected = len.saturating_sub(1),
            KeyCode::Char('d') | KeyCode::Delete | KeyCode::Backspace => self.delete_selected(),
            KeyCode::Char('C') if len > 0 => {
                if self.confirm_clear {
                    self.history_state.pending_clear = true;
                    self.status = Some("Clear all history? (y/n)".to_string());
                } else {
                    self.clear_history();
                }
            }
            _ => {}
        }
    }

    fn toggle(&mut self) {
        match self.tracker.toggle() {
            Toggle::Started { at_ms } => debug!(at_ms, "session started from ui"),
            Toggle::Stopped(session) => {
                self.history_state.selected = 0;
                self.status = Some(format!(
                    "Saved {} ({} h)",
                    session.duration_display, session.duration_hours
                ));
            }
        }
    }

    fn delete_selected(&mut self) {
        let Some(id) = self.selected_session().map(|s| s.id) else {
            return;
        };
        if self.tracker.remove(id) {
            self.status = Some("Session deleted".to_string());
        }
        self.clamp_selection();
    }

    fn clear_history(&mut self) {
        self.tracker.clear();
        self.history_state.selected = 0;
        self.status = Some("History cleared".to_string());
        self.collect_warning();
    }

    fn clamp_selection(&mut self) {
        let len = self.tracker.history().len();
        self.history_state.selected = self.history_state.selected.min(len.saturating_sub(1));
    }

    /// Surface a storage failure without interrupting the session
    fn collect_warning(&mut self) {
        if let Some(e) = self.tracker.take_warning() {
            self.status = Some(format!("Not saved: {e}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::{FileStore, MemoryStore};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_at(now: u64) -> (App<MemoryStore, ManualClock>, ManualClock) {
        let clock = ManualClock::new(now);
        let tracker = Tracker::open(MemoryStore::new(), clock.clone());
        (App::new(tracker, &Config::default()), clock)
    }

    fn record_sessions(app: &mut App<MemoryStore, ManualClock>, clock: &ManualClock, n: usize) {
        for _ in 0..n {
            app.on_key(key(KeyCode::Char(' ')));
            clock.advance(1_000);
            app.on_key(key(KeyCode::Char(' ')));
        }
    }

    #[test]
    fn space_toggles_and_reports_saved_session() {
        let (mut app, clock) = app_at(0);
        app.on_key(key(KeyCode::Char(' ')));
        assert!(app.wants_ticks());

        clock.set(3_725_000);
        app.on_key(key(KeyCode::Enter));
        assert!(!app.wants_ticks());
        assert_eq!(app.status.as_deref(), Some("Saved 01:02:05 (1.03 h)"));
        assert_eq!(app.tracker.history().len(), 1);
    }

    #[test]
    fn view_switching() {
        let (mut app, _) = app_at(0);
        assert_eq!(app.view, View::Timer);
        app.on_key(key(KeyCode::Tab));
        assert_eq!(app.view, View::History);
        app.on_key(key(KeyCode::Tab));
        assert_eq!(app.view, View::Timer);
        app.on_key(key(KeyCode::Char('2')));
        assert_eq!(app.view, View::History);
        app.on_key(key(KeyCode::Char('1')));
        assert_eq!(app.view, View::Timer);
    }

    #[test]
    fn quit_keys() {
        let (mut app, _) = app_at(0);
        assert_eq!(app.on_key(key(KeyCode::Char('q'))), Flow::Quit);
        assert_eq!(app.on_key(key(KeyCode::Esc)), Flow::Quit);
        assert_eq!(
            app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Flow::Quit
        );
        assert_eq!(app.handle_event(AppEvent::Tick), Flow::Continue);
    }

    #[test]
    fn delete_selected_session_in_history_view() {
        let (mut app, clock) = app_at(0);
        record_sessions(&mut app, &clock, 3);
        app.on_key(key(KeyCode::Char('2')));

        app.on_key(key(KeyCode::Char('j')));
        let doomed = app.selected_session().unwrap().id;
        app.on_key(key(KeyCode::Char('d')));

        assert_eq!(app.tracker.history().len(), 2);
        assert!(app.tracker.history().get(doomed).is_none());
        assert_eq!(app.status.as_deref(), Some("Session deleted"));
    }

    #[test]
    fn selection_stays_in_bounds() {
        let (mut app, clock) = app_at(0);
        record_sessions(&mut app, &clock, 2);
        app.on_key(key(KeyCode::Char('2')));

        for _ in 0..5 {
            app.on_key(key(KeyCode::Down));
        }
        assert_eq!(app.history_state.selected, 1);

        app.on_key(key(KeyCode::Char('d')));
        assert_eq!(app.history_state.selected, 0);
        app.on_key(key(KeyCode::Char('d')));
        assert_eq!(app.history_state.selected, 0);
        assert!(app.selected_session().is_none());

        // deleting from an empty list is harmless
        app.on_key(key(KeyCode::Char('d')));
        assert!(app.tracker.history().is_empty());
    }

    #[test]
    fn delete_keys_are_ignored_on_timer_view() {
        let (mut app, clock) = app_at(0);
        record_sessions(&mut app, &clock, 1);
        app.on_key(key(KeyCode::Char('d')));
        assert_eq!(app.tracker.history().len(), 1);
    }

    #[test]
    fn clear_all_requires_confirmation() {
        let (mut app, clock) = app_at(0);
        record_sessions(&mut app, &clock, 2);
        app.on_key(key(KeyCode::Char('2')));

        app.on_key(key(KeyCode::Char('C')));
        assert!(app.history_state.pending_clear);
        app.on_key(key(KeyCode::Char('n')));
        assert_eq!(app.tracker.history().len(), 2);
        assert_eq!(app.status.as_deref(), Some("Clear cancelled"));

        app.on_key(key(KeyCode::Char('C')));
        app.on_key(key(KeyCode::Char('y')));
        assert!(app.tracker.history().is_empty());
        assert_eq!(app.status.as_deref(), Some("History cleared"));
    }

    #[test]
    fn clear_without_confirmation_when_configured() {
        let clock = ManualClock::new(0);
        let tracker = Tracker::open(MemoryStore::new(), clock.clone());
        let config = Config {
            confirm_clear: false,
            start_view: View::History,
            ..Config::default()
        };
        let mut app = App::new(tracker, &config);
        record_sessions(&mut app, &clock, 1);

        app.on_key(key(KeyCode::Char('C')));
        assert!(app.tracker.history().is_empty());
    }

    #[test]
    fn clear_is_not_offered_for_empty_history() {
        let (mut app, _) = app_at(0);
        app.on_key(key(KeyCode::Char('2')));
        app.on_key(key(KeyCode::Char('C')));
        assert!(!app.history_state.pending_clear);
    }

    #[test]
    fn view_display_and_parse() {
        assert_eq!(View::History.to_string(), "history");
        assert_eq!(View::from_str("timer", true).unwrap(), View::Timer);
    }

    #[test]
    fn failed_save_is_shown_in_the_status_line() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let store = FileStore::with_path(blocker.join("state.json"));
        let clock = ManualClock::new(0);
        let mut app = App::new(Tracker::open(store, clock.clone()), &Config::default());
        assert_eq!(app.status, None);

        app.on_key(key(KeyCode::Char(' ')));
        assert!(app.tracker.is_running());
        let status = app.status.clone().unwrap_or_default();
        assert!(status.starts_with("Not saved: "), "status was {status:?}");

        // the session is still recorded in memory
        clock.advance(1_000);
        app.on_key(key(KeyCode::Char(' ')));
        assert_eq!(app.tracker.history().len(), 1);
        assert!(app.status.as_deref().unwrap_or_default().starts_with("Not saved: "));
    }
}
