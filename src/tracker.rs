use tracing::info;

use crate::clock::Clock;
use crate::engine::TimerEngine;
use crate::error::StorageError;
use crate::format::FormattedDuration;
use crate::history::HistoryStore;
use crate::session::{Session, SessionId};
use crate::storage::KeyValueStore;

/// Result of the single start/stop toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggle {
    Started { at_ms: u64 },
    Stopped(Session),
}

/// The timer and its history behind one handle.
/// Completed sessions flow from the engine into the history here.
#[derive(Debug)]
pub struct Tracker<S, C> {
    engine: TimerEngine<S, C>,
    history: HistoryStore<S>,
}

impl<S: KeyValueStore + Clone, C: Clock> Tracker<S, C> {
    /// Load history and restore the timer from `store`
    pub fn open(store: S, clock: C) -> Self {
        let history = HistoryStore::open(store.clone());
        let mut engine = TimerEngine::restore(store, clock);
        engine.observe_ids(history.sessions());
        info!(
            running = engine.is_running(),
            sessions = history.len(),
            "tracker opened"
        );
        Self { engine, history }
    }
}

impl<S: KeyValueStore, C: Clock> Tracker<S, C> {
    pub fn engine(&self) -> &TimerEngine<S, C> {
        &self.engine
    }

    pub fn history(&self) -> &HistoryStore<S> {
        &self.history
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn elapsed(&self) -> FormattedDuration {
        self.engine.elapsed()
    }

    pub fn start(&mut self) -> bool {
        self.engine.start()
    }

    /// Stop the timer and record the finished session
    pub fn stop(&mut self) -> Option<Session> {
        let session = self.engine.stop()?;
        self.history.append(session.clone());
        Some(session)
    }

    pub fn toggle(&mut self) -> Toggle {
        match self.stop() {
            Some(session) => Toggle::Stopped(session),
            None => {
                self.engine.start();
                Toggle::Started {
                    at_ms: self.engine.started_at_ms().unwrap_or_default(),
                }
            }
        }
    }

    pub fn remove(&mut self, id: SessionId) -> bool {
        self.history.remove(id)
    }

    pub fn clear(&mut self) {
        self.history.clear()
    }

    /// Oldest pending storage failure, timer first
    pub fn take_warning(&mut self) -> Option<StorageError> {
        self.engine
            .take_warning()
            .or_else(|| self.history.take_warning())
    }
}
