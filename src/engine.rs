use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{StorageError, StorageResult};
use crate::format::{format_duration, FormattedDuration};
use crate::session::{Session, SessionIdGenerator};
use crate::storage::{KeyValueStore, TIMER_RUNNING_KEY, TIMER_START_KEY};

/// The timer's state. A start timestamp exists only while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Not timing; the elapsed value shown is frozen.
    Idle { frozen_elapsed_ms: u64 },
    Running { started_at_ms: u64 },
}

impl Default for TimerState {
    fn default() -> Self {
        TimerState::Idle {
            frozen_elapsed_ms: 0,
        }
    }
}

/// Single-timer state machine.
///
/// The in-memory state is authoritative. Every transition ends with an
/// explicit `persist()`; a failed write is logged and parked in
/// [`TimerEngine::take_warning`] while the transition itself still stands.
#[derive(Debug)]
pub struct TimerEngine<S, C> {
    store: S,
    clock: C,
    state: TimerState,
    ids: SessionIdGenerator,
    warning: Option<StorageError>,
}

impl<S: KeyValueStore, C: Clock> TimerEngine<S, C> {
    /// Cold start: idle, without consulting the store
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            state: TimerState::default(),
            ids: SessionIdGenerator::new(),
            warning: None,
        }
    }

    /// Start from whatever the store holds. A persisted running timer keeps
    /// its original start so elapsed time carries across the restart.
    pub fn restore(store: S, clock: C) -> Self {
        let state = read_persisted_state(&store);
        if let TimerState::Running { started_at_ms } = state {
            info!(started_at_ms, "resuming running timer");
        }
        Self {
            state,
            ..Self::new(store, clock)
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    pub fn started_at_ms(&self) -> Option<u64> {
        match self.state {
            TimerState::Running { started_at_ms } => Some(started_at_ms),
            TimerState::Idle { .. } => None,
        }
    }

    /// Keep future session ids clear of ones already in use
    pub fn observe_ids<'a, I>(&mut self, sessions: I)
    where
        I: IntoIterator<Item = &'a Session>,
    {
        for session in sessions {
            self.ids.observe(session.id);
        }
    }

    /// Begin a fresh session. Ignored while already running.
    /// Returns whether the timer was started.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            debug!("start ignored: timer already running");
            return false;
        }
        let started_at_ms = self.clock.now_ms();
        self.state = TimerState::Running { started_at_ms };
        debug!(started_at_ms, "timer started");
        self.persist();
        true
    }

    /// Finish the running session and hand it back for the history.
    /// Returns `None` when idle.
    pub fn stop(&mut self) -> Option<Session> {
        let TimerState::Running { started_at_ms } = self.state else {
            debug!("stop ignored: timer idle");
            return None;
        };
        let now = self.clock.now_ms();
        let id = self.ids.next_id(now);
        let session = Session::new(id, started_at_ms, now);

        self.state = TimerState::Idle {
            frozen_elapsed_ms: session.duration_ms(),
        };
        debug!(id = %session.id, duration = %session.duration_display, "timer stopped");
        self.persist();
        Some(session)
    }

    /// Live elapsed milliseconds; a pure read safe at any sampling rate
    pub fn elapsed_ms(&self) -> u64 {
        match self.state {
            TimerState::Running { started_at_ms } => {
                self.clock.now_ms().saturating_sub(started_at_ms)
            }
            TimerState::Idle { frozen_elapsed_ms } => frozen_elapsed_ms,
        }
    }

    pub fn elapsed(&self) -> FormattedDuration {
        format_duration(self.elapsed_ms())
    }

    pub fn take_warning(&mut self) -> Option<StorageError> {
        self.warning.take()
    }

    fn persist(&mut self) {
        if let Err(e) = self.write_state() {
            warn!(error = %e, "failed to persist timer state");
            self.warning = Some(e);
        }
    }

    fn write_state(&self) -> StorageResult<()> {
        match self.state {
            TimerState::Running { started_at_ms } => {
                self.store
                    .set(TIMER_START_KEY, &started_at_ms.to_string())?;
                self.store.set(TIMER_RUNNING_KEY, "true")
            }
            TimerState::Idle { .. } => {
                self.store.remove(TIMER_START_KEY)?;
                self.store.set(TIMER_RUNNING_KEY, "false")
            }
        }
    }
}

/// Anything short of a running flag plus a parseable start reads as idle
fn read_persisted_state<S: KeyValueStore>(store: &S) -> TimerState {
    let running = match store.get(TIMER_RUNNING_KEY) {
        Ok(value) => value.as_deref() == Some("true"),
        Err(e) => {
            warn!(error = %e, "unreadable timer state, starting idle");
            return TimerState::default();
        }
    };
    if !running {
        return TimerState::default();
    }

    match store.get(TIMER_START_KEY) {
        Ok(Some(raw)) => match raw.trim().parse::<u64>() {
            Ok(started_at_ms) => TimerState::Running { started_at_ms },
            Err(e) => {
                warn!(value = %raw, error = %e, "malformed timer start, starting idle");
                TimerState::default()
            }
        },
        Ok(None) => {
            warn!("timer marked running without a start time, starting idle");
            TimerState::default()
        }
        Err(e) => {
            warn!(error = %e, "unreadable timer start, starting idle");
            TimerState::default()
        }
    }
}
