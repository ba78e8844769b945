use std::cell::Cell;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, RecvError, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block until an event arrives or the source is closed.
    fn recv(&self) -> Result<AppEvent, RecvError>;

    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                // Windows reports releases too; only presses drive the app
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => AppEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => AppEvent::Resize,
                Ok(_) => continue,
                Err(_) => break,
            };
            if tx.send(evt).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv(&self) -> Result<AppEvent, RecvError> {
        self.rx.recv()
    }

    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv(&self) -> Result<AppEvent, RecvError> {
        self.rx.recv()
    }

    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Handle that keeps tick delivery alive; dropping it cancels the ticks
#[derive(Debug)]
pub struct TickSubscription {
    subscribers: Rc<Cell<usize>>,
}

impl Drop for TickSubscription {
    fn drop(&mut self) {
        self.subscribers.set(self.subscribers.get().saturating_sub(1));
    }
}

/// Runner that advances the application one event/tick at a time.
///
/// Ticks are produced only while at least one [`TickSubscription`] is alive;
/// otherwise `step` blocks until the next real event.
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    subscribers: Rc<Cell<usize>>,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
            subscribers: Rc::new(Cell::new(0)),
        }
    }

    pub fn subscribe_ticks(&self) -> TickSubscription {
        self.subscribers.set(self.subscribers.get() + 1);
        TickSubscription {
            subscribers: Rc::clone(&self.subscribers),
        }
    }

    pub fn is_ticking(&self) -> bool {
        self.subscribers.get() > 0
    }

    /// Next event, a Tick when subscribed and the interval lapses quietly,
    /// or `None` once the event source has closed.
    pub fn step(&self) -> Option<AppEvent> {
        if self.is_ticking() {
            match self.event_source.recv_timeout(self.ticker.interval()) {
                Ok(ev) => Some(ev),
                Err(RecvTimeoutError::Timeout) => Some(AppEvent::Tick),
                Err(RecvTimeoutError::Disconnected) => None,
            }
        } else {
            self.event_source.recv().ok()
        }
    }
}
