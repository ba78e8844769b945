// Library surface for the binary and for headless/integration tests.
// The timer core (engine, history, tracker) has no terminal dependencies;
// app, runtime and ui layer the TUI on top of it.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod history;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod tracker;
pub mod ui;

pub use engine::{TimerEngine, TimerState};
pub use error::{CommandError, StorageError};
pub use format::{format_duration, FormattedDuration};
pub use history::HistoryStore;
pub use session::{Session, SessionId};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use tracker::{Toggle, Tracker};
