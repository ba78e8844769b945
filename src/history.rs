use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::format::format_hours;
use crate::session::{Session, SessionId};
use crate::storage::{KeyValueStore, HISTORY_KEY};

/// Durable, newest-first log of completed sessions.
///
/// Every mutation rewrites the full JSON array under [`HISTORY_KEY`].
#[derive(Debug)]
pub struct HistoryStore<S> {
    store: S,
    sessions: Vec<Session>,
    warning: Option<StorageError>,
}

impl<S: KeyValueStore> HistoryStore<S> {
    /// Open the history, loading whatever the store holds
    pub fn open(store: S) -> Self {
        let sessions = load_sessions(&store);
        info!(count = sessions.len(), "history loaded");
        Self {
            store,
            sessions,
            warning: None,
        }
    }

    /// Read the durable copy. Missing or corrupt data yields an empty list.
    pub fn load(&self) -> Vec<Session> {
        load_sessions(&self.store)
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn append(&mut self, session: Session) {
        debug!(id = %session.id, "appending session");
        self.sessions.insert(0, session);
        self.persist();
    }

    /// Drop the session with `id`. Unknown ids leave the list as it was.
    pub fn remove(&mut self, id: SessionId) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        let removed = self.sessions.len() != before;
        debug!(%id, removed, "removing session");
        self.persist();
        removed
    }

    pub fn clear(&mut self) {
        debug!(count = self.sessions.len(), "clearing history");
        self.sessions.clear();
        self.persist();
    }

    /// Sum of all session durations as decimal hours
    pub fn total_hours(&self) -> String {
        format_hours(self.sessions.iter().map(Session::duration_ms).sum())
    }

    pub fn take_warning(&mut self) -> Option<StorageError> {
        self.warning.take()
    }

    fn persist(&mut self) {
        let result = serde_json::to_string(&self.sessions)
            .map_err(StorageError::from)
            .and_then(|json| self.store.set(HISTORY_KEY, &json));
        if let Err(e) = result {
            warn!(error = %e, "failed to persist history");
            self.warning = Some(e);
        }
    }
}

fn load_sessions<S: KeyValueStore>(store: &S) -> Vec<Session> {
    let raw = match store.get(HISTORY_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(error = %e, "unreadable history, starting empty");
            return Vec::new();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(error = %e, "corrupt history, starting empty");
        Vec::new()
    })
}
