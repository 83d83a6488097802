use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;

use super::{SessionState, StreamSession};
use crate::error::AppError;
use crate::hook::Event;
use crate::result::Result;

#[derive(Default)]
struct Table {
    sessions: HashMap<String, StreamSession>,
    /// Identifiers with a start in flight
    reserved: HashSet<String>,
}

/// Keyed table of sessions and the only place session state is mutated.
///
/// The lock is never held across an await point or any I/O, so lookups only
/// ever wait for other in-memory updates. State changes are published while
/// the lock is held, so subscribers see them in the order they happened.
#[derive(Default)]
pub struct Registry {
    table: RwLock<Table>,
    events: Option<broadcast::Sender<Event>>,
}

impl Registry {
    pub fn with_events(events: broadcast::Sender<Event>) -> Self {
        Self {
            table: Default::default(),
            events: Some(events),
        }
    }

    fn publish(&self, session: &StreamSession) {
        if let Some(events) = &self.events {
            let _ = events.send(Event::Session(session.info()));
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Table> {
        self.table.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Table> {
        self.table.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn lookup(&self, id: &str) -> Option<api::response::Session> {
        self.read().sessions.get(id).map(|s| s.info())
    }

    pub fn list(&self) -> Vec<api::response::Session> {
        let mut sessions: Vec<_> = self.read().sessions.values().map(|s| s.info()).collect();
        sessions.sort_by(|a, b| a.id.cmp(&b.id));
        sessions
    }

    /// Claims `id` for a start. A retained terminal session stays visible
    /// until its successor is registered.
    pub fn reserve(&self, id: &str) -> Result<()> {
        let mut table = self.write();
        if table.reserved.contains(id) {
            return Err(AppError::already_active(format!(
                "session {id} is already starting"
            )));
        }
        if let Some(session) = table.sessions.get(id) {
            if session.state.is_active() {
                return Err(AppError::already_active(format!(
                    "session {id} is {}",
                    session.state
                )));
            }
        }
        table.reserved.insert(id.to_string());
        Ok(())
    }

    pub fn release(&self, id: &str) {
        self.write().reserved.remove(id);
    }

    /// Records a session, replacing any terminal one with the same id, and
    /// releases its reservation.
    pub fn register(&self, session: StreamSession) -> Result<api::response::Session> {
        let mut table = self.write();
        if let Some(current) = table.sessions.get(&session.id) {
            if current.state.is_active() {
                return Err(AppError::already_active(format!(
                    "session {} is {}",
                    session.id, current.state
                )));
            }
        }
        table.reserved.remove(&session.id);
        let info = session.info();
        self.publish(&session);
        table.sessions.insert(session.id.clone(), session);
        Ok(info)
    }

    /// Applies `mutation` to the session atomically with respect to every
    /// other registry operation.
    pub fn update<F, T>(&self, id: &str, mutation: F) -> Result<T>
    where
        F: FnOnce(&mut StreamSession) -> Result<T>,
    {
        let mut table = self.write();
        let session = table
            .sessions
            .get_mut(id)
            .ok_or_else(|| AppError::not_found(format!("session {id} not found")))?;
        let before = session.state;
        let result = mutation(session);
        if session.state != before {
            self.publish(session);
        }
        result
    }

    /// Compare-and-set on the state of the session identified by `id` and `key`.
    pub fn transition(
        &self,
        id: &str,
        key: &uuid::Uuid,
        from: &[SessionState],
        to: SessionState,
    ) -> Result<api::response::Session> {
        self.update(id, |session| {
            if &session.key != key {
                return Err(AppError::not_found(format!("session {id} was replaced")));
            }
            if !from.contains(&session.state) {
                return Err(AppError::invalid_input(format!(
                    "session {id} is {}, not {:?}",
                    session.state, from
                )));
            }
            session.state = to;
            Ok(session.info())
        })
    }

    /// Evicts terminal sessions that ended more than `retention` ago.
    pub fn evict_expired(&self, retention: Duration) -> Vec<String> {
        let retention = chrono::Duration::from_std(retention)
            .unwrap_or_else(|_| chrono::Duration::weeks(52 * 100));
        let now = Utc::now();
        let mut table = self.write();
        let expired: Vec<String> = table
            .sessions
            .values()
            .filter(|s| {
                s.state.is_terminal()
                    && s.ended_at.map(|t| now - t >= retention).unwrap_or(false)
            })
            .map(|s| s.id.clone())
            .collect();
        for id in expired.iter() {
            table.sessions.remove(id);
        }
        expired
    }

    /// Identifiers of sessions that still own an encoder process.
    pub fn active_ids(&self) -> Vec<String> {
        self.read()
            .sessions
            .values()
            .filter(|s| s.state.is_active())
            .map(|s| s.id.clone())
            .collect()
    }
}
