//! Transcript store: the active session's turns plus the history list.
//!
//! Append-only: turns are never removed or reordered. History is ordered
//! most-recent-first by creation time.

use std::collections::{HashMap, VecDeque};

use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::{Level, Session, SessionSummary, Turn};

/// Storage seam for interview sessions. A durable backend would implement this
/// without touching the orchestrator.
pub trait TranscriptStore: Send {
    /// Creates a session and places it at the head of the history.
    fn create_session(&mut self, role: String, level: Level) -> Session;

    fn append(&mut self, session_id: Uuid, turn: Turn) -> Result<(), AppError>;

    fn get(&self, session_id: Uuid) -> Result<Vec<Turn>, AppError>;

    fn session(&self, session_id: Uuid) -> Result<Session, AppError>;

    /// Summaries, most-recent-first.
    fn list_sessions(&self) -> Vec<SessionSummary>;

    fn record_question(&mut self, session_id: Uuid) -> Result<(), AppError>;

    fn mark_completed(&mut self, session_id: Uuid) -> Result<(), AppError>;
}

/// Process-lifetime store. Everything is lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryTranscriptStore {
    sessions: HashMap<Uuid, Session>,
    order: VecDeque<Uuid>,
}

impl InMemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn session_mut(&mut self, session_id: Uuid) -> Result<&mut Session, AppError> {
        self.sessions
            .get_mut(&session_id)
            .ok_or_else(|| not_found(session_id))
    }
}

fn not_found(session_id: Uuid) -> AppError {
    AppError::NotFound(format!("Interview session {session_id} not found"))
}

impl TranscriptStore for InMemoryTranscriptStore {
    fn create_session(&mut self, role: String, level: Level) -> Session {
        let session = Session::new(role, level);
        self.order.push_front(session.id);
        self.sessions.insert(session.id, session.clone());
        session
    }

    fn append(&mut self, session_id: Uuid, turn: Turn) -> Result<(), AppError> {
        self.session_mut(session_id)?.transcript.push(turn);
        Ok(())
    }

    fn get(&self, session_id: Uuid) -> Result<Vec<Turn>, AppError> {
        self.sessions
            .get(&session_id)
            .map(|s| s.transcript.clone())
            .ok_or_else(|| not_found(session_id))
    }

    fn session(&self, session_id: Uuid) -> Result<Session, AppError> {
        self.sessions
            .get(&session_id)
            .cloned()
            .ok_or_else(|| not_found(session_id))
    }

    fn list_sessions(&self) -> Vec<SessionSummary> {
        self.order
            .iter()
            .filter_map(|id| self.sessions.get(id))
            .map(Session::summary)
            .collect()
    }

    fn record_question(&mut self, session_id: Uuid) -> Result<(), AppError> {
        self.session_mut(session_id)?.questions_asked += 1;
        Ok(())
    }

    fn mark_completed(&mut self, session_id: Uuid) -> Result<(), AppError> {
        self.session_mut(session_id)?.completed = true;
        Ok(())
    }
}
