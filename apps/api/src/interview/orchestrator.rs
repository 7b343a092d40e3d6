//! Interview Orchestrator: drives the session lifecycle.
//!
//! States: `Setup` → `Active { session }`. Completion is not a separate state:
//! an active session whose last turn is the evaluation is `completed` and
//! accepts no further answers.
//!
//! Flow per turn: validate → append candidate turn → policy + proxy call →
//! append interviewer turn (or error notice) → update counters.
//!
//! The store lock is never held across the completion call. While a call is in
//! flight for a session, further submissions for it are rejected.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::evaluation::{parse_evaluation, Evaluation};
use crate::interview::transcript::TranscriptStore;
use crate::interview::turn::{next_interviewer_reply, ReplyKind};
use crate::llm_client::CompletionProxy;
use crate::models::interview::{validate_role, Level, Session, SessionSummary, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Active { session_id: Uuid },
}

/// Snapshot for `GET /interview/state`.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorStatus {
    pub phase: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_session_id: Option<Uuid>,
    pub awaiting_reply: bool,
    pub question_limit: u32,
}

/// A session as shown to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: Session,
    pub awaiting_reply: bool,
    pub evaluation: Option<Evaluation>,
}

struct Inner {
    store: Box<dyn TranscriptStore>,
    phase: Phase,
    in_flight: HashSet<Uuid>,
}

impl Inner {
    fn view(&self, session_id: Uuid) -> Result<SessionView, AppError> {
        let session = self.store.session(session_id)?;
        let evaluation = session
            .transcript
            .iter()
            .rev()
            .find_map(|turn| parse_evaluation(&turn.text));
        Ok(SessionView {
            awaiting_reply: self.in_flight.contains(&session_id),
            evaluation,
            session,
        })
    }
}

/// Marks a session busy until released. Dropping it (e.g. the request future was
/// cancelled) also releases the session.
struct InFlight<'a> {
    inner: &'a Mutex<Inner>,
    session_id: Uuid,
    released: bool,
}

impl InFlight<'_> {
    fn release(mut self, inner: &mut Inner) {
        inner.in_flight.remove(&self.session_id);
        self.released = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.released {
            lock(self.inner).in_flight.remove(&self.session_id);
        }
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct InterviewOrchestrator {
    proxy: Arc<dyn CompletionProxy>,
    question_limit: u32,
    inner: Mutex<Inner>,
}

impl InterviewOrchestrator {
    pub fn new(
        proxy: Arc<dyn CompletionProxy>,
        store: Box<dyn TranscriptStore>,
        question_limit: u32,
    ) -> Self {
        Self {
            proxy,
            question_limit,
            inner: Mutex::new(Inner {
                store,
                phase: Phase::Setup,
                in_flight: HashSet::new(),
            }),
        }
    }

    pub fn phase(&self) -> Phase {
        lock(&self.inner).phase
    }

    pub fn status(&self) -> OrchestratorStatus {
        let inner = lock(&self.inner);
        match inner.phase {
            Phase::Setup => OrchestratorStatus {
                phase: "setup",
                active_session_id: None,
                awaiting_reply: false,
                question_limit: self.question_limit,
            },
            Phase::Active { session_id } => OrchestratorStatus {
                phase: "active",
                active_session_id: Some(session_id),
                awaiting_reply: inner.in_flight.contains(&session_id),
                question_limit: self.question_limit,
            },
        }
    }

    /// History summaries, most-recent-first.
    pub fn history(&self) -> Vec<SessionSummary> {
        lock(&self.inner).store.list_sessions()
    }

    pub fn session(&self, session_id: Uuid) -> Result<SessionView, AppError> {
        lock(&self.inner).view(session_id)
    }

    /// Setup → Active: creates the session and asks for the opening question.
    pub async fn start(&self, role: &str, level: Level) -> Result<SessionView, AppError> {
        let role = validate_role(role)?;

        let (session, ticket) = {
            let mut inner = lock(&self.inner);
            let session = inner.store.create_session(role, level);
            inner.phase = Phase::Active {
                session_id: session.id,
            };
            inner.in_flight.insert(session.id);
            let ticket = InFlight {
                inner: &self.inner,
                session_id: session.id,
                released: false,
            };
            (session, ticket)
        };

        info!(
            "Started interview {} for {} ({})",
            session.id, session.role, session.level
        );
        self.run_turn(session, ticket).await
    }

    /// Active → Active: records the candidate's answer and asks for the next message.
    pub async fn submit(&self, text: &str) -> Result<SessionView, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("answer cannot be empty".to_string()));
        }

        let (session, ticket) = {
            let mut inner = lock(&self.inner);
            let Phase::Active { session_id } = inner.phase else {
                return Err(AppError::Conflict(
                    "No active interview. Start one first.".to_string(),
                ));
            };
            if inner.in_flight.contains(&session_id) {
                return Err(AppError::Conflict(
                    "Still waiting for the interviewer's reply".to_string(),
                ));
            }
            if inner.store.session(session_id)?.completed {
                return Err(AppError::Conflict(
                    "This interview is complete. Start a new one to continue practising."
                        .to_string(),
                ));
            }

            inner.store.append(session_id, Turn::candidate(text))?;
            let session = inner.store.session(session_id)?;
            // Nothing fallible after this point: dropping the ticket takes the lock.
            inner.in_flight.insert(session_id);
            let ticket = InFlight {
                inner: &self.inner,
                session_id,
                released: false,
            };
            (session, ticket)
        };

        self.run_turn(session, ticket).await
    }

    /// Active → Setup. The current session stays in history.
    pub fn reset(&self) {
        lock(&self.inner).phase = Phase::Setup;
    }

    /// Makes a history session the active one. Selecting the same session twice
    /// yields the same view.
    pub fn select(&self, session_id: Uuid) -> Result<SessionView, AppError> {
        let mut inner = lock(&self.inner);
        let view = inner.view(session_id)?;
        inner.phase = Phase::Active { session_id };
        info!("Selected interview {session_id}");
        Ok(view)
    }

    async fn run_turn(
        &self,
        session: Session,
        ticket: InFlight<'_>,
    ) -> Result<SessionView, AppError> {
        let outcome = next_interviewer_reply(
            self.proxy.as_ref(),
            &session.role,
            session.level,
            &session.transcript,
            session.questions_asked,
            self.question_limit,
        )
        .await;

        let mut inner = lock(&self.inner);
        ticket.release(&mut inner);

        match outcome {
            Ok(reply) => {
                inner
                    .store
                    .append(session.id, Turn::interviewer(reply.text))?;
                match reply.kind {
                    ReplyKind::Question => inner.store.record_question(session.id)?,
                    ReplyKind::Evaluation => {
                        inner.store.mark_completed(session.id)?;
                        info!(
                            "Interview {} completed after {} questions",
                            session.id, session.questions_asked
                        );
                    }
                    ReplyKind::Fallback => {}
                }
            }
            Err(err) => {
                warn!("Interviewer turn failed for session {}: {err}", session.id);
                inner.store.append(session.id, Turn::error_notice())?;
            }
        }

        inner.view(session.id)
    }
}
