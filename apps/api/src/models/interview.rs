use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Text of the turn appended when the completion service could not produce a reply.
/// Kept in the transcript so the user sees the failure, never sent back upstream.
pub const ERROR_TURN_TEXT: &str =
    "[error] The interviewer could not respond right now. Please send your answer again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Candidate,
    Interviewer,
}

impl FromStr for Speaker {
    type Err = AppError;

    /// Fails closed: anything but the two known speakers is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "candidate" => Ok(Speaker::Candidate),
            "interviewer" => Ok(Speaker::Interviewer),
            other => Err(AppError::Validation(format!(
                "Unknown speaker '{other}' (expected 'candidate' or 'interviewer')"
            ))),
        }
    }
}

/// One utterance. Immutable once created; position in the transcript is its order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn candidate(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Candidate,
            text: text.into(),
        }
    }

    pub fn interviewer(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Interviewer,
            text: text.into(),
        }
    }

    pub fn error_notice() -> Self {
        Self::interviewer(ERROR_TURN_TEXT)
    }

    pub fn is_error_notice(&self) -> bool {
        self.speaker == Speaker::Interviewer && self.text == ERROR_TURN_TEXT
    }
}

/// Seniority levels offered at setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Intern,
    Fresher,
    Junior,
    #[serde(rename = "Mid-level")]
    MidLevel,
    Senior,
    Lead,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::Intern,
        Level::Fresher,
        Level::Junior,
        Level::MidLevel,
        Level::Senior,
        Level::Lead,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Intern => "Intern",
            Level::Fresher => "Fresher",
            Level::Junior => "Junior",
            Level::MidLevel => "Mid-level",
            Level::Senior => "Senior",
            Level::Lead => "Lead",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let allowed = Level::ALL
                    .iter()
                    .map(Level::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                AppError::Validation(format!(
                    "Unknown level '{wanted}' (expected one of: {allowed})"
                ))
            })
    }
}

const MAX_ROLE_CHARS: usize = 120;

/// Trims a free-form role title and rejects empty or oversized ones.
pub fn validate_role(role: &str) -> Result<String, AppError> {
    let role = role.trim();
    if role.is_empty() {
        return Err(AppError::Validation("role cannot be empty".to_string()));
    }
    if role.chars().count() > MAX_ROLE_CHARS {
        return Err(AppError::Validation(format!(
            "role must be at most {MAX_ROLE_CHARS} characters"
        )));
    }
    Ok(role.to_string())
}

/// One interview attempt. `role` and `level` never change after creation.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub role: String,
    pub level: Level,
    pub started_at: DateTime<Utc>,
    pub transcript: Vec<Turn>,
    /// Interviewer questions successfully delivered so far.
    pub questions_asked: u32,
    /// Set once the evaluation turn has been appended.
    pub completed: bool,
}

impl Session {
    pub fn new(role: String, level: Level) -> Self {
        Self {
            id: Uuid::now_v7(),
            role,
            level,
            started_at: Utc::now(),
            transcript: Vec::new(),
            questions_asked: 0,
            completed: false,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            role: self.role.clone(),
            level: self.level,
            started_at: self.started_at,
            turn_count: self.transcript.len(),
            questions_asked: self.questions_asked,
            completed: self.completed,
        }
    }
}

/// Sidebar entry for the history list.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub role: String,
    pub level: Level,
    pub started_at: DateTime<Utc>,
    pub turn_count: usize,
    pub questions_asked: u32,
    pub completed: bool,
}
