//! Dialogue policy: the instruction text that conditions the interviewer's next message.
//!
//! The policy is derived, never stored: a pure function of role, level and where the
//! transcript stands against the question limit. The stage is decided locally, so the
//! evaluation is triggered by our own count rather than the model's.

use crate::interview::evaluation::is_evaluation;
use crate::interview::prompts::{
    EVALUATION_DIRECTIVE_TEMPLATE, EVALUATION_END, EVALUATION_FORMAT_TEMPLATE, EVALUATION_START,
    FALLBACK_REPLY, FOLLOW_UP_DIRECTIVE_TEMPLATE, INTERVIEWER_SYSTEM_TEMPLATE,
    OPENING_DIRECTIVE_TEMPLATE,
    SECTION_IMPROVEMENTS, SECTION_STRENGTHS, SECTION_SUGGESTIONS, SECTION_SUMMARY,
};
use crate::models::interview::{Level, Speaker, Turn};

/// Where the interview stands when the next interviewer message is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewStage {
    /// Nothing said yet: greet and ask question 1.
    Opening { limit: u32 },
    /// Ask question `next` (1-based) of `limit`.
    FollowUp { next: u32, limit: u32 },
    /// Question budget spent: write the evaluation.
    Evaluation { limit: u32 },
}

impl InterviewStage {
    /// `transcript` is the outbound transcript (error notices already removed).
    pub fn determine(transcript: &[Turn], questions_asked: u32, limit: u32) -> Self {
        if transcript.is_empty() {
            InterviewStage::Opening { limit }
        } else if questions_asked >= limit {
            InterviewStage::Evaluation { limit }
        } else {
            InterviewStage::FollowUp {
                next: questions_asked + 1,
                limit,
            }
        }
    }

    pub fn is_evaluation(&self) -> bool {
        matches!(self, InterviewStage::Evaluation { .. })
    }
}

/// Counts the interviewer questions present in a client-supplied transcript.
/// Error notices, fallback replies and evaluations are not questions.
pub fn count_questions(transcript: &[Turn]) -> u32 {
    transcript
        .iter()
        .filter(|t| t.speaker == Speaker::Interviewer)
        .filter(|t| !t.is_error_notice() && t.text != FALLBACK_REPLY)
        .filter(|t| !is_evaluation(&t.text))
        .count() as u32
}

/// Builds the full instruction for the given stage.
pub fn build_instruction(role: &str, level: Level, stage: InterviewStage) -> String {
    let limit = match stage {
        InterviewStage::Opening { limit }
        | InterviewStage::FollowUp { limit, .. }
        | InterviewStage::Evaluation { limit } => limit,
    };

    let evaluation_format = EVALUATION_FORMAT_TEMPLATE
        .replace("{start}", EVALUATION_START)
        .replace("{end}", EVALUATION_END)
        .replace("{strengths}", SECTION_STRENGTHS)
        .replace("{improvements}", SECTION_IMPROVEMENTS)
        .replace("{suggestions}", SECTION_SUGGESTIONS)
        .replace("{summary}", SECTION_SUMMARY);

    // The role is free text: substitute it last so its braces stay literal.
    let system = INTERVIEWER_SYSTEM_TEMPLATE
        .replace("{evaluation_format}", &evaluation_format)
        .replace("{level}", level.as_str())
        .replace("{limit}", &limit.to_string())
        .replace("{role}", role);

    let directive = match stage {
        InterviewStage::Opening { .. } => OPENING_DIRECTIVE_TEMPLATE
            .replace("{level}", level.as_str())
            .replace("{role}", role),
        InterviewStage::FollowUp { next, limit } => FOLLOW_UP_DIRECTIVE_TEMPLATE
            .replace("{next}", &next.to_string())
            .replace("{limit}", &limit.to_string()),
        InterviewStage::Evaluation { limit } => {
            EVALUATION_DIRECTIVE_TEMPLATE.replace("{limit}", &limit.to_string())
        }
    };

    format!("{system}\n\n{directive}")
}
