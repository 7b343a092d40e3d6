//! Produces the next interviewer message for a transcript.
//!
//! Shared by the session orchestrator and the stateless turn endpoint so both
//! apply the same stage rules and evaluation framing.

use tracing::warn;

use crate::interview::evaluation::{ensure_delimited, is_evaluation};
use crate::interview::policy::InterviewStage;
use crate::interview::prompts::FALLBACK_REPLY;
use crate::llm_client::{CompletionProxy, CompletionRequest, LlmError};
use crate::models::interview::{Level, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// A regular interviewer question.
    Question,
    /// The sentinel-delimited evaluation that ends the interview.
    Evaluation,
    /// The service answered without text.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewerReply {
    pub text: String,
    pub kind: ReplyKind,
}

/// Transcript as sent upstream: error notices are dropped, everything else kept in order.
pub fn outbound_transcript(transcript: &[Turn]) -> Vec<Turn> {
    transcript
        .iter()
        .filter(|turn| !turn.is_error_notice())
        .cloned()
        .collect()
}

/// Asks the proxy for the next interviewer message.
///
/// Once `questions_asked` reaches `question_limit` the reply is always framed as an
/// evaluation, whether or not the model used the sentinels itself.
pub async fn next_interviewer_reply(
    proxy: &dyn CompletionProxy,
    role: &str,
    level: Level,
    transcript: &[Turn],
    questions_asked: u32,
    question_limit: u32,
) -> Result<InterviewerReply, LlmError> {
    let outbound = outbound_transcript(transcript);
    let stage = InterviewStage::determine(&outbound, questions_asked, question_limit);

    let text = proxy
        .complete(CompletionRequest {
            role,
            level,
            stage,
            transcript: &outbound,
        })
        .await?;

    if text == FALLBACK_REPLY {
        return Ok(InterviewerReply {
            text,
            kind: ReplyKind::Fallback,
        });
    }

    if stage.is_evaluation() || is_evaluation(&text) {
        if !stage.is_evaluation() {
            warn!(
                "Evaluation emitted after {} of {} questions",
                questions_asked, question_limit
            );
        }
        return Ok(InterviewerReply {
            text: ensure_delimited(&text),
            kind: ReplyKind::Evaluation,
        });
    }

    Ok(InterviewerReply {
        text,
        kind: ReplyKind::Question,
    })
}
