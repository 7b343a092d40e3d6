//! Evaluation detection and parsing.
//!
//! An evaluation is the sentinel-delimited assessment that closes an interview.
//! The sentinels are a wire contract with the presentation layer and are never altered.

use serde::Serialize;

use crate::interview::prompts::{
    EVALUATION_END, EVALUATION_START, SECTION_IMPROVEMENTS, SECTION_STRENGTHS,
    SECTION_SUGGESTIONS, SECTION_SUMMARY,
};

/// The four labeled sections of an evaluation. Missing sections are left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub strengths: String,
    pub improvements: String,
    pub suggestions: String,
    pub summary: String,
    /// Whether the closing sentinel was present.
    pub closed: bool,
}

impl Evaluation {
    pub fn is_complete(&self) -> bool {
        self.closed
            && !self.strengths.is_empty()
            && !self.improvements.is_empty()
            && !self.suggestions.is_empty()
            && !self.summary.is_empty()
    }
}

#[derive(Clone, Copy)]
enum Section {
    Strengths,
    Improvements,
    Suggestions,
    Summary,
}

const LABELS: [(&str, Section); 4] = [
    (SECTION_STRENGTHS, Section::Strengths),
    (SECTION_IMPROVEMENTS, Section::Improvements),
    (SECTION_SUGGESTIONS, Section::Suggestions),
    (SECTION_SUMMARY, Section::Summary),
];

pub fn is_evaluation(text: &str) -> bool {
    text.contains(EVALUATION_START)
}

/// Returns the evaluation framed by exactly one pair of sentinels, with the
/// start sentinel first and the end sentinel last. Text outside the framed span
/// (greetings, sign-offs) is dropped; a missing end sentinel is appended.
pub fn ensure_delimited(text: &str) -> String {
    let Some(start) = text.find(EVALUATION_START) else {
        return format!(
            "{EVALUATION_START}\n{}\n{EVALUATION_END}",
            text.replace(EVALUATION_END, "").trim()
        );
    };

    let body = &text[start + EVALUATION_START.len()..];
    let body = match body.find(EVALUATION_END) {
        Some(end) => &body[..end],
        None => body,
    };
    format!("{EVALUATION_START}\n{}\n{EVALUATION_END}", body.trim())
}

/// Parses the evaluation out of an interviewer message.
/// Returns `None` when the text carries no start sentinel.
pub fn parse_evaluation(text: &str) -> Option<Evaluation> {
    let start = text.find(EVALUATION_START)?;
    let body = &text[start + EVALUATION_START.len()..];
    let (body, closed) = match body.find(EVALUATION_END) {
        Some(end) => (&body[..end], true),
        None => (body, false),
    };

    let mut evaluation = Evaluation {
        closed,
        ..Evaluation::default()
    };
    let mut current: Option<Section> = None;

    for line in body.lines() {
        let cleaned = strip_decoration(line);
        if cleaned.is_empty() {
            continue;
        }

        if let Some((section, rest)) = match_label(cleaned) {
            current = Some(section);
            push_text(section_mut(&mut evaluation, section), rest);
        } else if let Some(section) = current {
            push_text(section_mut(&mut evaluation, section), cleaned);
        }
    }

    Some(evaluation)
}

fn section_mut(evaluation: &mut Evaluation, section: Section) -> &mut String {
    match section {
        Section::Strengths => &mut evaluation.strengths,
        Section::Improvements => &mut evaluation.improvements,
        Section::Suggestions => &mut evaluation.suggestions,
        Section::Summary => &mut evaluation.summary,
    }
}

fn push_text(target: &mut String, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if !target.is_empty() {
        target.push('\n');
    }
    target.push_str(text);
}

/// Strips list bullets, heading hashes and markdown emphasis around a line.
fn strip_decoration(line: &str) -> &str {
    line.trim()
        .trim_start_matches(['-', '*', '•', '#'])
        .trim_start()
        .trim_start_matches("**")
}

/// Matches `Label:` (case-insensitive, tolerating `**Label:**`) at the start of a line.
fn match_label(line: &str) -> Option<(Section, &str)> {
    for (label, section) in LABELS {
        let Some(head) = line.get(..label.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(label) {
            continue;
        }
        let rest = line[label.len()..].trim_start_matches("**").trim_start();
        if let Some(rest) = rest.strip_prefix(':') {
            return Some((section, rest.trim_start_matches("**")));
        }
    }
    None
}
