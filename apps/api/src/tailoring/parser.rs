//! AI Response Parser: recovers `{ tailoredResume, coverLetter, atsScore }`
//! from a free-text completion.
//!
//! The model is told to answer with a JSON object but nothing guarantees it.
//! Recovery is an ordered list of strategies, each tried only if the previous
//! one produced nothing:
//!
//! 1. `json_object`: strip code fences, take the span from the first `{` to the
//!    last `}` and parse it as JSON.
//! 2. `field_salvage`: pull each of the three fields out of the text with
//!    targeted patterns. All three must be found.
//!
//! When every strategy fails the caller gets a [`ParseError`] holding at most
//! [`RAW_PREFIX_LIMIT`] characters of the raw text, for the server log only.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub const RAW_PREFIX_LIMIT: usize = 500;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedAiOutput {
    pub tailored_resume: String,
    pub cover_letter: String,
    pub ats_score: i32,
}

#[derive(Debug, Clone, Error)]
#[error("could not recover tailoredResume/coverLetter/atsScore from AI output")]
pub struct ParseError {
    /// First characters of the raw completion. Server-side diagnostics only.
    pub raw_prefix: String,
}

impl ParseError {
    pub fn new(raw: &str) -> Self {
        Self {
            raw_prefix: raw.chars().take(RAW_PREFIX_LIMIT).collect(),
        }
    }
}

type Strategy = fn(&str) -> Option<ParsedAiOutput>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("json_object", parse_json_object),
    ("field_salvage", salvage_fields),
];

/// Runs the recovery strategies in order and returns the first success.
pub fn parse_ai_output(raw: &str) -> Result<ParsedAiOutput, ParseError> {
    let cleaned = strip_code_fences(raw);

    for (name, strategy) in STRATEGIES {
        if let Some(parsed) = strategy(cleaned) {
            debug!("AI output recovered with strategy '{name}'");
            return Ok(parsed);
        }
        debug!("AI output strategy '{name}' found nothing");
    }

    warn!(
        "AI output could not be parsed ({} chars)",
        raw.chars().count()
    );
    Err(ParseError::new(raw))
}

/// Strips a leading ```` ```lang ```` marker and a trailing ```` ``` ```` marker, then trims.
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // Drop an optional language tag on the fence line.
        let tag_len = rest
            .find(|c: char| c.is_whitespace())
            .filter(|&i| rest[..i].chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or(0);
        text = rest[tag_len..].trim_start();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

// ────────────────────────────────────────────────────────────────────────────
// Strategy 1: structured JSON
// ────────────────────────────────────────────────────────────────────────────

fn parse_json_object(text: &str) -> Option<ParsedAiOutput> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }

    let value: Value = match serde_json::from_str(&text[start..=end]) {
        Ok(v) => v,
        Err(e) => {
            debug!("AI output is not valid JSON: {e}");
            return None;
        }
    };
    let object = value.as_object()?;

    // An object that carries neither document is not an answer to our prompt.
    if !object.contains_key("tailoredResume") && !object.contains_key("coverLetter") {
        return None;
    }

    Some(ParsedAiOutput {
        tailored_resume: string_field(object.get("tailoredResume")),
        cover_letter: string_field(object.get("coverLetter")),
        ats_score: object.get("atsScore").map(score_field).unwrap_or(0),
    })
}

fn string_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn score_field(value: &Value) -> i32 {
    let raw = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    clamp_score(raw.round() as i64)
}

fn clamp_score(score: i64) -> i32 {
    score.clamp(0, 100) as i32
}

// ────────────────────────────────────────────────────────────────────────────
// Strategy 2: per-field salvage
// ────────────────────────────────────────────────────────────────────────────

static RESUME_FIELD: LazyLock<Regex> = LazyLock::new(|| string_field_pattern("tailoredResume"));
static COVER_LETTER_FIELD: LazyLock<Regex> = LazyLock::new(|| string_field_pattern("coverLetter"));
static SCORE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""atsScore"\s*:\s*"?(\d+)"#).expect("score pattern is valid")
});

/// `"key": "<value>"` where the value may contain escaped quotes and raw newlines.
fn string_field_pattern(key: &str) -> Regex {
    Regex::new(&format!(r#""{key}"\s*:\s*"((?:[^"\\]|\\.)*)""#)).expect("field pattern is valid")
}

fn salvage_fields(text: &str) -> Option<ParsedAiOutput> {
    let tailored_resume = RESUME_FIELD.captures(text)?.get(1)?.as_str();
    let cover_letter = COVER_LETTER_FIELD.captures(text)?.get(1)?.as_str();
    let score = SCORE_FIELD.captures(text)?.get(1)?.as_str();

    Some(ParsedAiOutput {
        tailored_resume: unescape_json_string(tailored_resume),
        cover_letter: unescape_json_string(cover_letter),
        ats_score: clamp_score(score.parse::<i64>().unwrap_or(0)),
    })
}

/// Decodes a JSON string body. Bodies a JSON parser rejects (raw control
/// characters, stray backslashes) get the common escapes decoded by hand.
fn unescape_json_string(body: &str) -> String {
    if let Ok(s) = serde_json::from_str::<String>(&format!("\"{body}\"")) {
        return s;
    }

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => {}
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
