//! Header Extractor: pulls a document title (the person's name) and a contact
//! line out of raw resume text.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Title used when the text has no non-empty line.
pub const UNTITLED: &str = "Untitled";

/// How many lines after the name are inspected for contact details.
const CONTACT_WINDOW: usize = 3;

static CONTACT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)email|phone|linkedin|location|@").expect("contact pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub contact: String,
}

/// Header plus the body that remains once the header lines are taken out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitDocument {
    pub header: Header,
    pub body: String,
}

/// Extracts `{ name, contact }` from resume text. Never fails.
pub fn extract_header(resume_text: &str) -> Header {
    split_header(resume_text).header
}

/// Like [`extract_header`], also returning the text with the name line and the
/// matched contact lines removed, so renderers don't print them twice.
pub fn split_header(resume_text: &str) -> SplitDocument {
    let lines: Vec<&str> = resume_text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let Some(name) = lines.first() else {
        return SplitDocument {
            header: Header {
                name: UNTITLED.to_string(),
                contact: String::new(),
            },
            body: String::new(),
        };
    };

    let contact_lines: Vec<&str> = lines
        .iter()
        .skip(1)
        .take(CONTACT_WINDOW)
        .copied()
        .filter(|l| CONTACT_PATTERN.is_match(l))
        .collect();

    // Remove the first occurrence of the name line and each contact line,
    // keeping blank-line structure of the rest intact.
    let mut pending: Vec<&str> = Vec::with_capacity(1 + contact_lines.len());
    pending.push(name);
    pending.extend(contact_lines.iter().copied());

    let mut body_lines = Vec::new();
    for raw in resume_text.lines() {
        let trimmed = raw.trim();
        if let Some(pos) = pending.iter().position(|p| *p == trimmed && !trimmed.is_empty()) {
            pending.remove(pos);
            continue;
        }
        body_lines.push(raw);
    }

    SplitDocument {
        header: Header {
            name: name.to_string(),
            contact: contact_lines.join(" | "),
        },
        body: body_lines.join("\n").trim().to_string(),
    }
}
