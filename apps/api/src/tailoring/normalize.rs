//! Text Normalizer: formatting pass over tailored resume and cover-letter text.
//!
//! Normalization only touches bullet markers and whitespace (plus header casing
//! for resumes). It never reorders lines or drops other content.
//!
//! Bullet stripping for resumes is skipped for every line after the last
//! skills marker: the skills line is a comma-separated list and a leading
//! `-` or `*` there is content, not formatting. The marker position is found
//! once, then lines are processed in a single pass.

use std::sync::LazyLock;

use regex::Regex;

/// Section names that are upper-cased when they make up a whole line.
pub const SECTION_HEADERS: &[&str] = &[
    "professional summary",
    "summary",
    "skills",
    "experience",
    "education",
    "certifications",
    "projects",
    "contact",
];

const SKILLS_MARKER: &str = "SKILLS";

/// Leading bullet markers (`*`, `•`, `-`, `–`), repeated, with surrounding blanks.
/// "Blank" is the same class `INLINE_WHITESPACE` collapses, NBSP included.
static LEADING_BULLETS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\S\n]*(?:[*•\-–][^\S\n]*)+").expect("bullet pattern is valid")
});

/// Horizontal whitespace runs (anything whitespace except a newline).
static INLINE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+").expect("whitespace pattern is valid"));

/// Normalizes tailored resume text. Idempotent.
pub fn normalize_resume_text(text: &str) -> String {
    let text = unescape_newlines(text);
    let lines: Vec<&str> = text.split('\n').collect();
    let skills_line = last_skills_marker(&lines);

    let cleaned: Vec<String> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let keep_bullets = skills_line.is_some_and(|s| i > s);
            let line = if keep_bullets {
                *line
            } else {
                strip_bullet(line)
            };
            tidy_whitespace(line)
        })
        .collect();

    collapse_blank_lines(&cleaned)
        .trim()
        .split('\n')
        .map(uppercase_header)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Normalizes cover-letter text: bullets always stripped, blank-line runs
/// collapsed, outer whitespace trimmed. No header casing.
pub fn normalize_cover_letter_text(text: &str) -> String {
    let text = unescape_newlines(text);
    let cleaned: Vec<String> = text
        .split('\n')
        .map(|line| strip_bullet(line).trim_end().to_string())
        .collect();

    collapse_blank_lines(&cleaned).trim().to_string()
}

fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n").replace("\r\n", "\n")
}

/// Index of the last line that marks the skills section: a line containing
/// `SKILLS`, or a line that bullet stripping plus header casing will turn into
/// `SKILLS`. Counting the latter keeps the pass idempotent.
fn last_skills_marker(lines: &[&str]) -> Option<usize> {
    lines.iter().rposition(|l| {
        l.contains(SKILLS_MARKER) || strip_bullet(l).trim().eq_ignore_ascii_case("skills")
    })
}

fn strip_bullet(line: &str) -> &str {
    match LEADING_BULLETS.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

fn tidy_whitespace(line: &str) -> String {
    INLINE_WHITESPACE
        .replace_all(line, " ")
        .trim_end()
        .to_string()
}

/// Joins lines, letting at most one empty line stand between paragraphs.
fn collapse_blank_lines(lines: &[String]) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    let mut blank_run = 0usize;
    for line in lines {
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push(line);
    }
    out.join("\n")
}

fn uppercase_header(line: &str) -> String {
    let trimmed = line.trim();
    let lower = trimmed.to_lowercase();
    if SECTION_HEADERS.contains(&lower.as_str()) {
        trimmed.to_uppercase()
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skills_line_left_untouched() {
        let input = "JOHN SMITH\\n\\nSKILLS\\nPython, Go, SQL";
        let out = normalize_resume_text(input);
        assert_eq!(out, "JOHN SMITH\n\nSKILLS\nPython, Go, SQL");
    }

    #[test]
    fn test_bullets_stripped_before_skills_kept_after() {
        let input = "EXPERIENCE\n- Built APIs\n• Led team\n* Shipped\n– Mentored\n\nSKILLS\n- Rust, Go\n* Kubernetes";
        let out = normalize_resume_text(input);
        assert_eq!(
            out,
            "EXPERIENCE\nBuilt APIs\nLed team\nShipped\nMentored\n\nSKILLS\n- Rust, Go\n* Kubernetes"
        );
    }

    #[test]
    fn test_last_skills_occurrence_wins() {
        let input = "SKILLS\n- a\nTECHNICAL SKILLS\n- b";
        let out = normalize_resume_text(input);
        assert_eq!(out, "SKILLS\na\nTECHNICAL SKILLS\n- b");
    }

    #[test]
    fn test_no_skills_header_strips_everything() {
        let out = normalize_resume_text("- one\n- two");
        assert_eq!(out, "one\ntwo");
    }

    #[test]
    fn test_blank_runs_collapse_to_one_empty_line() {
        let out = normalize_resume_text("A\n\n\n\n\nB\n \n\t\n\nC");
        assert_eq!(out, "A\n\nB\n\nC");
    }

    #[test]
    fn test_inline_whitespace_collapsed_and_trailing_removed() {
        let out = normalize_resume_text("Senior   Engineer\t\tat  Acme   \nNext");
        assert_eq!(out, "Senior Engineer at Acme\nNext");
    }

    #[test]
    fn test_section_headers_uppercased() {
        let out = normalize_resume_text(
            "Jane\n\nProfessional Summary\nText\n\n  experience \nAcme\n\nEducation\nMIT\n\nSkills are great",
        );
        assert_eq!(
            out,
            "Jane\n\nPROFESSIONAL SUMMARY\nText\n\nEXPERIENCE\nAcme\n\nEDUCATION\nMIT\n\nSkills are great"
        );
    }

    #[test]
    fn test_lowercase_skills_header_protects_following_bullets() {
        let out = normalize_resume_text("skills\n- Rust");
        assert_eq!(out, "SKILLS\n- Rust");
    }

    #[test]
    fn test_resume_normalization_is_idempotent() {
        let inputs = [
            "JOHN SMITH\\n\\nSKILLS\\nPython, Go, SQL",
            "SKILLS\n- a\nskills",
            "  - - nested bullet\n\n\n\n  experience\n*   item   with   gaps   \n",
            "a\n \n \nb",
            "-\n\n\n- x\n summary \nSKILLS\n  • kept  bullet  ",
            "",
            "\\\\n weird escapes \\n here",
            "\u{a0}- ",
            "\u{a0}\t– skills",
            "\u{2003}• Led team\nSKILLS\n\u{a0}- Rust",
        ];
        for input in inputs {
            let once = normalize_resume_text(input);
            let twice = normalize_resume_text(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_non_ascii_blanks_before_bullets_are_stripped() {
        assert_eq!(normalize_resume_text("\u{a0}- Built APIs"), "Built APIs");
        assert_eq!(normalize_resume_text("\u{a0}\t– skills\n- Rust"), "SKILLS\n- Rust");
    }

    #[test]
    fn test_idempotent_over_token_combinations() {
        const TOKENS: &[&str] = &[
            "\u{a0}", " ", "\t", "-", "–", "•", "*", "skills", "Summary", "x", "\n", "\\n",
        ];
        // Every sequence of up to three tokens.
        let mut level = vec![String::new()];
        let mut inputs = Vec::new();
        for _ in 0..3 {
            level = level
                .iter()
                .flat_map(|prefix| TOKENS.iter().map(move |t| format!("{prefix}{t}")))
                .collect();
            inputs.extend(level.iter().cloned());
        }
        for input in &inputs {
            let once = normalize_resume_text(input);
            assert_eq!(once, normalize_resume_text(&once), "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_content_order_preserved() {
        let input = "C\n- B\nA";
        assert_eq!(normalize_resume_text(input), "C\nB\nA");
    }

    #[test]
    fn test_cover_letter_strips_all_bullets_and_keeps_case() {
        let input = "Dear Hiring Manager,\n\n\n\nSkills\n- I know Rust\n• and Go\n\nSincerely,\nJane  ";
        let out = normalize_cover_letter_text(input);
        assert_eq!(
            out,
            "Dear Hiring Manager,\n\nSkills\nI know Rust\nand Go\n\nSincerely,\nJane"
        );
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert_eq!(normalize_resume_text(""), "");
        assert_eq!(normalize_cover_letter_text("   \n\n  "), "");
    }
}
