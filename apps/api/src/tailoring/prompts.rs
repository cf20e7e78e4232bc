// Prompt constants for resume tailoring.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_FABRICATION_INSTRUCTION};

/// System prompt for tailoring: an expert writer constrained to JSON output.
pub const TAILOR_SYSTEM: &str = "You are an expert resume writer and career coach \
    who tailors resumes and cover letters to specific job descriptions \
    and estimates how well they would score in applicant tracking systems.";

/// Tailoring prompt template.
/// Replace: {no_fabrication}, {job_description}, {resume}
pub const TAILOR_PROMPT_TEMPLATE: &str = r#"{no_fabrication}

Rewrite the resume below so it targets the job description, then write a matching cover letter,
then estimate the ATS (applicant tracking system) match score of the rewritten resume.

Return a JSON object with this EXACT schema:
{
  "tailoredResume": "the full tailored resume as plain text",
  "coverLetter": "the full cover letter as plain text",
  "atsScore": 85
}

FORMATTING RULES for tailoredResume:
1. First line: the candidate's full name. Next line: contact details (email | phone | LinkedIn | location)
2. Section headers on their own line in UPPERCASE: PROFESSIONAL SUMMARY, EXPERIENCE, EDUCATION, SKILLS, CERTIFICATIONS, PROJECTS
3. Separate sections with one blank line
4. Experience entries as short achievement lines, one per line, no bullet characters
5. SKILLS is a single comma-separated line
6. Use \n for line breaks inside JSON strings

FORMATTING RULES for coverLetter:
1. Plain paragraphs separated by one blank line, no bullet characters
2. Open with "Dear Hiring Manager," unless the job description names a contact
3. At most 4 paragraphs

atsScore is an integer from 0 to 100.

JOB DESCRIPTION:
{job_description}

ORIGINAL RESUME:
{resume}"#;

/// Builds the single tailoring prompt. Inputs are embedded verbatim.
pub fn build_tailor_prompt(job_description: &str, resume: &str) -> String {
    fill_template(
        TAILOR_PROMPT_TEMPLATE,
        &[
            ("no_fabrication", NO_FABRICATION_INSTRUCTION),
            ("job_description", job_description.trim()),
            ("resume", resume.trim()),
        ],
    )
}

/// Substitutes `{key}` placeholders in one pass over the template, so braces
/// inside substituted user text are never treated as placeholders.
fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let placeholder = vars.iter().find(|(key, _)| {
            tail.strip_prefix(key)
                .is_some_and(|after| after.starts_with('}'))
        });
        match placeholder {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Full system prompt: role description plus the JSON-only contract.
pub fn tailor_system() -> String {
    format!("{TAILOR_SYSTEM} {JSON_ONLY_SYSTEM}")
}
