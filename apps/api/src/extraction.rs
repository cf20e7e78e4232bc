//! Plain-text extraction from uploaded resume files.
//!
//! Supported: `.docx` (paragraph text from `word/document.xml`), `.pdf`
//! (via `pdf-extract`), `.txt` and `.md`. Extraction is CPU-bound; async
//! callers run it inside `tokio::task::spawn_blocking`.

use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),

    #[error("file contains no readable text")]
    Empty,

    #[error("invalid docx container: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("failed to read docx body: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf extraction failed: {0}")]
    Pdf(String),

    #[error("file text is not valid UTF-8")]
    Encoding,

    #[error("docx body inflates past {limit} bytes")]
    TooLarge { limit: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Docx,
    Pdf,
    PlainText,
}

fn file_kind(file_name: &str) -> Option<FileKind> {
    let ext = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    match ext.as_str() {
        "docx" => Some(FileKind::Docx),
        "pdf" => Some(FileKind::Pdf),
        "txt" | "md" => Some(FileKind::PlainText),
        _ => None,
    }
}

/// Extracts plain text from an uploaded file, dispatching on its extension.
pub fn extract_text(file_name: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
    let kind =
        file_kind(file_name).ok_or_else(|| ExtractionError::Unsupported(file_name.to_string()))?;

    let text = match kind {
        FileKind::Docx => extract_docx(bytes)?,
        FileKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractionError::Pdf(e.to_string()))?,
        FileKind::PlainText => String::from_utf8(bytes.to_vec())
            .map_err(|_| ExtractionError::Encoding)?
            .replace("\r\n", "\n"),
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(ExtractionError::Empty);
    }
    Ok(text)
}

// ────────────────────────────────────────────────────────────────────────────
// DOCX
// ────────────────────────────────────────────────────────────────────────────

const DOCX_BODY: &str = "word/document.xml";

/// Upper bound on the inflated size of `word/document.xml`.
pub const MAX_DOCX_BODY_BYTES: u64 = 32 * 1024 * 1024;

// Text runs, run-level tabs and breaks, and paragraph ends, in document order.
// `<w:tab .../>` with attributes is a tab-stop definition, not content.
static DOCX_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:tab/>|<w:br\b[^>]*/>|<w:cr/>|</w:p>")
        .expect("static regex")
});

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    extract_docx_limited(bytes, MAX_DOCX_BODY_BYTES)
}

fn extract_docx_limited(bytes: &[u8], limit: u64) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let body = archive.by_name(DOCX_BODY)?;
    if body.size() > limit {
        return Err(ExtractionError::TooLarge { limit });
    }

    // The declared size can lie; never inflate more than one byte past the limit.
    let mut xml = Vec::new();
    body.take(limit + 1).read_to_end(&mut xml)?;
    if xml.len() as u64 > limit {
        return Err(ExtractionError::TooLarge { limit });
    }
    let xml = String::from_utf8(xml).map_err(|_| ExtractionError::Encoding)?;
    Ok(docx_xml_to_text(&xml))
}

fn docx_xml_to_text(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len() / 4);
    for caps in DOCX_TOKEN.captures_iter(xml) {
        if let Some(run) = caps.get(1) {
            out.push_str(&decode_xml_entities(run.as_str()));
            continue;
        }
        match &caps[0] {
            "<w:tab/>" => out.push('\t'),
            _ => out.push('\n'),
        }
    }
    out
}

fn decode_xml_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
