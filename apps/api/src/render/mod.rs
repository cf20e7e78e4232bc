// Document rendering: template dispatch → paginated layout → PDF bytes.
// Layout and serialization are CPU-bound; handlers run them inside spawn_blocking.

pub mod font_metrics;
pub mod handlers;
pub mod page;
pub mod pdf;
pub mod templates;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use crate::render::page::{PageWriter, LETTER};
use crate::render::templates::{
    split_blocks, strategy_for, DocumentType, RenderHeader, StyleOverrides, TemplateId,
};
use crate::tailoring::header::UNTITLED;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF serialization failed: {0}")]
    Serialize(String),
}

/// Everything a template needs to lay out one document.
#[derive(Debug, Clone, Default)]
pub struct DocumentRenderRequest {
    pub title: String,
    pub content: String,
    pub template: TemplateId,
    pub document_type: DocumentType,
    pub contact: Option<String>,
    pub styles: StyleOverrides,
}

/// A rendered PDF. Download and preview are two encodings of the same bytes.
#[derive(Debug, Clone)]
pub struct DocumentArtifact {
    pub bytes: Bytes,
    pub page_count: usize,
}

impl DocumentArtifact {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// Lays out and serializes a document. A blank title becomes "Untitled";
/// blank content still yields a one-page PDF holding the header.
pub fn render_document(request: &DocumentRenderRequest) -> Result<DocumentArtifact, RenderError> {
    let strategy = strategy_for(request.template);
    let palette = strategy.default_palette().with_overrides(&request.styles);

    let title = match request.title.trim() {
        "" => UNTITLED,
        t => t,
    };
    let contact = request
        .contact
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let mut writer = PageWriter::new(LETTER);
    strategy.render_header(&mut writer, &RenderHeader { title, contact }, &palette);
    for block in split_blocks(&request.content) {
        strategy.render_section(&mut writer, &block, &palette, request.document_type);
    }

    let geometry = *writer.geometry();
    let pages = writer.finish();
    let bytes = pdf::encode_pdf(&pages, &geometry, title)?;

    debug!(
        "Rendered {} with template {} ({} pages, {} bytes)",
        request.document_type.as_str(),
        strategy.id().as_str(),
        pages.len(),
        bytes.len()
    );

    Ok(DocumentArtifact {
        bytes: Bytes::from(bytes),
        page_count: pages.len(),
    })
}
