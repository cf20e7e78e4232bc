//! Axum route handlers for PDF preview, download, and stored-job export.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::render::templates::{DocumentType, StyleOverrides, TemplateId};
use crate::render::{render_document, DocumentArtifact, DocumentRenderRequest};
use crate::state::AppState;
use crate::store::load_user;
use crate::tailoring::header::{extract_header, split_header};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "template")]
    pub template_id: Option<String>,
    #[serde(default)]
    pub document_type: DocumentType,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub styles: StyleOverrides,
}

impl RenderBody {
    /// A resume without an explicit title takes its name and contact lines
    /// from the top of the content.
    fn into_request(self) -> DocumentRenderRequest {
        let template = TemplateId::resolve(self.template_id.as_deref());
        let explicit_title = self.title.filter(|t| !t.trim().is_empty());

        let (title, contact, content) = match (explicit_title, self.document_type) {
            (Some(title), _) => (title, self.contact, self.content),
            (None, DocumentType::Resume) => {
                let split = split_header(&self.content);
                let contact = self
                    .contact
                    .or_else(|| Some(split.header.contact).filter(|c| !c.is_empty()));
                (split.header.name, contact, split.body)
            }
            (None, DocumentType::CoverLetter) => (String::new(), self.contact, self.content),
        };

        DocumentRenderRequest {
            title,
            content,
            template,
            document_type: self.document_type,
            contact,
            styles: self.styles,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub pdf_base64: String,
    pub page_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct JobPdfQuery {
    #[serde(default)]
    pub document: DocumentType,
    #[serde(default)]
    pub template: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TemplateInfo {
    pub id: TemplateId,
    pub name: &'static str,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/templates
pub async fn handle_list_templates() -> Json<Vec<TemplateInfo>> {
    Json(
        TemplateId::ALL
            .iter()
            .map(|&id| TemplateInfo {
                id,
                name: id.display_name(),
            })
            .collect(),
    )
}

/// POST /api/v1/render/preview
///
/// Same PDF as the download endpoint, base64-encoded for inline display.
pub async fn handle_render_preview(
    Json(body): Json<RenderBody>,
) -> Result<Json<PreviewResponse>, AppError> {
    let artifact = render_blocking(body.into_request()).await?;
    Ok(Json(PreviewResponse {
        pdf_base64: artifact.to_base64(),
        page_count: artifact.page_count,
    }))
}

/// POST /api/v1/render/download
pub async fn handle_render_download(Json(body): Json<RenderBody>) -> Result<Response, AppError> {
    let request = body.into_request();
    let file_name = file_name(request.document_type, request.template);
    let artifact = render_blocking(request).await?;
    Ok(pdf_attachment(artifact, &file_name))
}

/// GET /api/v1/jobs/:id/pdf?document=resume|coverLetter&template=<id>
///
/// Renders the stored tailored text of an owned job.
pub async fn handle_job_pdf(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(job_id): Path<Uuid>,
    Query(query): Query<JobPdfQuery>,
) -> Result<Response, AppError> {
    let user = load_user(state.store.as_ref(), &identity, state.config.monthly_credits).await?;
    let job = state
        .store
        .find_job(job_id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let stored = match query.document {
        DocumentType::Resume => job.tailored_resume,
        DocumentType::CoverLetter => job.cover_letter,
    }
    .ok_or_else(|| AppError::NotFound(format!("Job {job_id} has not been tailored yet")))?;

    let original = extract_header(&job.original_resume);
    let (title, contact, content) = match query.document {
        DocumentType::Resume => {
            let split = split_header(&stored);
            let contact = if split.header.contact.is_empty() {
                original.contact
            } else {
                split.header.contact
            };
            (split.header.name, contact, split.body)
        }
        // Cover letters carry the applicant's own header.
        DocumentType::CoverLetter => (original.name, original.contact, stored),
    };

    let request = DocumentRenderRequest {
        title,
        content,
        template: TemplateId::resolve(query.template.as_deref()),
        document_type: query.document,
        contact: Some(contact),
        styles: StyleOverrides::default(),
    };
    let file_name = file_name(request.document_type, request.template);
    let artifact = render_blocking(request).await?;
    Ok(pdf_attachment(artifact, &file_name))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Layout and serialization are CPU-bound; keep them off the async executor.
pub async fn render_blocking(request: DocumentRenderRequest) -> Result<DocumentArtifact, AppError> {
    let artifact = tokio::task::spawn_blocking(move || render_document(&request))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in render: {e}")))??;
    Ok(artifact)
}

fn file_name(document_type: DocumentType, template: TemplateId) -> String {
    format!("{}-{}.pdf", document_type.as_str(), template.as_str())
}

fn pdf_attachment(artifact: DocumentArtifact, file_name: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        artifact.bytes,
    )
        .into_response()
}
