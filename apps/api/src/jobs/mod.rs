// Jobs: a job description paired with the resume it should be tailored against.
// Created from JSON or from a multipart upload whose file is run through extraction.

pub mod handlers;

use axum::extract::Multipart;
use bytes::Bytes;
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::extraction::extract_text;
use crate::models::job::NewJob;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub resume_text: String,
}

impl CreateJobRequest {
    /// Both texts must be non-blank.
    pub fn validate(self) -> Result<NewJob, AppError> {
        if self.job_description.trim().is_empty() {
            return Err(AppError::Validation(
                "jobDescription cannot be empty".to_string(),
            ));
        }
        if self.resume_text.trim().is_empty() {
            return Err(AppError::Validation("resumeText cannot be empty".to_string()));
        }
        Ok(NewJob {
            job_description: self.job_description,
            original_resume: self.resume_text,
        })
    }
}

/// Reads a multipart job submission: a `jobDescription` text field and either
/// a `file` (.docx, .pdf, .txt, .md) or a `resumeText` field. A file wins.
pub async fn read_upload(mut multipart: Multipart) -> Result<NewJob, AppError> {
    let mut job_description = String::new();
    let mut resume_text = String::new();
    let mut file: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("jobDescription") => job_description = field_text(field).await?,
            Some("resumeText") => resume_text = field_text(field).await?,
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
                file = Some((file_name, data));
            }
            _ => {}
        }
    }

    if let Some((file_name, data)) = file {
        info!("Extracting resume text from {} ({} bytes)", file_name, data.len());
        resume_text = extract_blocking(file_name, data).await?;
    }

    CreateJobRequest {
        job_description,
        resume_text,
    }
    .validate()
}

async fn field_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart field: {e}")))
}

/// Extraction is CPU-bound; keep it off the async executor.
async fn extract_blocking(file_name: String, data: Bytes) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || extract_text(&file_name, &data))
        .await
        .map_err(|e| {
            AppError::Internal(anyhow::anyhow!("spawn_blocking failed in extraction: {e}"))
        })??;
    Ok(text)
}
