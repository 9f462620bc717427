//! Axum route handler for the analysis endpoint.
//!
//! Request lifecycle: read form (file name checked from the part headers,
//! before the body is read) → validate description → check size → validate
//! and extract the PDF → analyze → respond. Each step exits early on failure,
//! so no extraction or provider cost is paid for bad input.

use anyhow::Context;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use tracing::{debug, info};

use crate::analysis::models::{
    AnalysisResponse, MAX_JOB_DESCRIPTION_CHARS, MIN_JOB_DESCRIPTION_CHARS,
};
use crate::config::Config;
use crate::document::{extract_text, validate_pdf, DocumentError};
use crate::errors::AppError;
use crate::state::AppState;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// The two fields of the upload form.
#[derive(Debug)]
pub struct AnalysisForm {
    pub file_name: String,
    pub cv_bytes: Bytes,
    pub job_description: String,
}

/// POST /api/analyze
///
/// Multipart form with `cv_file` (PDF) and `job_description` (text).
pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    let config = &state.config;
    let form = read_analysis_form(&mut multipart, config).await?;

    validate_job_description(&form.job_description)?;
    let size_mb = check_upload_size(form.cv_bytes.len(), config.max_file_size_mb)?;
    info!("Processing CV: {} ({size_mb:.2}MB)", form.file_name);

    let cv_text = extract_cv_text(form.cv_bytes).await?;

    let analysis = state
        .analysis
        .analyze_resume(&cv_text, &form.job_description)
        .await?;

    info!("Successfully analyzed CV with score: {}", analysis.score);
    Ok(Json(analysis))
}

async fn read_analysis_form(
    multipart: &mut Multipart,
    config: &Config,
) -> Result<AnalysisForm, AppError> {
    let max_file_size_mb = config.max_file_size_mb;
    let to_app_error = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::InvalidInput(format!(
                "File size exceeds maximum limit of {max_file_size_mb}MB"
            ))
        } else {
            AppError::InvalidInput(format!("Malformed upload: {}", e.body_text()))
        }
    };

    let mut cv_file: Option<(String, Bytes)> = None;
    let mut job_description: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(to_app_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "cv_file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                validate_file_name(&file_name, &config.allowed_extensions)?;
                let bytes = field.bytes().await.map_err(to_app_error)?;
                cv_file = Some((file_name, bytes));
            }
            "job_description" => {
                job_description = Some(field.text().await.map_err(to_app_error)?);
            }
            other => debug!("Ignoring unexpected form field '{other}'"),
        }
    }

    let (file_name, cv_bytes) =
        cv_file.ok_or_else(|| AppError::InvalidInput("cv_file is required".to_string()))?;
    let job_description = job_description
        .ok_or_else(|| AppError::InvalidInput("job_description is required".to_string()))?;

    Ok(AnalysisForm {
        file_name,
        cv_bytes,
        job_description,
    })
}

/// The file name must end in one of the allowed extensions, ignoring case.
pub fn validate_file_name(file_name: &str, allowed_extensions: &[String]) -> Result<(), AppError> {
    let lower = file_name.to_lowercase();
    let allowed = allowed_extensions
        .iter()
        .any(|ext| lower.ends_with(&format!(".{}", ext.to_lowercase())));

    if allowed {
        return Ok(());
    }

    let formats = allowed_extensions
        .iter()
        .map(|ext| ext.to_uppercase())
        .collect::<Vec<_>>()
        .join(", ");
    Err(AppError::InvalidInput(format!(
        "Only {formats} files are supported"
    )))
}

pub fn validate_job_description(job_description: &str) -> Result<(), AppError> {
    let length = job_description.trim().chars().count();
    if length < MIN_JOB_DESCRIPTION_CHARS {
        return Err(AppError::InvalidInput(format!(
            "Job description must be at least {MIN_JOB_DESCRIPTION_CHARS} characters"
        )));
    }
    if length > MAX_JOB_DESCRIPTION_CHARS {
        return Err(AppError::InvalidInput(format!(
            "Job description must be at most {MAX_JOB_DESCRIPTION_CHARS} characters"
        )));
    }
    Ok(())
}

/// Returns the upload size in MB, or an error when it exceeds the limit.
pub fn check_upload_size(len: usize, max_file_size_mb: u64) -> Result<f64, AppError> {
    let size_mb = len as f64 / BYTES_PER_MB;
    if size_mb > max_file_size_mb as f64 {
        return Err(AppError::InvalidInput(format!(
            "File size exceeds maximum limit of {max_file_size_mb}MB"
        )));
    }
    Ok(size_mb)
}

/// Validates and extracts the PDF on the blocking pool.
async fn extract_cv_text(cv_bytes: Bytes) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || {
        if !validate_pdf(&cv_bytes) {
            return Err(DocumentError::Corrupted);
        }
        extract_text(&cv_bytes)
    })
    .await
    .context("PDF extraction task failed")??;

    Ok(text)
}
