use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::analysis::models::AnalysisResult;
use crate::errors::AppError;
use crate::extract::{DocumentFormat, UploadedDocument};
use crate::state::AppState;

/// Multipart part that carries the resume.
const FILE_FIELD: &str = "file";
const ANONYMOUS_CALLER: &str = "anonymous";

/// POST /api/v1/analyze
///
/// Upload policy runs before the pipeline: a `file` part must be present and
/// non-empty, declare PDF or DOCX, fit under `MAX_UPLOAD_BYTES`, and the quota
/// policy must allow the caller. Dropping the request cancels the analysis.
pub async fn handle_analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<AnalysisResult>, AppError> {
    let document = read_upload(multipart, state.config.max_upload_bytes).await?;

    let caller = caller_key(&headers);
    state
        .quota
        .check(&caller)
        .await
        .map_err(|_| {
            AppError::RateLimited(
                "Whoa, slow down! You've hit the upload limit. Try again later.".to_string(),
            )
        })?;

    info!(
        file_name = %document.name,
        file_size = document.size(),
        "Accepted resume upload"
    );

    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();
    let result = state.analyzer.analyze(&document, &cancel).await?;
    Ok(Json(result))
}

async fn read_upload(mut multipart: Multipart, max_bytes: usize) -> Result<UploadedDocument, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let name = field.file_name().unwrap_or("resume").to_string();
        let media_type = field.content_type().unwrap_or_default().to_string();
        if DocumentFormat::from_media_type(&media_type).is_none() {
            return Err(AppError::UnsupportedMediaType(
                "Unsupported file type. Please upload a PDF or DOCX resume.".to_string(),
            ));
        }

        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            return Err(AppError::Validation("The uploaded file is empty.".to_string()));
        }
        if bytes.len() > max_bytes {
            return Err(too_large(max_bytes));
        }

        return Ok(UploadedDocument::new(name, media_type, bytes));
    }

    Err(AppError::Validation(format!(
        "No file uploaded. Send the resume as the multipart '{FILE_FIELD}' field."
    )))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("File is too large.".to_string())
    } else {
        AppError::Validation(err.body_text())
    }
}

fn too_large(max_bytes: usize) -> AppError {
    AppError::PayloadTooLarge(format!(
        "File is too large. Maximum size is {:.0}MB.",
        max_bytes as f64 / (1024.0 * 1024.0)
    ))
}

/// First hop of `X-Forwarded-For`, else a shared anonymous bucket.
fn caller_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(ANONYMOUS_CALLER)
        .to_string()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_caller_key_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("198.51.100.4, 10.0.0.1"),
        );
        assert_eq!(caller_key(&headers), "198.51.100.4");
    }

    #[test]
    fn test_caller_key_defaults_to_anonymous() {
        assert_eq!(caller_key(&HeaderMap::new()), "anonymous");
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" "));
        assert_eq!(caller_key(&headers), "anonymous");
    }

    #[test]
    fn test_too_large_message_uses_megabytes() {
        let err = too_large(5 * 1024 * 1024);
        assert!(matches!(err, AppError::PayloadTooLarge(ref m) if m.ends_with("5MB.")));
    }
}
