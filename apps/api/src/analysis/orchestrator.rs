//! Analysis Orchestrator — runs one upload through the whole pipeline.
//!
//! Flow: extract → build prompt → invoke model → recover → validate →
//!       attach metadata.
//!
//! Extraction failures are surfaced to the caller and the model is never
//! invoked. Anything that goes wrong after extraction (model unreachable,
//! unparseable output, schema violation) is logged and replaced by the
//! fallback result, so a readable document always yields an `AnalysisResult`.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::models::{fallback_result, AnalysisMetadata, AnalysisResult};
use crate::analysis::prompts::build_prompt;
use crate::analysis::recovery::recover_structured_result;
use crate::analysis::validation::validate;
use crate::config::ModelSettings;
use crate::extract::{extract_text, DocumentFormat, ExtractionError, UploadedDocument};
use crate::llm_client::{invoke_model, GeminiClient, LlmError, ModelClient, ModelOutcome};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("unsupported document type: {0}")]
    UnsupportedFormat(String),

    #[error("{format} document could not be read: {source}")]
    UnreadableDocument {
        format: DocumentFormat,
        source: ExtractionError,
    },

    #[error("model service unavailable: {0}")]
    ServiceUnavailable(#[source] LlmError),

    #[error("model returned an invalid result ({field})")]
    InvalidResult { field: &'static str },

    #[error("analysis cancelled")]
    Cancelled,
}

impl AnalysisError {
    /// Text safe to show to the person who uploaded the file.
    pub fn user_message(&self) -> &'static str {
        match self {
            AnalysisError::UnsupportedFormat(_) => {
                "Unsupported file type. Please upload a PDF or DOCX resume."
            }
            AnalysisError::UnreadableDocument { source, format } => match (source, format) {
                (ExtractionError::EmptyContent { chars: 0 }, _) => {
                    "No text found in file. This looks like a scanned image; we need a text-based resume (not a photo)."
                }
                (ExtractionError::EmptyContent { .. }, _) => {
                    "This resume seems too short. Did you upload the complete file?"
                }
                (_, DocumentFormat::Pdf) => {
                    "We couldn't read your PDF. Is it password-protected or corrupted?"
                }
                (_, DocumentFormat::Docx) => {
                    "We couldn't read your DOCX file. Try saving it as a PDF instead?"
                }
            },
            AnalysisError::ServiceUnavailable(_) | AnalysisError::InvalidResult { .. } => {
                "Our AI is taking a coffee break. Try again in a moment?"
            }
            AnalysisError::Cancelled => "The analysis was cancelled before it finished.",
        }
    }
}

/// Runs resume analyses. Holds no mutable state; share it behind an `Arc`.
#[derive(Clone)]
pub struct Analyzer {
    model: Arc<dyn ModelClient>,
}

impl Analyzer {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }

    /// Builds an analyzer backed by the hosted model described by `settings`.
    pub fn from_settings(settings: &ModelSettings) -> Result<Self, LlmError> {
        Ok(Self::new(Arc::new(GeminiClient::new(settings)?)))
    }

    pub fn model(&self) -> &dyn ModelClient {
        self.model.as_ref()
    }

    /// Analyzes one uploaded resume.
    ///
    /// Only `UnsupportedFormat`, `UnreadableDocument` and `Cancelled` are ever
    /// returned; model-side failures resolve to the fallback result.
    #[tracing::instrument(
        name = "analyze",
        skip_all,
        fields(
            analysis_id = %Uuid::new_v4(),
            file_name = %document.name,
            file_size = document.size(),
            media_type = %document.media_type,
        )
    )]
    pub async fn analyze(
        &self,
        document: &UploadedDocument,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, AnalysisError> {
        let started = Instant::now();
        info!(
            event = "upload_start",
            file_type = %document.media_type,
            file_size = document.size(),
            "Starting resume analysis"
        );

        match self.run(document, cancel, started).await {
            Ok(result) => {
                let processing_ms = started.elapsed().as_millis() as u64;
                info!(
                    event = "upload_complete",
                    processing_time_ms = processing_ms,
                    ats_score = result.ats_score.score,
                    fixes = result.fixes.len(),
                    "Analysis complete"
                );
                Ok(result)
            }
            Err(e) => {
                warn!(event = "analysis_failed", error = %e, "Resume analysis failed");
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        document: &UploadedDocument,
        cancel: &CancellationToken,
        started: Instant,
    ) -> Result<AnalysisResult, AnalysisError> {
        let format = document
            .format()
            .ok_or_else(|| AnalysisError::UnsupportedFormat(document.media_type.clone()))?;

        let extracted = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
            extracted = extract_text(document, cancel) => extracted,
        };
        let text = extracted.map_err(|e| match e {
            ExtractionError::Cancelled => AnalysisError::Cancelled,
            ExtractionError::UnsupportedType(media_type) => AnalysisError::UnsupportedFormat(media_type),
            source => AnalysisError::UnreadableDocument { format, source },
        })?;
        info!(chars = text.char_count(), format = %format, "Text extracted");

        let prompt = build_prompt(&text);
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
            outcome = invoke_model(self.model.as_ref(), prompt.as_str()) => outcome,
        };

        let mut result = match interpret(outcome) {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    model = self.model.model_name(),
                    error = %e,
                    "Serving fallback result"
                );
                fallback_result()
            }
        };

        result.metadata = Some(AnalysisMetadata {
            file_name: document.name.clone(),
            file_size: document.size(),
            file_type: format,
            analyzed_at: Utc::now(),
            processing_time: started.elapsed().as_millis() as u64,
        });
        Ok(result)
    }
}

/// Turns whatever the model produced into a validated result, or the reason
/// it could not be used.
fn interpret(outcome: ModelOutcome) -> Result<AnalysisResult, AnalysisError> {
    let raw = match outcome {
        ModelOutcome::Output(raw) => raw,
        ModelOutcome::Unavailable(e) => return Err(AnalysisError::ServiceUnavailable(e)),
    };
    let candidate =
        recover_structured_result(&raw).map_err(|_| AnalysisError::InvalidResult { field: "response" })?;
    validate(candidate).map_err(|e| AnalysisError::InvalidResult { field: e.field() })
}
