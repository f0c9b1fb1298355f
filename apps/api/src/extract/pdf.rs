//! PDF extraction — two tiers composed as a fallback chain.
//!
//! 1. `pdf-extract` walks the page tree and returns text per page.
//! 2. If that fails (error, panic, or too little text), the raw bytes are
//!    scanned for `( ... )` string literals from the content streams.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::LazyLock;

use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::chain::{first_success, Attempt};
use crate::extract::{collapse_whitespace, ensure_min_content, ExtractionError};

/// Literal strings never span a line in practice; the match is lazy so
/// adjacent literals on one line stay separate.
static STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((.*?)\)").expect("string literal pattern"));

/// Spans with this share (or more) of unusual characters are treated as binary noise.
const MAX_SPECIAL_RATIO: f64 = 0.3;

const BASIC_PUNCTUATION: &str = ".,!?@#$%&*()_+-=[]{};':\"\\|<>/";

struct PdfInput<'a> {
    bytes: &'a [u8],
    cancel: &'a CancellationToken,
}

pub fn extract(bytes: &[u8], cancel: &CancellationToken) -> Result<String, ExtractionError> {
    let input = PdfInput { bytes, cancel };
    let tiers: [(&str, Attempt<PdfInput<'_>, String, ExtractionError>); 2] = [
        ("page_parser", extract_by_pages),
        ("literal_scan", extract_literal_strings),
    ];

    first_success(&input, &tiers).map_err(|failures| {
        for (tier, err) in &failures {
            debug!(tier, error = %err, "PDF extraction tier failed");
        }
        failures
            .into_iter()
            .last()
            .map(|(_, err)| err)
            .unwrap_or_else(|| ExtractionError::Corrupt("no extraction tier ran".to_string()))
    })
}

fn extract_by_pages(input: &PdfInput<'_>) -> Result<String, ExtractionError> {
    let bytes = input.bytes;
    let pages = catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }))
    .map_err(|_| ExtractionError::Corrupt("PDF parser panicked".to_string()))?
    .map_err(|e| ExtractionError::Corrupt(format!("failed to parse PDF: {e}")))?;

    debug!(page_count = pages.len(), "PDF page tree parsed");

    let joined = pages
        .iter()
        .map(|page| collapse_whitespace(page))
        .collect::<Vec<_>>()
        .join("\n\n");

    let text = ensure_min_content(collapse_whitespace(&joined));
    if let Err(e) = &text {
        warn!(error = %e, "PDF text layer is too thin, trying raw literal scan");
    }
    text
}

fn extract_literal_strings(input: &PdfInput<'_>) -> Result<String, ExtractionError> {
    if input.cancel.is_cancelled() {
        return Err(ExtractionError::Cancelled);
    }

    let raw = String::from_utf8_lossy(input.bytes);
    let spans: Vec<String> = STRING_LITERAL
        .captures_iter(&raw)
        .filter_map(|caps| caps.get(1))
        .map(|m| unescape_literal(m.as_str()))
        .filter(|span| looks_like_text(span))
        .collect();

    debug!(span_count = spans.len(), "Raw literal scan finished");
    ensure_min_content(collapse_whitespace(&spans.join(" ")))
}

/// Applied in sequence, so `\\n` decodes as a newline rather than `\n` text.
fn unescape_literal(span: &str) -> String {
    span.replace("\\n", "\n")
        .replace("\\r", "\r")
        .replace("\\t", "\t")
        .replace("\\(", "(")
        .replace("\\)", ")")
        .replace("\\\\", "\\")
}

fn looks_like_text(span: &str) -> bool {
    let total = span.chars().count();
    if total <= 1 || !span.chars().any(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    let special = span.chars().filter(|c| !is_basic_char(*c)).count();
    (special as f64 / total as f64) < MAX_SPECIAL_RATIO
}

fn is_basic_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace() || BASIC_PUNCTUATION.contains(c)
}
