//! Text Extractor — turns an uploaded PDF or DOCX binary into plain text.
//!
//! Dispatch is by the *declared* media type only; the bytes are never sniffed.
//! Decoding is CPU-bound and runs inside `tokio::task::spawn_blocking`.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub mod docx;
pub mod pdf;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Anything shorter is almost always a scanned image or an encrypted file.
pub const MIN_TEXT_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported document type: {0}")]
    UnsupportedType(String),

    #[error("document contains too little text ({chars} characters)")]
    EmptyContent { chars: usize },

    #[error("document could not be decoded: {0}")]
    Corrupt(String),

    #[error("extraction cancelled")]
    Cancelled,
}

/// The closed set of formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Resolves a declared media type. Parameters (`; charset=...`) and case are ignored.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            PDF_MEDIA_TYPE => Some(DocumentFormat::Pdf),
            DOCX_MEDIA_TYPE => Some(DocumentFormat::Docx),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }

    /// Runs the extraction strategy bound to this format. Blocking.
    fn extract(self, bytes: &[u8], cancel: &CancellationToken) -> Result<String, ExtractionError> {
        match self {
            DocumentFormat::Pdf => pdf::extract(bytes, cancel),
            DocumentFormat::Docx => docx::extract(bytes),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document as handed over by the caller. The pipeline never mutates it.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub name: String,
    pub media_type: String,
    pub bytes: Bytes,
}

impl UploadedDocument {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn format(&self) -> Option<DocumentFormat> {
        DocumentFormat::from_media_type(&self.media_type)
    }
}

/// Plain text pulled out of a document. Always at least `MIN_TEXT_CHARS` long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    pub fn new(text: impl Into<String>) -> Result<Self, ExtractionError> {
        let text = text.into();
        let trimmed = text.trim();
        let chars = trimmed.chars().count();
        if chars < MIN_TEXT_CHARS {
            return Err(ExtractionError::EmptyContent { chars });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

/// Extracts text from `document` according to its declared format.
///
/// The token is checked between PDF tiers; the caller is expected to race the
/// returned future against the same token.
pub async fn extract_text(
    document: &UploadedDocument,
    cancel: &CancellationToken,
) -> Result<ExtractedText, ExtractionError> {
    let format = document
        .format()
        .ok_or_else(|| ExtractionError::UnsupportedType(document.media_type.clone()))?;

    let bytes = document.bytes.clone();
    let token = cancel.clone();
    let text = tokio::task::spawn_blocking(move || format.extract(&bytes, &token))
        .await
        .map_err(|e| ExtractionError::Corrupt(format!("extraction task failed: {e}")))??;

    ExtractedText::new(text)
}

/// Collapses every whitespace run to a single space and trims both ends.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Shared minimum-content gate applied by each extraction tier.
pub(crate) fn ensure_min_content(text: String) -> Result<String, ExtractionError> {
    let chars = text.chars().count();
    if chars < MIN_TEXT_CHARS {
        return Err(ExtractionError::EmptyContent { chars });
    }
    Ok(text)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Write;

    /// Hand-assembles a single-page PDF with one Helvetica text line per entry.
    pub fn minimal_pdf(lines: &[&str]) -> Vec<u8> {
        let operators: Vec<String> = lines.iter().map(|line| format!("({line}) Tj T*")).collect();
        single_page_pdf(&operators)
    }

    /// Same page as `minimal_pdf`, but every line is a hex string (`<48...> Tj`),
    /// so no `( ... )` literal exists anywhere in the file.
    pub fn hex_text_pdf(lines: &[&str]) -> Vec<u8> {
        let operators: Vec<String> = lines
            .iter()
            .map(|line| {
                let hex: String = line.bytes().map(|b| format!("{b:02X}")).collect();
                format!("<{hex}> Tj T*")
            })
            .collect();
        single_page_pdf(&operators)
    }

    fn single_page_pdf(operators: &[String]) -> Vec<u8> {
        let mut content = String::from("BT /F1 11 Tf 72 720 Td 14 TL\n");
        for operator in operators {
            content.push_str(operator);
            content.push('\n');
        }
        content.push_str("ET");

        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
                .to_string(),
            format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        ];

        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref_offset = out.len();
        out.extend_from_slice(
            format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes(),
        );
        for offset in offsets {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
                objects.len() + 1
            )
            .as_bytes(),
        );
        out
    }

    /// A byte stream with PDF-looking text operators but no object table, so
    /// only the raw literal scan can read it. Padded with comment lines.
    pub fn unparseable_pdf(literals: &[&str], pad_to: usize) -> Vec<u8> {
        let mut out = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
        out.extend_from_slice(b"BT /F1 11 Tf 72 720 Td\n");
        for literal in literals {
            out.extend_from_slice(format!("({literal}) Tj\n").as_bytes());
        }
        out.extend_from_slice(b"ET\n");
        while out.len() < pad_to {
            out.extend_from_slice(b"% padding padding padding padding padding padding padding\n");
        }
        out
    }

    /// Builds a DOCX package whose `word/document.xml` has the given body XML.
    pub fn docx_with_body(body_xml: &str) -> Vec<u8> {
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body_xml}</w:body></w:document>"#
        );
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::default();
        writer
            .start_file("[Content_Types].xml", options)
            .expect("start content types");
        writer
            .write_all(br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)
            .expect("write content types");
        writer
            .start_file("word/document.xml", options)
            .expect("start document");
        writer
            .write_all(document.as_bytes())
            .expect("write document");
        writer.finish().expect("finish zip").into_inner()
    }

    pub fn paragraph(text: &str) -> String {
        format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>")
    }
}
