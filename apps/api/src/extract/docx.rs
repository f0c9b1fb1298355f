//! DOCX extraction — reads `word/document.xml` out of the OOXML package and
//! strips the WordprocessingML markup down to raw text.

use std::io::{Cursor, Read};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use zip::ZipArchive;

use crate::extract::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Field instructions and tracked deletions are markup, not visible text.
/// Self-closing elements end at their own `/>`.
static HIDDEN_RUNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:(?:instrText|delText)\b[^>]*?(?:/>|>.*?</w:(?:instrText|delText)>)")
        .expect("hidden run pattern")
});
static PARAGRAPH_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</w:p>").expect("paragraph end pattern"));
static TAB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<w:tab\b[^>]*/>").expect("tab pattern"));
static BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<w:(br|cr)\b[^>]*/>").expect("break pattern"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));
static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|lt|gt|quot|apos|amp);").expect("entity pattern")
});

pub fn extract(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Corrupt(format!("not a valid DOCX package: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractionError::Corrupt(format!("missing {DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Corrupt(format!("unreadable {DOCUMENT_PART}: {e}")))?;

    let text = xml_to_text(&xml);
    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractionError::EmptyContent { chars: 0 });
    }
    Ok(text.to_string())
}

/// Paragraphs become blank-line separated blocks; tabs and breaks survive as whitespace.
fn xml_to_text(xml: &str) -> String {
    let text = HIDDEN_RUNS.replace_all(xml, "");
    let text = PARAGRAPH_END.replace_all(&text, "\n\n");
    let text = TAB.replace_all(&text, "\t");
    let text = BREAK.replace_all(&text, "\n");
    let text = TAG.replace_all(&text, "");
    decode_entities(&text)
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let entity = &caps[1];
            let decoded = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                _ => entity
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .unwrap_or_else(|| entity[1..].parse::<u32>())
                    .ok()
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}
