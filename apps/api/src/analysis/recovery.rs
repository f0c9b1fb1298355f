//! Response Recoverer — gets a JSON object out of whatever the model sent back.
//!
//! Steps, first success wins:
//! 1. strip markdown fences (the prompt forbids them; models add them anyway)
//! 2. parse as-is
//! 3. cut everything after the last `}` and parse
//! 4. cut after the last `}` that closes an object outside a string literal,
//!    close whatever arrays/objects are still open, and parse
//!
//! Step 4 is what turns an output truncated mid-`fixes` into a shorter but
//! complete list.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::chain::{first_success, Attempt};
use crate::llm_client::RawModelOutput;

const LOG_HEAD_CHARS: usize = 500;
const LOG_TAIL_CHARS: usize = 200;

#[derive(Debug, Error)]
#[error("model output could not be parsed after {} attempts", .attempts.len())]
pub struct RecoveryFailure {
    /// Step name and parse error for each attempt, in order.
    pub attempts: Vec<(&'static str, String)>,
}

/// Recovers a JSON object candidate from raw model output.
pub fn recover_structured_result(raw: &RawModelOutput) -> Result<Value, RecoveryFailure> {
    let cleaned = strip_fences(raw.as_str());
    let steps: [(&str, Attempt<str, Value, String>); 3] = [
        ("direct", parse_direct),
        ("last_brace", parse_through_last_brace),
        ("close_open_brackets", parse_closing_open_brackets),
    ];

    first_success(cleaned, &steps).map_err(|attempts| {
        let text = raw.as_str();
        warn!(
            head = %head_chars(text, LOG_HEAD_CHARS),
            tail = %tail_chars(text, LOG_TAIL_CHARS),
            total_chars = text.chars().count(),
            "Model output could not be recovered as JSON"
        );
        for (step, err) in &attempts {
            debug!(step, error = %err, "Recovery step failed");
        }
        RecoveryFailure { attempts }
    })
}

/// Removes an opening ```` ``` ```` fence (with an optional language tag) and
/// a trailing closing fence.
pub fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    let rest = rest.trim_end();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_object(text: &str) -> Result<Value, String> {
    let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    if value.is_object() {
        Ok(value)
    } else {
        Err("top-level JSON value is not an object".to_string())
    }
}

fn parse_direct(text: &str) -> Result<Value, String> {
    parse_object(text)
}

fn parse_through_last_brace(text: &str) -> Result<Value, String> {
    let end = text.rfind('}').ok_or("no closing brace")?;
    parse_object(&text[..=end])
}

fn parse_closing_open_brackets(text: &str) -> Result<Value, String> {
    let start = text.find('{').ok_or("no opening brace")?;
    let body = &text[start..];

    let mut stack: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut last_close: Option<(usize, Vec<u8>)> = None;

    for (i, b) in body.bytes().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => stack.push(b),
            b'}' | b']' => {
                if stack.pop().is_none() {
                    break;
                }
                if b == b'}' {
                    last_close = Some((i, stack.clone()));
                }
                if stack.is_empty() {
                    break;
                }
            }
            _ => {}
        }
    }

    let (end, open) = last_close.ok_or("no complete object found")?;
    let mut repaired = body[..=end].to_string();
    for opener in open.iter().rev() {
        repaired.push(if *opener == b'{' { '}' } else { ']' });
    }
    parse_object(&repaired)
}

fn head_chars(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

fn tail_chars(text: &str, n: usize) -> String {
    let total = text.chars().count();
    text.chars().skip(total.saturating_sub(n)).collect()
}
