use serde_json::Value;
use thiserror::Error;

use crate::analysis::models::AnalysisResult;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("missing or invalid field: {field}")]
    Missing { field: &'static str },

    #[error("result does not match the expected shape: {0}")]
    Malformed(String),
}

impl SchemaError {
    /// Dotted path of the offending field, or `"result"` for shape errors.
    pub fn field(&self) -> &'static str {
        match self {
            SchemaError::Missing { field } => field,
            SchemaError::Malformed(_) => "result",
        }
    }
}

/// Enforces the result schema and normalizes the top-level score.
///
/// Checks run in a fixed order: `atsScore.score` is a number, `roast.savage`
/// and `roast.mild` are non-blank strings, `fixes` is a non-empty array. The
/// score is then rounded and clamped to 0..=100. Breakdown values pass through
/// unclamped and tolerant of junk. Any `metadata` the model invented is
/// discarded before the typed conversion, whatever its shape.
pub fn validate(mut value: Value) -> Result<AnalysisResult, SchemaError> {
    let score = value
        .pointer("/atsScore/score")
        .and_then(Value::as_f64)
        .ok_or(SchemaError::Missing { field: "atsScore.score" })?;

    for (pointer, field) in [("/roast/savage", "roast.savage"), ("/roast/mild", "roast.mild")] {
        let present = value
            .pointer(pointer)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.trim().is_empty());
        if !present {
            return Err(SchemaError::Missing { field });
        }
    }

    let has_fixes = value
        .get("fixes")
        .and_then(Value::as_array)
        .is_some_and(|fixes| !fixes.is_empty());
    if !has_fixes {
        return Err(SchemaError::Missing { field: "fixes" });
    }

    if let Some(slot) = value.pointer_mut("/atsScore/score") {
        *slot = Value::from(clamp_score(score));
    }

    if let Some(object) = value.as_object_mut() {
        object.remove("metadata");
    }

    serde_json::from_value(value).map_err(|e| SchemaError::Malformed(e.to_string()))
}

fn clamp_score(score: f64) -> i64 {
    score.round().clamp(0.0, 100.0) as i64
}
