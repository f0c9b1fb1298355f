use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::extract::DocumentFormat;

/// Categories the model is asked to choose from when tagging a fix.
pub const FIX_CATEGORIES: &[&str] = &[
    "Summary",
    "Experience",
    "Skills",
    "Education",
    "Formatting",
    "Keywords",
    "Impact",
    "Clarity",
    "Grammar",
    "Length",
];

/// Category reserved for the fallback result.
pub const SYSTEM_CATEGORY: &str = "System";

/// The critique handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub ats_score: AtsScore,
    pub roast: Roast,
    pub fixes: Vec<Fix>,
    /// Attached by the orchestrator, never by the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AnalysisMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtsScore {
    /// 0 – 100 after validation.
    pub score: i64,
    #[serde(default, deserialize_with = "lenient_breakdown")]
    pub breakdown: ScoreBreakdown,
}

/// Sub-scores as reported by the model. Not range-checked and not required to
/// add up to the overall score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    #[serde(default, deserialize_with = "lenient_score")]
    pub formatting: i64,
    #[serde(default, deserialize_with = "lenient_score")]
    pub keywords: i64,
    #[serde(default, deserialize_with = "lenient_score")]
    pub impact: i64,
    #[serde(default, deserialize_with = "lenient_score")]
    pub clarity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roast {
    pub savage: String,
    pub mild: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub category: String,
    pub issue: String,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub file_name: String,
    pub file_size: u64,
    pub file_type: DocumentFormat,
    pub analyzed_at: DateTime<Utc>,
    /// Milliseconds from the start of `analyze` to metadata attachment.
    pub processing_time: u64,
}

/// Models sometimes emit `72.5` or `"70"` where an integer is expected.
/// Anything that is not a number or a numeric string counts as 0.
fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let score = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(score.filter(|f| f.is_finite()).map_or(0, |f| f.round() as i64))
}

/// A `null` or non-object breakdown becomes all zeros.
fn lenient_breakdown<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<ScoreBreakdown, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(ScoreBreakdown::default());
    }
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// The fixed result served whenever the model or its output cannot be used.
/// Valid by construction, so it skips validation.
pub fn fallback_result() -> AnalysisResult {
    AnalysisResult {
        ats_score: AtsScore {
            score: 50,
            breakdown: ScoreBreakdown {
                formatting: 60,
                keywords: 45,
                impact: 40,
                clarity: 55,
            },
        },
        roast: Roast {
            savage: "Hmm, our AI is taking a coffee break. But based on what we can see, \
                     your resume could use some work. Try uploading again!"
                .to_string(),
            mild: "We're having trouble analyzing your resume right now. \
                   Please try again in a moment."
                .to_string(),
        },
        fixes: vec![Fix {
            category: SYSTEM_CATEGORY.to_string(),
            issue: "Analysis temporarily unavailable".to_string(),
            before: "Unable to analyze at this time".to_string(),
            after: "Please try uploading your resume again".to_string(),
        }],
        metadata: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_result_shape() {
        let fallback = fallback_result();
        assert_eq!(fallback.ats_score.score, 50);
        assert_eq!(
            fallback.ats_score.breakdown,
            ScoreBreakdown {
                formatting: 60,
                keywords: 45,
                impact: 40,
                clarity: 55
            }
        );
        assert!(!fallback.roast.savage.is_empty());
        assert!(!fallback.roast.mild.is_empty());
        assert_eq!(fallback.fixes.len(), 1);
        assert_eq!(fallback.fixes[0].category, "System");
        assert!(fallback.metadata.is_none());
    }

    #[test]
    fn test_serializes_with_camel_case_keys() {
        let mut result = fallback_result();
        result.metadata = Some(AnalysisMetadata {
            file_name: "cv.pdf".to_string(),
            file_size: 2048,
            file_type: DocumentFormat::Pdf,
            analyzed_at: "2026-03-01T12:00:00Z".parse().unwrap(),
            processing_time: 1234,
        });
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["atsScore"]["score"], 50);
        assert_eq!(value["atsScore"]["breakdown"]["clarity"], 55);
        assert_eq!(value["roast"]["mild"], result.roast.mild.as_str());
        assert_eq!(value["fixes"][0]["after"], "Please try uploading your resume again");
        assert_eq!(value["metadata"]["fileName"], "cv.pdf");
        assert_eq!(value["metadata"]["fileType"], "pdf");
        assert_eq!(value["metadata"]["analyzedAt"], "2026-03-01T12:00:00Z");
        assert_eq!(value["metadata"]["processingTime"], 1234);
    }

    #[test]
    fn test_metadata_omitted_when_absent() {
        let value = serde_json::to_value(fallback_result()).unwrap();
        assert!(value.get("metadata").is_none());
    }

    #[test]
    fn test_breakdown_is_lenient() {
        let breakdown: ScoreBreakdown =
            serde_json::from_str(r#"{"formatting": 72.6, "keywords": 140}"#).unwrap();
        assert_eq!(breakdown.formatting, 73);
        assert_eq!(breakdown.keywords, 140);
        assert_eq!(breakdown.impact, 0);
        assert_eq!(breakdown.clarity, 0);
    }

    #[test]
    fn test_breakdown_accepts_strings_and_junk() {
        let breakdown: ScoreBreakdown = serde_json::from_str(
            r#"{"formatting": "70", "keywords": " 64.5 ", "impact": "high", "clarity": null}"#,
        )
        .unwrap();
        assert_eq!(breakdown.formatting, 70);
        assert_eq!(breakdown.keywords, 65);
        assert_eq!(breakdown.impact, 0);
        assert_eq!(breakdown.clarity, 0);
    }

    #[test]
    fn test_null_or_scalar_breakdown_defaults() {
        for breakdown in ["null", "\"n/a\"", "[1, 2]"] {
            let score: AtsScore =
                serde_json::from_str(&format!(r#"{{"score": 61, "breakdown": {breakdown}}}"#)).unwrap();
            assert_eq!(score.breakdown, ScoreBreakdown::default(), "{breakdown}");
        }
    }
}
