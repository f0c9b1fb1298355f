// Resume analysis prompt templates.
// All prompts for the analysis module are defined here.

use crate::analysis::models::FIX_CATEGORIES;
use crate::extract::ExtractedText;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

pub const ANALYSIS_SYSTEM: &str = r#"You are a brutal but helpful resume critic and ATS (Applicant Tracking System) expert. Your job is to analyze resumes and provide honest, actionable feedback.

You must return your response in valid JSON format with this exact structure:
{
  "atsScore": {
    "score": <number 0-100>,
    "breakdown": {
      "formatting": <number 0-100>,
      "keywords": <number 0-100>,
      "impact": <number 0-100>,
      "clarity": <number 0-100>
    }
  },
  "roast": {
    "savage": "<string>",
    "mild": "<string>"
  },
  "fixes": [
    {
      "category": "<string>",
      "issue": "<string>",
      "before": "<string>",
      "after": "<string>"
    }
  ]
}"#;

/// Analysis task template. Replace: {resume_text}, {categories}
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze this resume and provide a comprehensive evaluation:

RESUME TEXT:
{resume_text}

ANALYSIS REQUIREMENTS:

1. ATS SCORE (0-100):
   - Formatting (25 points): Layout, structure, readability, ATS-friendly format
   - Keywords (25 points): Industry-specific terms, job-relevant skills, action verbs
   - Impact (25 points): Quantifiable achievements, metrics, results
   - Clarity (25 points): Clear communication, no jargon, easy to understand

2. ROAST (Two versions - KEEP CONCISE):

   SAVAGE VERSION (2-3 SHORT paragraphs max):
   - Be funny, sarcastic, and brutally honest
   - Point out clichés like "hardworking," "team player," "go-getter"
   - Mock weak action verbs like "responsible for," "helped with"
   - Call out missing metrics and vague statements
   - Example: "Your summary says 'hardworking.' So does literally everyone. You used 'responsible for' 6 times. HR fell asleep by the second one."

   MILD VERSION (2-3 SHORT paragraphs max):
   - Professional and constructive
   - Point out the same issues but nicely
   - Encouraging but honest
   - Example: "Your resume has some good points, but there's definitely room for improvement. Your summary could be more specific about your achievements."

3. FIXES (5-7 specific issues ONLY):
   - Identify the MOST impactful problems
   - Provide concrete before/after examples (KEEP SHORT - max 50 chars each)
   - Categorize each fix as exactly one of: {categories}
   - Prioritize by impact on ATS score
   - Make "after" examples specific to this resume's content

CRITICAL: Keep responses CONCISE. Return ONLY valid JSON, no markdown, no code blocks, no additional text."#;

/// The fully assembled instruction sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt(String);

impl AnalysisPrompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Builds the analysis prompt. Pure: the same text always yields the same prompt.
pub fn build_prompt(text: &ExtractedText) -> AnalysisPrompt {
    let task = ANALYSIS_PROMPT_TEMPLATE
        .replace("{categories}", &FIX_CATEGORIES.join(", "))
        .replace("{resume_text}", text.as_str());
    AnalysisPrompt(format!("{ANALYSIS_SYSTEM}\n\n{JSON_ONLY_SYSTEM}\n\n{task}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_text() -> ExtractedText {
        ExtractedText::new(
            "JOHN DOE Software Engineer SUMMARY Hardworking and motivated professional. \
             EXPERIENCE Responsible for developing features and fixing bugs at Tech Company.",
        )
        .unwrap()
    }

    #[test]
    fn test_prompt_embeds_text_once() {
        let text = sample_text();
        let prompt = build_prompt(&text);
        assert_eq!(prompt.as_str().matches(text.as_str()).count(), 1);
        assert!(!prompt.as_str().contains("{resume_text}"));
        assert!(!prompt.as_str().contains("{categories}"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(build_prompt(&sample_text()), build_prompt(&sample_text()));
    }

    #[test]
    fn test_prompt_carries_output_contract() {
        let prompt = build_prompt(&sample_text());
        let p = prompt.as_str();
        assert!(p.starts_with("You are a brutal but helpful resume critic"));
        assert!(p.contains("\"atsScore\""));
        assert!(p.contains("Do NOT use markdown code fences"));
        for dimension in ["Formatting (25 points)", "Keywords (25 points)", "Impact (25 points)", "Clarity (25 points)"] {
            assert!(p.contains(dimension), "missing {dimension}");
        }
        assert!(p.contains("5-7 specific issues"));
        assert!(p.contains("Summary, Experience, Skills, Education, Formatting, Keywords, Impact, Clarity, Grammar, Length"));
    }

    #[test]
    fn test_placeholder_like_resume_text_is_left_alone() {
        let text = ExtractedText::new(format!("{} {{categories}} literal braces", "a".repeat(100))).unwrap();
        let prompt = build_prompt(&text);
        assert!(prompt.as_str().contains("{categories} literal braces"));
    }
}
