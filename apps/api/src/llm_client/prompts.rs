// Shared prompt fragments.
// Each feature that needs model calls defines its own prompts.rs alongside it;
// this file holds the cross-cutting pieces.

/// Output contract appended to every system directive that expects JSON back.
pub const JSON_ONLY_SYSTEM: &str = "\
You MUST respond with a single valid JSON object only. \
Do NOT include any text before or after the JSON object. \
Do NOT use markdown code fences. \
Ensure all strings are properly escaped.";
