use anyhow::{Context, Result};

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1";

/// Upload ceiling enforced by the HTTP layer before any analysis runs.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub model: ModelSettings,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

/// Everything the model client needs. Passed in explicitly; the pipeline never
/// reads the environment itself.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    pub request_timeout_secs: u64,
}

impl ModelSettings {
    /// Default generation parameters: moderate randomness, bounded output.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 4096,
            request_timeout_secs: 120,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let mut model = ModelSettings::with_api_key(require("GEMINI_API_KEY")?);
        if let Some(name) = lookup("GEMINI_MODEL") {
            model.model = name;
        }
        if let Some(base) = lookup("GEMINI_API_BASE") {
            model.api_base = base;
        }
        if let Some(secs) = lookup("MODEL_TIMEOUT_SECS") {
            model.request_timeout_secs = secs
                .parse()
                .context("MODEL_TIMEOUT_SECS must be a whole number of seconds")?;
        }

        Ok(Config {
            model,
            max_upload_bytes: lookup("MAX_UPLOAD_BYTES")
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("MAX_UPLOAD_BYTES must be a byte count")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}
