use std::sync::Arc;

use crate::analysis::quota::QuotaPolicy;
use crate::analysis::Analyzer;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    /// Pluggable upload quota. Default: `Unlimited`.
    pub quota: Arc<dyn QuotaPolicy>,
    pub config: Config,
}
