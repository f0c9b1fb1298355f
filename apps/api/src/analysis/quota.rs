//! Upload quota — pluggable policy consulted before every analysis.
//!
//! `AppState` holds an `Arc<dyn QuotaPolicy>`. The service ships with
//! `Unlimited`; a counting backend only has to implement the trait.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("upload quota exceeded for {caller}")]
pub struct QuotaExceeded {
    pub caller: String,
}

#[async_trait]
pub trait QuotaPolicy: Send + Sync {
    /// Returns `Err` when `caller` may not start another analysis right now.
    async fn check(&self, caller: &str) -> Result<(), QuotaExceeded>;

    fn name(&self) -> &'static str;
}

/// Permits every call.
pub struct Unlimited;

#[async_trait]
impl QuotaPolicy for Unlimited {
    async fn check(&self, _caller: &str) -> Result<(), QuotaExceeded> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "unlimited"
    }
}
