pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod prompts;
pub mod quota;
pub mod recovery;
pub mod validation;

pub use orchestrator::{AnalysisError, Analyzer};
