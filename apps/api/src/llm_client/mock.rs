//! Scripted `ModelClient` for tests. Records how often it was called.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::llm_client::{LlmError, ModelClient};

enum Script {
    Reply(String),
    Fail,
    Hang,
}

pub struct ScriptedModel {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with(Script::Reply(text.into()))
    }

    /// Fails every call the way an overloaded endpoint does.
    pub fn failing() -> Self {
        Self::with(Script::Fail)
    }

    /// Never answers; only useful together with cancellation.
    pub fn hanging() -> Self {
        Self::with(Script::Hang)
    }

    fn with(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Fail => Err(LlmError::Api {
                status: 503,
                message: "model overloaded".to_string(),
            }),
            Script::Hang => std::future::pending().await,
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
