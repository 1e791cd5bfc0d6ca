pub mod chat_completions;
pub mod fallback;
pub mod parse;
pub mod registry;
pub mod tensorzero;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fallback::{LOCAL_FALLBACK_ENGINE, generate_local};

/// Marketing copy produced by one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Why a single provider call did not yield usable content.
///
/// The orchestrator treats every variant the same way (log, try the next
/// tier); the split exists for logs and metrics.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderFailure {
    #[error("provider credentials are not configured")]
    Unconfigured,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider rejected the request: {0}")]
    Rejected(String),
    #[error("unparsable response: {0}")]
    Unparsable(String),
}

impl ProviderFailure {
    pub fn cause(&self) -> &'static str {
        match self {
            ProviderFailure::Unconfigured => "unconfigured",
            ProviderFailure::Transport(_) => "transport",
            ProviderFailure::Rejected(_) => "rejected",
            ProviderFailure::Unparsable(_) => "unparsable",
        }
    }
}

pub type ProviderOutcome = Result<GeneratedContent, ProviderFailure>;

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    /// Ask the provider for machine-parsable JSON output when it supports it.
    pub structured_output: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LlmMessage {
    pub role: String,
    pub content: String,
}

impl LlmMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// One external text-generation service.
///
/// Implementations make at most one outbound request per `generate` call and
/// never retry. An adapter without credentials must answer
/// `ProviderFailure::Unconfigured` without touching the network.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Engine identifier reported to callers when this adapter wins.
    fn name(&self) -> &str;

    fn is_configured(&self) -> bool;

    async fn generate(&self, prompt: &str, options: GenerateOptions) -> ProviderOutcome;
}
