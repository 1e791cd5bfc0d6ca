use crate::llm::{
    GenerateOptions, GeneratedContent, LOCAL_FALLBACK_ENGINE, ProviderAdapter, ProviderFailure,
    ProviderOutcome, generate_local,
};
use serde::Serialize;
use std::{sync::Arc, time::Duration, time::Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub subject_id: String,
    pub subject_title: String,
}

impl GenerationRequest {
    pub fn new(subject_id: impl Into<String>, subject_title: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            subject_title: subject_title.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrchestrationResult {
    pub content: GeneratedContent,
    pub engine_used: String,
}

/// One provider in the priority list, with its per-call deadline.
#[derive(Clone)]
pub struct ProviderTier {
    pub adapter: Arc<dyn ProviderAdapter>,
    pub timeout: Duration,
}

impl ProviderTier {
    pub fn new(adapter: Arc<dyn ProviderAdapter>, timeout: Duration) -> Self {
        Self { adapter, timeout }
    }
}

/// Tries provider tiers in a fixed order and falls back to local copy.
///
/// The tier list is built once at start-up and shared read-only between
/// requests. `optimize` has no error path: the first tier that returns valid
/// content wins, later tiers are never called, and when every tier fails (or
/// none is configured) the deterministic local generator answers.
#[derive(Clone)]
pub struct FailoverOrchestrator {
    tiers: Arc<[ProviderTier]>,
}

impl FailoverOrchestrator {
    pub fn new(tiers: Vec<ProviderTier>) -> Self {
        Self {
            tiers: tiers.into(),
        }
    }

    pub fn configured_engines(&self) -> Vec<String> {
        self.tiers
            .iter()
            .filter(|tier| tier.adapter.is_configured())
            .map(|tier| tier.adapter.name().to_string())
            .collect()
    }

    pub async fn optimize(&self, request: &GenerationRequest) -> OrchestrationResult {
        let prompt = build_prompt(&request.subject_title);
        let options = GenerateOptions {
            structured_output: true,
        };

        for (position, tier) in self.tiers.iter().enumerate() {
            let engine = tier.adapter.name();
            if !tier.adapter.is_configured() {
                debug!(
                    target = "optimizer.llm",
                    subject_id = %request.subject_id,
                    engine,
                    "tier_skipped_unconfigured"
                );
                continue;
            }

            info!(
                target = "optimizer.llm",
                subject_id = %request.subject_id,
                engine,
                tier = position + 1,
                "tier_attempt"
            );
            let started = Instant::now();
            let outcome = attempt(tier, &prompt, options).await;
            let elapsed_ms = started.elapsed().as_millis();

            match outcome {
                Ok(content) => {
                    crate::metrics::tier_outcome(engine, "success", elapsed_ms);
                    info!(
                        target = "optimizer.llm",
                        subject_id = %request.subject_id,
                        engine,
                        elapsed_ms = elapsed_ms as u64,
                        tag_count = content.tags.len(),
                        "tier_succeeded"
                    );
                    return OrchestrationResult {
                        content,
                        engine_used: engine.to_string(),
                    };
                }
                Err(failure) => {
                    crate::metrics::tier_outcome(engine, failure.cause(), elapsed_ms);
                    warn!(
                        target = "optimizer.llm",
                        subject_id = %request.subject_id,
                        engine,
                        cause = failure.cause(),
                        error = %failure,
                        elapsed_ms = elapsed_ms as u64,
                        "tier_failed"
                    );
                }
            }
        }

        warn!(
            target = "optimizer.llm",
            subject_id = %request.subject_id,
            "all_tiers_exhausted_using_local_fallback"
        );
        crate::metrics::tier_outcome(LOCAL_FALLBACK_ENGINE, "success", 0);
        OrchestrationResult {
            content: generate_local(&request.subject_title),
            engine_used: LOCAL_FALLBACK_ENGINE.to_string(),
        }
    }
}

async fn attempt(tier: &ProviderTier, prompt: &str, options: GenerateOptions) -> ProviderOutcome {
    let content = match tokio::time::timeout(tier.timeout, tier.adapter.generate(prompt, options))
        .await
    {
        Ok(outcome) => outcome?,
        Err(_) => {
            return Err(ProviderFailure::Transport(format!(
                "timed out after {}ms",
                tier.timeout.as_millis()
            )));
        }
    };
    // adapters validate shape; this guards the non-empty invariant for any impl
    if content.description.trim().is_empty() {
        return Err(ProviderFailure::Unparsable("empty description".into()));
    }
    Ok(content)
}

pub fn build_prompt(title: &str) -> String {
    format!(
        "Write a premium 2-sentence SEO description and 3 tags for: {title}. \
         Return JSON only, with no markdown and no commentary: \
         {{\"description\": \"...\", \"tags\": [\"t1\", \"t2\", \"t3\"]}}",
        title = title.trim(),
    )
}
