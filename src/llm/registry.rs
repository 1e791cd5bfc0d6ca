use super::{
    ProviderAdapter, chat_completions::ChatCompletionsAdapter, tensorzero::TensorZeroAdapter,
};
use crate::config::{ProviderKind, ProviderSettings};
use crate::orchestrator::ProviderTier;
use reqwest::Client;
use std::sync::Arc;
use tracing::info;

/// Builds the tier list in configured priority order.
///
/// Every provider named in the order is included, configured or not; the
/// orchestrator skips unconfigured tiers per request.
pub fn provider_tiers(settings: &ProviderSettings, http: &Client) -> Vec<ProviderTier> {
    let tiers: Vec<ProviderTier> = settings
        .order
        .iter()
        .map(|kind| {
            let adapter: Arc<dyn ProviderAdapter> = match kind {
                ProviderKind::Groq => Arc::new(ChatCompletionsAdapter::new(
                    kind.as_str(),
                    &settings.groq,
                    http.clone(),
                )),
                ProviderKind::Mistral => Arc::new(ChatCompletionsAdapter::new(
                    kind.as_str(),
                    &settings.mistral,
                    http.clone(),
                )),
                ProviderKind::TensorZero => Arc::new(TensorZeroAdapter::new(
                    settings.tensorzero.clone(),
                    http.clone(),
                )),
            };
            let timeout = match kind {
                ProviderKind::Groq => settings.groq.timeout,
                ProviderKind::Mistral => settings.mistral.timeout,
                ProviderKind::TensorZero => settings.tensorzero.timeout,
            };
            info!(
                target = "optimizer.llm",
                engine = adapter.name(),
                configured = adapter.is_configured(),
                "provider_registered"
            );
            ProviderTier::new(adapter, timeout.unwrap_or(settings.call_timeout))
        })
        .collect();

    let configured = tiers
        .iter()
        .filter(|tier| tier.adapter.is_configured())
        .count();
    info!(
        target = "optimizer.llm",
        configured,
        total = tiers.len(),
        "provider tiers ready"
    );
    tiers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::test_support::test_client;
    use std::collections::HashMap;
    use std::time::Duration;

    fn settings(pairs: &[(&str, &str)]) -> ProviderSettings {
        let vars: HashMap<&str, &str> = pairs.iter().copied().collect();
        AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).providers
    }

    #[test]
    fn tiers_follow_configured_order() {
        let settings = settings(&[
            ("PROVIDER_ORDER", "tensorzero,mistral,groq"),
            ("MISTRAL_API_KEY", "m-key"),
        ]);
        let tiers = provider_tiers(&settings, &test_client());
        let names: Vec<&str> = tiers.iter().map(|t| t.adapter.name()).collect();
        assert_eq!(names, vec!["tensorzero", "mistral", "groq"]);
        let configured: Vec<bool> = tiers.iter().map(|t| t.adapter.is_configured()).collect();
        assert_eq!(configured, vec![false, true, false]);
    }

    #[test]
    fn per_provider_timeout_overrides_default() {
        let settings = settings(&[
            ("PROVIDER_TIMEOUT_SECS", "12"),
            ("GROQ_TIMEOUT_SECS", "3"),
        ]);
        let tiers = provider_tiers(&settings, &test_client());
        assert_eq!(tiers[0].timeout, Duration::from_secs(3));
        assert_eq!(tiers[1].timeout, Duration::from_secs(12));
    }
}
