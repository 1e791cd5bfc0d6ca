use super::{
    GenerateOptions, LlmMessage, ProviderAdapter, ProviderFailure, ProviderOutcome,
    parse::parse_generated_content,
};
use crate::config::TensorZeroSettings;
use crate::http::truncate_body;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Provider backed by a TensorZero inference gateway.
///
/// The gateway url is the credential here: without it the adapter is
/// unconfigured. Structured output is the gateway function's concern, so
/// `GenerateOptions` has no effect on the request body.
pub struct TensorZeroAdapter {
    http: Client,
    config: TensorZeroSettings,
}

impl TensorZeroAdapter {
    pub fn new(config: TensorZeroSettings, http: Client) -> Self {
        Self { http, config }
    }

    fn gateway(&self) -> Option<&str> {
        self.config
            .gateway_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }
}

#[async_trait]
impl ProviderAdapter for TensorZeroAdapter {
    fn name(&self) -> &str {
        "tensorzero"
    }

    fn is_configured(&self) -> bool {
        self.gateway().is_some()
    }

    async fn generate(&self, prompt: &str, _options: GenerateOptions) -> ProviderOutcome {
        let Some(gateway) = self.gateway() else {
            return Err(ProviderFailure::Unconfigured);
        };

        let body = InferenceRequest {
            function_name: &self.config.function_name,
            model_name: self.config.model.as_deref(),
            input: InferenceInput {
                messages: vec![LlmMessage::user(prompt)],
            },
        };

        let mut request = self.http.post(format!("{gateway}/inference")).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.header("X-API-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|err| ProviderFailure::Transport(err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| ProviderFailure::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(ProviderFailure::Rejected(format!(
                "HTTP {status}: {}",
                truncate_body(&text, 200)
            )));
        }

        let payload: InferenceResponse = serde_json::from_str(&text)
            .map_err(|err| ProviderFailure::Unparsable(format!("inference envelope: {err}")))?;
        let content = payload
            .content
            .into_iter()
            .find(|item| item.r#type == "text")
            .and_then(|item| item.text)
            .ok_or_else(|| ProviderFailure::Unparsable("missing text block".into()))?;

        parse_generated_content(&content)
    }
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    function_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_name: Option<&'a str>,
    input: InferenceInput,
}

#[derive(Debug, Serialize)]
struct InferenceInput {
    messages: Vec<LlmMessage>,
}

#[derive(Debug, Deserialize)]
struct InferenceResponse {
    #[serde(default)]
    content: Vec<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    r#type: String,
    #[serde(default)]
    text: Option<String>,
}
