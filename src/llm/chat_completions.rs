use super::{
    GenerateOptions, LlmMessage, ProviderAdapter, ProviderFailure, ProviderOutcome,
    parse::parse_generated_content,
};
use crate::config::ChatProviderSettings;
use crate::http::truncate_body;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Adapter for OpenAI-compatible `/chat/completions` endpoints (Groq, Mistral).
pub struct ChatCompletionsAdapter {
    name: String,
    http: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl ChatCompletionsAdapter {
    pub fn new(name: impl Into<String>, settings: &ChatProviderSettings, http: Client) -> Self {
        Self {
            name: name.into(),
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for ChatCompletionsAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, prompt: &str, options: GenerateOptions) -> ProviderOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ProviderFailure::Unconfigured);
        };

        let body = ChatRequest {
            model: &self.model,
            messages: vec![LlmMessage::user(prompt)],
            response_format: options
                .structured_output
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
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

        let payload: ChatResponse = serde_json::from_str(&text)
            .map_err(|err| ProviderFailure::Unparsable(format!("chat envelope: {err}")))?;
        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderFailure::Unparsable("missing message content".into()))?;

        parse_generated_content(&content)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<LlmMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
