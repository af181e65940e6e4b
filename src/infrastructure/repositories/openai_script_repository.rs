use crate::domain::news::prompt::{build_user_prompt, MAX_TOKENS, PODCAST_SYSTEM_PROMPT, TEMPERATURE};
use crate::domain::news::{NewsError, NewsItem, ScriptWriter};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Script writer backed by an OpenAI-compatible chat completion endpoint
/// (DeepSeek by default)
pub struct OpenAiScriptRepository {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiScriptRepository {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String) -> Self {
        Self { client, model }
    }

    /// Client for `api_base` authenticated with `api_key`
    pub fn client_for(api_key: &str, api_base: &str) -> Arc<Client<OpenAIConfig>> {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base.trim_end_matches('/'));
        Arc::new(Client::with_config(config))
    }

    async fn complete(&self, user_prompt: String) -> Result<Option<String>, OpenAIError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .max_tokens(MAX_TOKENS)
            .temperature(TEMPERATURE)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(PODCAST_SYSTEM_PROMPT)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_prompt)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;

        if let Some(usage) = &response.usage {
            tracing::info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Chat completion usage"
            );
        }

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

#[async_trait]
impl ScriptWriter for OpenAiScriptRepository {
    async fn write_script(&self, items: &[NewsItem]) -> Result<String, NewsError> {
        let start_time = std::time::Instant::now();
        tracing::info!(model = %self.model, news_items = items.len(), "Generating script");

        let script = self
            .complete(build_user_prompt(items))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, model = %self.model, "Chat completion failed");
                NewsError::Generation(e.to_string())
            })?
            .filter(|text| !text.trim().is_empty())
            .ok_or(NewsError::EmptyScript)?;

        tracing::info!(
            chars = script.chars().count(),
            latency_ms = start_time.elapsed().as_millis() as u64,
            "Script generated"
        );

        Ok(script)
    }
}
