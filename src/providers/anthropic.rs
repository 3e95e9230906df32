use super::{Message, NormalizedResponse, ProviderAdapter, ProviderRequest, decode};
use crate::config::{ProviderKey, ProviderSettings};
use crate::core::error::DispatchError;
use serde::Deserialize;
use serde_json::{Value, json};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const FALLBACK_MAX_TOKENS: u32 = 2048;

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<String>,
}

/// Anthropic Messages API (`content[]` blocks).
#[derive(Debug, Clone)]
pub struct ClaudeAdapter {
    settings: ProviderSettings,
}

impl ClaudeAdapter {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings }
    }
}

impl ProviderAdapter for ClaudeAdapter {
    fn key(&self) -> ProviderKey {
        ProviderKey::Claude
    }

    fn build_request(&self, message: &Message) -> ProviderRequest {
        let mut body = json!({
            "model": self.settings.model,
            "max_tokens": self.settings.max_tokens.unwrap_or(FALLBACK_MAX_TOKENS),
            "messages": [{ "role": "user", "content": message.as_str() }],
        });
        if let Some(system) = &self.settings.system_prompt {
            body["system"] = json!(system);
        }
        if let Some(temperature) = self.settings.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(top_k) = self.settings.top_k {
            body["top_k"] = json!(top_k);
        }
        if let Some(top_p) = self.settings.top_p {
            body["top_p"] = json!(top_p);
        }

        ProviderRequest::post_json(format!("{}/messages", self.settings.base_url), body)
            .header("x-api-key", self.settings.api_key.clone())
            .header("anthropic-version", ANTHROPIC_VERSION)
    }

    fn parse_response(&self, body: &Value) -> Result<NormalizedResponse, DispatchError> {
        let parsed: AnthropicResponse = decode(self.key(), body)?;

        // tool_use and thinking blocks carry no reply text
        let texts: Vec<String> = parsed
            .content
            .into_iter()
            .filter(|block| block.kind.as_deref().is_none_or(|kind| kind == "text"))
            .filter_map(|block| block.text)
            .collect();

        if texts.is_empty() {
            return Err(DispatchError::malformed(
                self.key(),
                "no text block in content",
            ));
        }

        Ok(NormalizedResponse::new(texts.concat()))
    }
}
