use super::{Message, NormalizedResponse, ProviderAdapter, ProviderRequest, decode};
use crate::config::{ProviderKey, ProviderSettings};
use crate::core::error::DispatchError;
use serde_json::{Map, Value, json};

mod types;

use types::GeminiResponse;

/// Google Gemini `generateContent` (`candidates[].content.parts[]`).
#[derive(Debug, Clone)]
pub struct GeminiAdapter {
    settings: ProviderSettings,
}

impl GeminiAdapter {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings }
    }

    fn generation_config(&self) -> Map<String, Value> {
        let mut config = Map::new();
        if let Some(temperature) = self.settings.temperature {
            config.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(top_k) = self.settings.top_k {
            config.insert("topK".to_string(), json!(top_k));
        }
        if let Some(top_p) = self.settings.top_p {
            config.insert("topP".to_string(), json!(top_p));
        }
        if let Some(max_tokens) = self.settings.max_tokens {
            config.insert("maxOutputTokens".to_string(), json!(max_tokens));
        }
        config
    }
}

impl ProviderAdapter for GeminiAdapter {
    fn key(&self) -> ProviderKey {
        ProviderKey::Gemini
    }

    fn build_request(&self, message: &Message) -> ProviderRequest {
        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": message.as_str() }] }],
        });
        if let Some(system) = &self.settings.system_prompt {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }
        let generation = self.generation_config();
        if !generation.is_empty() {
            body["generationConfig"] = Value::Object(generation);
        }
        if !self.settings.safety_settings.is_empty() {
            body["safetySettings"] = json!(self.settings.safety_settings);
        }

        // Key goes in a header so the endpoint stays safe to log
        ProviderRequest::post_json(
            format!(
                "{}/v1beta/models/{}:generateContent",
                self.settings.base_url, self.settings.model
            ),
            body,
        )
        .header("x-goog-api-key", self.settings.api_key.clone())
    }

    fn parse_response(&self, body: &Value) -> Result<NormalizedResponse, DispatchError> {
        let parsed: GeminiResponse = decode(self.key(), body)?;

        let Some(candidate) = parsed.candidates.and_then(|c| c.into_iter().next()) else {
            let reason = parsed
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map(|r| format!("no candidates (prompt blocked: {})", r))
                .unwrap_or_else(|| "no candidates in response".to_string());
            return Err(DispatchError::malformed(self.key(), reason));
        };

        let finish_reason = candidate.finish_reason.unwrap_or_default();
        let text: String = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        if text.is_empty() {
            return Err(DispatchError::malformed(
                self.key(),
                format!("candidate has no text parts (finish reason: {})", finish_reason),
            ));
        }

        Ok(NormalizedResponse::new(text))
    }
}
