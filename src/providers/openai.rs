use super::{Message, NormalizedResponse, ProviderAdapter, ProviderRequest, decode};
use crate::config::{ProviderKey, ProviderSettings};
use crate::core::error::DispatchError;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: Option<String>,
}

/// OpenAI chat completions (`choices[].message.content`).
#[derive(Debug, Clone)]
pub struct OpenAIAdapter {
    settings: ProviderSettings,
}

impl OpenAIAdapter {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings }
    }
}

impl ProviderAdapter for OpenAIAdapter {
    fn key(&self) -> ProviderKey {
        ProviderKey::OpenAI
    }

    fn build_request(&self, message: &Message) -> ProviderRequest {
        let mut messages = Vec::new();
        if let Some(system) = &self.settings.system_prompt {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": message.as_str() }));

        let mut body = json!({
            "model": self.settings.model,
            "messages": messages,
        });
        if let Some(max_tokens) = self.settings.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = self.settings.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(top_p) = self.settings.top_p {
            body["top_p"] = json!(top_p);
        }

        ProviderRequest::post_json(format!("{}/chat/completions", self.settings.base_url), body)
            .header(
                "Authorization",
                format!("Bearer {}", self.settings.api_key),
            )
    }

    fn parse_response(&self, body: &Value) -> Result<NormalizedResponse, DispatchError> {
        let parsed: ChatCompletionResponse = decode(self.key(), body)?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DispatchError::malformed(self.key(), "no choices in response"))?;

        choice
            .message
            .content
            .map(NormalizedResponse::new)
            .ok_or_else(|| DispatchError::malformed(self.key(), "first choice has no content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> OpenAIAdapter {
        let mut settings = ProviderSettings::defaults(ProviderKey::OpenAI);
        settings.api_key = "sk-test".to_string();
        OpenAIAdapter::new(settings)
    }

    #[test]
    fn test_build_request() {
        let request = adapter().build_request(&Message::new("Hello").unwrap());

        assert_eq!(request.endpoint, "https://api.openai.com/v1/chat/completions");
        assert_eq!(request.header_value("Authorization"), Some("Bearer sk-test"));
        assert_eq!(request.header_value("Content-Type"), Some("application/json"));
        assert_eq!(
            request.body,
            json!({
                "model": "gpt-4.1-mini",
                "messages": [{ "role": "user", "content": "Hello" }],
            })
        );
    }

    #[test]
    fn test_build_request_with_system_prompt_and_limits() {
        let mut settings = ProviderSettings::defaults(ProviderKey::OpenAI);
        settings.system_prompt = Some("Be brief.".to_string());
        settings.max_tokens = Some(256);
        let request = OpenAIAdapter::new(settings).build_request(&Message::new("Hi").unwrap());

        assert_eq!(request.body["messages"][0]["role"], "system");
        assert_eq!(request.body["messages"][0]["content"], "Be brief.");
        assert_eq!(request.body["messages"][1]["content"], "Hi");
        assert_eq!(request.body["max_tokens"], 256);
        assert!(request.body.get("temperature").is_none());
    }

    #[test]
    fn test_build_request_is_deterministic() {
        let adapter = adapter();
        let message = Message::new("same input").unwrap();
        assert_eq!(adapter.build_request(&message), adapter.build_request(&message));
    }

    #[test]
    fn test_parse_golden_response() {
        let body = json!({
            "id": "chatcmpl-123",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "hi" },
                "finish_reason": "stop"
            }]
        });
        assert_eq!(
            adapter().parse_response(&body).unwrap(),
            NormalizedResponse::new("hi")
        );
    }

    #[test]
    fn test_parse_keeps_reply_verbatim() {
        let body = json!({ "choices": [{ "message": { "content": "  **Hi** there\n\n" } }] });
        assert_eq!(adapter().parse_response(&body).unwrap().text, "  **Hi** there\n\n");
    }

    #[test]
    fn test_parse_malformed_responses() {
        let cases = [
            json!({}),
            json!({ "choices": [] }),
            json!({ "choices": "nope" }),
            json!({ "choices": [{ "message": { "content": null } }] }),
            json!({ "content": [{ "text": "claude-shaped" }] }),
        ];
        for body in cases {
            let err = adapter().parse_response(&body).unwrap_err();
            assert!(
                matches!(err, DispatchError::MalformedResponse { provider: ProviderKey::OpenAI, .. }),
                "unexpected error for {body}: {err:?}"
            );
        }
    }
}
