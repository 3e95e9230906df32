use super::{Message, NormalizedResponse, ProviderAdapter, ProviderRequest, decode};
use crate::config::{ProviderKey, ProviderSettings};
use crate::core::error::DispatchError;
use serde::Deserialize;
use serde_json::{Value, json};

/// Reply of the project chat server. Intent, sentiment and the like are
/// ignored here.
#[derive(Deserialize)]
struct ChatServerResponse {
    response: String,
}

/// The project's own chat server: `POST {base}/chat` with `{"message"}`.
/// No credentials; the server holds its own vendor keys.
#[derive(Debug, Clone)]
pub struct LocalAdapter {
    settings: ProviderSettings,
}

impl LocalAdapter {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings }
    }
}

impl ProviderAdapter for LocalAdapter {
    fn key(&self) -> ProviderKey {
        ProviderKey::Local
    }

    fn build_request(&self, message: &Message) -> ProviderRequest {
        ProviderRequest::post_json(
            format!("{}/chat", self.settings.base_url),
            json!({ "message": message.as_str() }),
        )
    }

    fn parse_response(&self, body: &Value) -> Result<NormalizedResponse, DispatchError> {
        let parsed: ChatServerResponse = decode(self.key(), body)?;
        Ok(NormalizedResponse::new(parsed.response))
    }
}
