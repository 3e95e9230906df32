use crate::config::ProviderKey;
use crate::core::error::{DispatchError, PratError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

pub mod anthropic;
pub mod base_client;
pub mod factory;
pub mod gemini;
pub mod local;
pub mod openai;

pub use anthropic::ClaudeAdapter;
pub use base_client::HttpTransport;
pub use factory::AdapterRegistry;
pub use gemini::GeminiAdapter;
pub use local::LocalAdapter;
pub use openai::OpenAIAdapter;

/// A user message that passed validation: non-empty after trimming.
///
/// The text is kept exactly as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    content: String,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Result<Self, PratError> {
        let content = text.into();
        if content.trim().is_empty() {
            return Err(PratError::Validation("empty message".to_string()));
        }
        Ok(Self { content })
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }
}

/// A fully built vendor call: where to POST, which headers, which JSON body.
#[derive(Clone, PartialEq)]
pub struct ProviderRequest {
    pub endpoint: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl ProviderRequest {
    pub fn post_json(endpoint: impl Into<String>, body: Value) -> Self {
        Self {
            endpoint: endpoint.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body,
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

const SECRET_HEADERS: [&str; 3] = ["authorization", "x-api-key", "x-goog-api-key"];

impl fmt::Debug for ProviderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| {
                if SECRET_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                    (name.as_str(), "***")
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect();
        f.debug_struct("ProviderRequest")
            .field("endpoint", &self.endpoint)
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}

/// The vendor's reply text, verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedResponse {
    pub text: String,
}

impl NormalizedResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// One backend's request/response shape knowledge. Implementations are pure:
/// building a request and parsing a reply never perform I/O.
pub trait ProviderAdapter: Send + Sync {
    fn key(&self) -> ProviderKey;

    fn build_request(&self, message: &Message) -> ProviderRequest;

    /// Extract the assistant text from the vendor body, or report
    /// [`DispatchError::MalformedResponse`] when the expected shape is absent.
    fn parse_response(&self, body: &Value) -> Result<NormalizedResponse, DispatchError>;
}

/// Deserialize a vendor envelope, mapping shape mismatches to `MalformedResponse`.
pub(crate) fn decode<T: DeserializeOwned>(
    provider: ProviderKey,
    body: &Value,
) -> Result<T, DispatchError> {
    T::deserialize(body).map_err(|e| DispatchError::malformed(provider, e.to_string()))
}
