//! Provider-agnostic dispatch: adapter lookup, one outbound call, and
//! normalization of every failure into [`DispatchError`].

use crate::config::{Config, ProviderKey};
use crate::core::error::{DispatchError, PratError};
use crate::providers::{AdapterRegistry, HttpTransport, Message, NormalizedResponse, ProviderRequest};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

const NOT_JSON: &str = "response body is not JSON";
const UNEXPECTED_SHAPE: &str = "response did not have the expected shape";

/// Sends a built request and hands back the raw response body.
///
/// Connection failures, timeouts and non-2xx statuses are reported as
/// [`DispatchError::Transport`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: &ProviderRequest) -> Result<String, DispatchError>;
}

pub struct DispatchRouter {
    registry: AdapterRegistry,
    transport: Arc<dyn Transport>,
}

impl DispatchRouter {
    pub fn new(registry: AdapterRegistry, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, PratError> {
        let transport = HttpTransport::new(config.request_timeout())?;
        Ok(Self::new(
            AdapterRegistry::from_config(config),
            Arc::new(transport),
        ))
    }

    pub fn providers(&self) -> Vec<ProviderKey> {
        self.registry.keys()
    }

    pub fn supports(&self, provider: ProviderKey) -> bool {
        self.registry.contains(provider)
    }

    pub async fn send(
        &self,
        provider: ProviderKey,
        message: &Message,
    ) -> Result<NormalizedResponse, DispatchError> {
        let adapter = self.registry.get(provider)?;
        let request = adapter.build_request(message);
        debug!(provider = %provider, endpoint = %request.endpoint, "dispatching message");

        let raw = self.transport.post(&request).await.inspect_err(|e| {
            warn!(provider = %provider, status = ?e.status(), error = %e, "transport failure");
        })?;

        // Raw decode and adapter details go to the log only; callers see a
        // fixed detail that names no vendor fields or values.
        let body: Value = serde_json::from_str(&raw).map_err(|e| {
            error!(provider = %provider, error = %e, "response body is not JSON");
            DispatchError::malformed(provider, NOT_JSON)
        })?;

        adapter.parse_response(&body).map_err(|e| {
            error!(provider = %provider, shape = %describe_shape(&body), error = %e, "unexpected response shape");
            match e {
                DispatchError::MalformedResponse { .. } => DispatchError::malformed(provider, UNEXPECTED_SHAPE),
                other => other,
            }
        })
    }
}

/// Summarize a JSON value's structure (keys and kinds, never values) for logs.
pub fn describe_shape(value: &Value) -> String {
    fn kind(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    match value {
        Value::Object(map) => {
            let fields: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{}: {}", key, kind(value)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
        Value::Array(items) => format!("[{}; {}]", items.first().map_or("empty", kind), items.len()),
        other => kind(other).to_string(),
    }
}
