use crate::config::{Config, ProviderKey, ProviderSettings};
use crate::core::error::DispatchError;
use crate::providers::{ClaudeAdapter, GeminiAdapter, LocalAdapter, OpenAIAdapter, ProviderAdapter};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

type AdapterCreator = fn(ProviderSettings) -> Arc<dyn ProviderAdapter>;

fn creator(key: ProviderKey) -> AdapterCreator {
    match key {
        ProviderKey::OpenAI => |settings| Arc::new(OpenAIAdapter::new(settings)) as Arc<dyn ProviderAdapter>,
        ProviderKey::Claude => |settings| Arc::new(ClaudeAdapter::new(settings)) as Arc<dyn ProviderAdapter>,
        ProviderKey::Gemini => |settings| Arc::new(GeminiAdapter::new(settings)) as Arc<dyn ProviderAdapter>,
        ProviderKey::Local => |settings| Arc::new(LocalAdapter::new(settings)) as Arc<dyn ProviderAdapter>,
    }
}

/// Build the adapter for `settings.key`.
pub fn create_adapter(settings: ProviderSettings) -> Arc<dyn ProviderAdapter> {
    creator(settings.key)(settings)
}

/// Dispatch table from provider key to its single registered adapter.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<ProviderKey, Arc<dyn ProviderAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every cloud provider that has credentials, plus the local
    /// chat server which needs none.
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::new();

        for key in ProviderKey::ALL {
            if !config.has_credentials(key) {
                continue;
            }
            let settings = config.provider_settings(key);
            info!(provider = %key, model = %settings.model, "registered provider");
            registry.register(create_adapter(settings));
        }

        if ProviderKey::ALL
            .iter()
            .filter(|key| key.requires_api_key())
            .all(|key| !registry.contains(*key))
        {
            warn!(
                "No cloud LLM providers configured. \
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or GEMINI_API_KEY."
            );
        }

        registry
    }

    /// Register an adapter under its own key, replacing any previous one.
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.key(), adapter);
    }

    pub fn get(&self, key: ProviderKey) -> Result<Arc<dyn ProviderAdapter>, DispatchError> {
        self.adapters
            .get(&key)
            .cloned()
            .ok_or_else(|| DispatchError::UnsupportedProvider(key.to_string()))
    }

    pub fn contains(&self, key: ProviderKey) -> bool {
        self.adapters.contains_key(&key)
    }

    /// Registered keys in declaration order.
    pub fn keys(&self) -> Vec<ProviderKey> {
        ProviderKey::ALL
            .into_iter()
            .filter(|key| self.adapters.contains_key(key))
            .collect()
    }
}
