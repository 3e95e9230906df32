#![allow(dead_code)]

use async_trait::async_trait;
use prat::providers::factory::create_adapter;
use prat::{
    AdapterRegistry, Conversation, DispatchError, DispatchRouter, ProviderKey, ProviderRequest,
    ProviderSettings, Transport,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Replays canned bodies in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<String, DispatchError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply_json(&self, body: Value) {
        self.replies.lock().unwrap().push_back(Ok(body.to_string()));
    }

    pub fn reply_raw(&self, body: &str) {
        self.replies.lock().unwrap().push_back(Ok(body.to_string()));
    }

    pub fn fail(&self, err: DispatchError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, request: &ProviderRequest) -> Result<String, DispatchError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted reply for {}", request.endpoint))
    }
}

/// Holds every call until `release` is invoked, then answers with `body`.
pub struct GatedTransport {
    pub gate: Notify,
    body: Value,
}

impl GatedTransport {
    pub fn new(body: Value) -> Arc<Self> {
        Arc::new(Self {
            gate: Notify::new(),
            body,
        })
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn post(&self, _request: &ProviderRequest) -> Result<String, DispatchError> {
        self.gate.notified().await;
        Ok(self.body.to_string())
    }
}

pub fn registry_with(keys: &[ProviderKey]) -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    for key in keys {
        let mut settings = ProviderSettings::defaults(*key);
        settings.api_key = format!("{}-key", key);
        registry.register(create_adapter(settings));
    }
    registry
}

pub fn conversation(transport: Arc<dyn Transport>, keys: &[ProviderKey]) -> Conversation {
    let router = DispatchRouter::new(registry_with(keys), transport);
    Conversation::new(router, keys.first().copied().unwrap_or_default())
}
