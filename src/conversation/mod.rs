//! Conversation state manager: validates and sequences submits, tracks the
//! in-flight exchange, and formats replies for display.

mod state;

pub use state::{ConversationState, Exchange, ExchangeStatus};

use crate::config::{Config, ProviderKey};
use crate::core::error::{DispatchError, PratError, Result};
use crate::dispatch::DispatchRouter;
use crate::display::format_reply;
use crate::providers::Message;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

pub const EMPTY_MESSAGE: &str = "empty message";
const TRANSPORT_FAILURE: &str = "Unable to reach the AI backend. Please retry.";
const PROVIDER_UNAVAILABLE: &str = "The selected AI provider is not configured.";
const UNREADABLE_REPLY: &str = "The AI backend sent a reply that could not be read. Please retry.";

/// User-facing text for a failed dispatch.
pub fn failure_message(err: &DispatchError) -> &'static str {
    match err {
        DispatchError::Transport { .. } => TRANSPORT_FAILURE,
        DispatchError::UnsupportedProvider(_) => PROVIDER_UNAVAILABLE,
        DispatchError::MalformedResponse { .. } => UNREADABLE_REPLY,
    }
}

/// Owns one conversation. The UI holds it (typically in an `Arc`), calls
/// the mutating operations, and reads [`Conversation::state`] snapshots.
///
/// At most one dispatch is in flight: a submit while loading is rejected
/// with [`PratError::AlreadyPending`]. The state lock is never held across
/// the network call.
pub struct Conversation {
    router: DispatchRouter,
    state: Mutex<ConversationState>,
    next_id: AtomicU64,
}

impl Conversation {
    pub fn new(router: DispatchRouter, provider: ProviderKey) -> Self {
        Self {
            router,
            state: Mutex::new(ConversationState::new(provider)),
            next_id: AtomicU64::new(1),
        }
    }

    /// Starts on `active_provider` when the config names one, otherwise on
    /// the first registered provider (the local server when no cloud key
    /// is set).
    pub fn from_config(config: &Config) -> Result<Self> {
        let router = DispatchRouter::from_config(config)?;
        let provider = config
            .active_provider
            .or_else(|| router.providers().first().copied())
            .unwrap_or_default();
        Ok(Self::new(router, provider))
    }

    fn lock(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ConversationState {
        self.lock().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().is_loading
    }

    pub fn provider(&self) -> ProviderKey {
        self.lock().provider
    }

    pub fn providers(&self) -> Vec<ProviderKey> {
        self.router.providers()
    }

    /// Send `text` through the selected provider and record the outcome.
    ///
    /// Returns the resolved exchange, which is `Failed` when the dispatch
    /// failed; that failure is also reflected in `last_error`. Errors are
    /// returned only for rejected submits (`Validation`, `AlreadyPending`)
    /// and for replies that arrive after a [`Conversation::reset`].
    pub async fn submit(&self, text: &str) -> Result<Exchange> {
        let (id, provider, message) = {
            let mut state = self.lock();
            if state.is_loading {
                debug!("submit rejected, previous message still pending");
                return Err(PratError::AlreadyPending);
            }

            let message = match Message::new(text) {
                Ok(message) => message,
                Err(err) => {
                    state.last_error = Some(EMPTY_MESSAGE.to_string());
                    return Err(err);
                }
            };

            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let provider = state.provider;
            state.last_error = None;
            state.history.push(text.to_string());
            state.exchanges.push(Exchange::pending(id, text, provider));
            state.recent_prompt = Some(text.to_string());
            state.show_result = true;
            state.is_loading = true;
            (id, provider, message)
        };
        debug!(exchange = id, provider = %provider, "submitting message");

        let outcome = self.router.send(provider, &message).await;

        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(exchange) = state.exchanges.iter_mut().find(|e| e.id == id) else {
            debug!(exchange = id, "discarding reply for a reset conversation");
            return Err(PratError::Superseded);
        };

        match outcome {
            Ok(response) => {
                exchange.formatted = Some(format_reply(&response.text));
                exchange.reply = Some(response.text);
                exchange.status = ExchangeStatus::Done;
            }
            Err(err) => {
                warn!(exchange = id, provider = %provider, error = %err, "exchange failed");
                state.last_error = Some(failure_message(&err).to_string());
                exchange.error = Some(err.to_string());
                exchange.status = ExchangeStatus::Failed;
            }
        }
        state.is_loading = false;

        Ok(exchange.clone())
    }

    /// Re-send a prompt from history as a new exchange.
    pub async fn load_prompt(&self, index: usize) -> Result<Exchange> {
        let prompt = self.lock().history.get(index).cloned();
        match prompt {
            Some(prompt) => self.submit(&prompt).await,
            None => Err(PratError::Validation(format!(
                "no prompt at history index {}",
                index
            ))),
        }
    }

    /// Clear history, current exchange, loading and error flags at once.
    /// A reply still in flight is discarded when it arrives.
    pub fn reset(&self) {
        self.lock().clear();
        debug!("conversation reset");
    }

    /// Route future submits through `provider`. Resolved exchanges keep the
    /// provider they were sent with.
    pub fn select_provider(&self, provider: ProviderKey) -> std::result::Result<(), DispatchError> {
        if !self.router.supports(provider) {
            return Err(DispatchError::UnsupportedProvider(provider.to_string()));
        }
        self.lock().provider = provider;
        debug!(provider = %provider, "provider selected");
        Ok(())
    }

    pub fn select_provider_named(&self, name: &str) -> std::result::Result<(), DispatchError> {
        self.select_provider(name.parse()?)
    }
}
