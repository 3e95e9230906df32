use crate::config::ProviderKey;
use crate::display::FormattedReply;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeStatus {
    Pending,
    Done,
    Failed,
}

/// One prompt and what became of it. Resolved exactly once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exchange {
    pub id: u64,
    pub prompt: String,
    /// Provider the prompt was routed through, fixed at submission.
    pub provider: ProviderKey,
    pub submitted_at: DateTime<Utc>,
    pub status: ExchangeStatus,
    pub reply: Option<String>,
    pub formatted: Option<FormattedReply>,
    pub error: Option<String>,
}

impl Exchange {
    pub(crate) fn pending(id: u64, prompt: &str, provider: ProviderKey) -> Self {
        Self {
            id,
            prompt: prompt.to_string(),
            provider,
            submitted_at: Utc::now(),
            status: ExchangeStatus::Pending,
            reply: None,
            formatted: None,
            error: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status != ExchangeStatus::Pending
    }
}

/// Snapshot of a conversation as the UI sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationState {
    /// Prompts in submission order.
    pub history: Vec<String>,
    /// One entry per prompt in `history`, same order.
    pub exchanges: Vec<Exchange>,
    pub recent_prompt: Option<String>,
    pub show_result: bool,
    pub is_loading: bool,
    pub last_error: Option<String>,
    pub provider: ProviderKey,
}

impl ConversationState {
    pub fn new(provider: ProviderKey) -> Self {
        Self {
            history: Vec::new(),
            exchanges: Vec::new(),
            recent_prompt: None,
            show_result: false,
            is_loading: false,
            last_error: None,
            provider,
        }
    }

    /// The most recent exchange.
    pub fn current(&self) -> Option<&Exchange> {
        self.exchanges.last()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Back to the initial value; the provider selection survives.
    pub(crate) fn clear(&mut self) {
        *self = Self::new(self.provider);
    }
}
