//! Provider-agnostic chat dispatch for LLM front-ends.
//!
//! A [`Conversation`] takes user text, routes it through the
//! [`DispatchRouter`] to one of the registered [`ProviderAdapter`]s, and
//! keeps the ordered prompt/reply history a UI renders from.

pub mod config;
pub mod conversation;
pub mod core;
pub mod dispatch;
pub mod display;
pub mod providers;

pub use crate::config::{Config, ProviderConfig, ProviderKey, ProviderSettings, SafetySetting};
pub use crate::conversation::{Conversation, ConversationState, Exchange, ExchangeStatus};
pub use crate::core::error::{DispatchError, PratError, Result};
pub use crate::dispatch::{DispatchRouter, Transport};
pub use crate::display::{FormattedReply, Inline, Paragraph, format_reply};
pub use crate::providers::{
    AdapterRegistry, HttpTransport, Message, NormalizedResponse, ProviderAdapter, ProviderRequest,
};
