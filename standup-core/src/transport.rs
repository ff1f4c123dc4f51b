//! The messaging capability consumed by the engine.
//!
//! The engine never talks to a chat platform directly. Outbound traffic
//! goes through [`ChatTransport`]; inbound traffic arrives at the bot
//! process as [`InboundEvent`]s and is routed from there — the engine
//! itself never polls.

use anyhow::Result;
use async_trait::async_trait;

/// Outbound messaging operations the engine depends on.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Create the dedicated report channel for a group and return its id.
    async fn create_channel(&self, group_id: &str) -> Result<String>;

    /// Send a text payload to a channel.
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<()>;
}

/// Inbound platform events, already resolved to stable identifiers.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// A message from a member, in a group channel or a direct message.
    Message {
        /// Group the message was sent in; `None` for direct messages.
        group_id: Option<String>,
        member_id: String,
        /// Channel replies should be addressed to.
        reply_to: String,
        text: String,
        /// True when authored by a bot (including ourselves).
        from_bot: bool,
    },

    /// The bot was added to a group.
    GroupJoined { group_id: String },

    /// The bot was removed from a group.
    GroupRemoved { group_id: String },
}
