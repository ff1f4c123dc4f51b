//! HTTP chat-gateway transport.
//!
//! Talks to a platform-agnostic chat gateway: outbound messages and
//! channel creation are REST calls, inbound traffic is a cursor-based
//! long-poll. The gateway resolves member identities; everything that
//! reaches the engine is already a stable id.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use standup_core::transport::{ChatTransport, InboundEvent};

/// Seconds the gateway may hold an event poll open.
const POLL_WAIT_SECS: u32 = 25;

pub struct Gateway {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ChannelCreated {
    channel_id: String,
}

#[derive(Debug, Deserialize)]
struct EventBatch {
    events: Vec<WireEvent>,
    cursor: u64,
}

/// Inbound events as the gateway encodes them.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    Message {
        group_id: Option<String>,
        member_id: String,
        channel_id: String,
        text: String,
        #[serde(default)]
        bot: bool,
    },
    GroupJoined {
        group_id: String,
    },
    GroupRemoved {
        group_id: String,
    },
}

impl From<WireEvent> for InboundEvent {
    fn from(event: WireEvent) -> Self {
        match event {
            WireEvent::Message {
                group_id,
                member_id,
                channel_id,
                text,
                bot,
            } => InboundEvent::Message {
                group_id,
                member_id,
                reply_to: channel_id,
                text,
                from_bot: bot,
            },
            WireEvent::GroupJoined { group_id } => InboundEvent::GroupJoined { group_id },
            WireEvent::GroupRemoved { group_id } => InboundEvent::GroupRemoved { group_id },
        }
    }
}

impl Gateway {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Long-poll the inbound event feed. Returns the batch together with
    /// the cursor to resume from.
    pub async fn next_events(&self, cursor: u64) -> Result<(Vec<InboundEvent>, u64)> {
        let resp = self
            .http
            .get(format!("{}/events", self.base_url))
            .bearer_auth(&self.token)
            .query(&[
                ("after", cursor.to_string()),
                ("wait", POLL_WAIT_SECS.to_string()),
            ])
            .send()
            .await
            .context("failed to poll gateway events")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("gateway error {status} while polling events");
        }

        let batch: EventBatch = resp
            .json()
            .await
            .context("failed to parse gateway event batch")?;
        let events = batch.events.into_iter().map(InboundEvent::from).collect();
        Ok((events, batch.cursor))
    }
}

#[async_trait]
impl ChatTransport for Gateway {
    async fn create_channel(&self, group_id: &str) -> Result<String> {
        let resp = self
            .http
            .post(format!("{}/groups/{group_id}/channels", self.base_url))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({
                "name": "daily-standups",
                "reason": "standup report channel",
            }))
            .send()
            .await
            .context("failed to create report channel")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("gateway error {status} while creating channel for {group_id}");
        }

        let created: ChannelCreated = resp
            .json()
            .await
            .context("failed to parse channel creation response")?;
        Ok(created.channel_id)
    }

    async fn send_message(&self, channel_id: &str, text: &str) -> Result<()> {
        let resp = self
            .http
            .post(format!("{}/channels/{channel_id}/messages", self.base_url))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .context("failed to send message")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("gateway error {status} while sending to {channel_id}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_mixed_event_batch() {
        let json = r#"{
            "cursor": 42,
            "events": [
                {"type": "group_joined", "group_id": "g1"},
                {"type": "message", "group_id": "g1", "member_id": "alice",
                 "channel_id": "chan-1", "text": "!show"},
                {"type": "message", "group_id": null, "member_id": "bot",
                 "channel_id": "dm-1", "text": "hi", "bot": true},
                {"type": "group_removed", "group_id": "g2"}
            ]
        }"#;

        let batch: EventBatch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.cursor, 42);
        assert_eq!(batch.events.len(), 4);

        let events: Vec<InboundEvent> =
            batch.events.into_iter().map(InboundEvent::from).collect();
        match &events[1] {
            InboundEvent::Message {
                group_id,
                member_id,
                reply_to,
                from_bot,
                ..
            } => {
                assert_eq!(group_id.as_deref(), Some("g1"));
                assert_eq!(member_id, "alice");
                assert_eq!(reply_to, "chan-1");
                assert!(!from_bot);
            }
            other => panic!("expected a message event, got {other:?}"),
        }
        assert!(matches!(
            &events[2],
            InboundEvent::Message { from_bot: true, .. }
        ));
    }
}
