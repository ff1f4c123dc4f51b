//! Command routing: inbound messages become engine calls, engine result
//! codes become user-facing text.
//!
//! The router owns nothing but the command prefix and the prompt text;
//! state changes go through the collector and lifecycle modules.

use anyhow::Result;
use standup_core::collector::{self, SubmitError};
use standup_core::lifecycle;
use standup_core::report;
use standup_core::store::StandupStore;
use standup_core::transport::{ChatTransport, InboundEvent};

pub struct Router {
    prefix: String,
    prompt: String,
}

/// Strip platform mention wrapping from a member argument.
fn member_arg(arg: &str) -> &str {
    arg.trim().trim_start_matches("<@").trim_end_matches('>')
}

impl Router {
    pub fn new(prefix: &str, prompt: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            prompt: prompt.to_string(),
        }
    }

    /// Dispatch one inbound event. Engine failures bubble up to the event
    /// loop, which logs them and moves on to the next event.
    pub async fn handle_event<T: ChatTransport>(
        &self,
        store: &StandupStore,
        transport: &T,
        event: &InboundEvent,
    ) -> Result<()> {
        match event {
            InboundEvent::Message {
                group_id,
                member_id,
                reply_to,
                text,
                from_bot,
            } => {
                if *from_bot {
                    return Ok(());
                }
                self.handle_message(store, transport, group_id.as_deref(), member_id, reply_to, text)
                    .await
            }
            InboundEvent::GroupJoined { group_id } => {
                lifecycle::group_created(store, transport, group_id, &self.prefix).await
            }
            InboundEvent::GroupRemoved { group_id } => {
                lifecycle::group_removed(store, group_id)?;
                Ok(())
            }
        }
    }

    async fn handle_message<T: ChatTransport>(
        &self,
        store: &StandupStore,
        transport: &T,
        group_id: Option<&str>,
        member_id: &str,
        reply_to: &str,
        text: &str,
    ) -> Result<()> {
        let Some(cmd_text) = text.strip_prefix(&self.prefix) else {
            return Ok(());
        };
        let parts: Vec<&str> = cmd_text.trim().splitn(2, ' ').collect();
        let cmd = parts[0].to_lowercase();
        let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

        let reply = match cmd.as_str() {
            "am" => Some(self.add_member(store, group_id, args)),
            "rm" => Some(self.remove_member(store, group_id, args)),
            "reply" | "r" => Some(self.submit(store, group_id, member_id, args)),
            "show" => Some(self.prompt.clone()),
            "help" | "h" => Some(self.help(args)),
            _ => None, // unknown commands stay silent
        };

        if let Some(reply) = reply {
            transport.send_message(reply_to, &reply).await?;
        }
        Ok(())
    }

    fn add_member(&self, store: &StandupStore, group_id: Option<&str>, args: &str) -> String {
        let Some(group_id) = group_id else {
            return "Hmm, that command cannot be used in a direct message.".into();
        };
        if args.is_empty() {
            return format!("Usage: `{}am <member>`", self.prefix);
        }
        let member = member_arg(args);
        match collector::add_member(store, group_id, member) {
            Ok(true) => format!("Added {} to the standup. 🎉", report::mention(member)),
            Ok(false) => format!("{} is already in the standup.", report::mention(member)),
            Err(e) => self.engine_error(e),
        }
    }

    fn remove_member(&self, store: &StandupStore, group_id: Option<&str>, args: &str) -> String {
        let Some(group_id) = group_id else {
            return "Hmm, that command cannot be used in a direct message.".into();
        };
        if args.is_empty() {
            return format!("Usage: `{}rm <member>`", self.prefix);
        }
        let member = member_arg(args);
        match collector::remove_member(store, group_id, member) {
            Ok(true) => format!("Removed {} from the standup.", report::mention(member)),
            Ok(false) => format!("{} is not in the standup.", report::mention(member)),
            Err(e) => self.engine_error(e),
        }
    }

    fn submit(
        &self,
        store: &StandupStore,
        channel_group: Option<&str>,
        member_id: &str,
        args: &str,
    ) -> String {
        if args.is_empty() {
            return format!("Usage: `{}reply [group] <your update>`", self.prefix);
        }

        let memberships = match store.find_for_member(member_id) {
            Ok(memberships) => memberships,
            Err(e) => {
                tracing::error!(member = member_id, error = %e, "membership lookup failed");
                return "Something went wrong on my end — try again in a bit.".into();
            }
        };

        // An explicit group argument wins; then the channel's group; then
        // the member's sole standup.
        let mut split = args.splitn(2, ' ');
        let first = split.next().unwrap_or("");
        let rest = split.next().map(str::trim).unwrap_or("");

        let (target, text) = if !rest.is_empty() && memberships.iter().any(|s| s.group_id == first)
        {
            (first.to_string(), rest)
        } else if let Some(group) = channel_group {
            (group.to_string(), args)
        } else {
            match memberships.as_slice() {
                [] => {
                    return "You are not part of any standup yet — ask a teammate to add you."
                        .into();
                }
                [only] => (only.group_id.clone(), args),
                several => {
                    let groups: Vec<&str> =
                        several.iter().map(|s| s.group_id.as_str()).collect();
                    return format!(
                        "You belong to several standups ({}). Start your reply with the group: \
                         `{}reply <group> <your update>`",
                        groups.join(", "),
                        self.prefix
                    );
                }
            }
        };

        match collector::submit(store, &target, member_id, text) {
            Ok(()) => {
                "Got it — your response is in. Send it again to revise before the report. ✅"
                    .into()
            }
            Err(e) => self.engine_error(e),
        }
    }

    fn engine_error(&self, err: SubmitError) -> String {
        match err {
            SubmitError::NotFound => "This group has no standup configured.".into(),
            SubmitError::NotAMember => format!(
                "You are not part of this standup — ask a teammate to `{}am` you.",
                self.prefix
            ),
            SubmitError::Store(e) => {
                tracing::error!(error = %e, "registry failure");
                "Something went wrong on my end — try again in a bit.".into()
            }
        }
    }

    fn help(&self, args: &str) -> String {
        let p = &self.prefix;
        if args.is_empty() {
            return [
                "Here's what I can do:".to_string(),
                format!("{p}am <member>          — add a member to this group's standup"),
                format!("{p}rm <member>          — remove a member from the roster"),
                format!("{p}reply [group] <text> — record today's response"),
                format!("{p}show                 — show the standup prompt"),
                format!("{p}help [command]       — this list, or details on one command"),
            ]
            .join("\n");
        }

        let raw = args.split_whitespace().next().unwrap_or("").to_lowercase();
        let name = raw.strip_prefix(p.as_str()).unwrap_or(&raw);
        match name {
            "am" => format!("Adds a member to the standup. Usage: `{p}am <member>`. Group channels only."),
            "rm" => format!("Removes a member from the roster. Usage: `{p}rm <member>`. Group channels only."),
            "reply" | "r" => format!(
                "Records your response for today's standup; send it again to revise. \
                 Usage: `{p}reply [group] <your update>`. The group is only needed when \
                 you belong to several standups."
            ),
            "show" => format!("Shows the standup prompt. Usage: `{p}show`."),
            "help" | "h" => format!("Usage: `{p}help [command]`."),
            _ => format!("Not a command I know. Try `{p}help`."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingTransport {
        fn last(&self) -> Option<(String, String)> {
            self.sent.lock().unwrap().last().cloned()
        }

        fn count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatTransport for RecordingTransport {
        async fn create_channel(&self, group_id: &str) -> Result<String> {
            Ok(format!("chan-{group_id}"))
        }

        async fn send_message(&self, channel_id: &str, text: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((channel_id.to_string(), text.to_string()));
            Ok(())
        }
    }

    fn router() -> Router {
        Router::new("!", "What did you do yesterday, what's next, any blockers?")
    }

    fn message(group: Option<&str>, member: &str, reply_to: &str, text: &str) -> InboundEvent {
        InboundEvent::Message {
            group_id: group.map(str::to_string),
            member_id: member.to_string(),
            reply_to: reply_to.to_string(),
            text: text.to_string(),
            from_bot: false,
        }
    }

    fn seeded(store: &StandupStore, group: &str, members: &[&str]) {
        let mut s = store.create(group, &format!("chan-{group}")).unwrap();
        for m in members {
            s.add_member(m);
        }
        store.save(&s).unwrap();
    }

    #[tokio::test]
    async fn am_enrolls_a_member() {
        let store = StandupStore::open_memory().unwrap();
        let transport = RecordingTransport::default();
        seeded(&store, "g1", &[]);

        router()
            .handle_event(&store, &transport, &message(Some("g1"), "alice", "chan-g1", "!am <@bob>"))
            .await
            .unwrap();

        assert_eq!(store.get("g1").unwrap().members, vec!["bob"]);
        let (channel, text) = transport.last().unwrap();
        assert_eq!(channel, "chan-g1");
        assert!(text.contains("Added <@bob>"));
    }

    #[tokio::test]
    async fn am_is_rejected_in_direct_messages() {
        let store = StandupStore::open_memory().unwrap();
        let transport = RecordingTransport::default();

        router()
            .handle_event(&store, &transport, &message(None, "alice", "dm-1", "!am bob"))
            .await
            .unwrap();

        let (_, text) = transport.last().unwrap();
        assert!(text.contains("cannot be used in a direct message"));
    }

    #[tokio::test]
    async fn reply_in_channel_records_a_response() {
        let store = StandupStore::open_memory().unwrap();
        let transport = RecordingTransport::default();
        seeded(&store, "g1", &["alice"]);

        router()
            .handle_event(
                &store,
                &transport,
                &message(Some("g1"), "alice", "chan-g1", "!reply finished the migration"),
            )
            .await
            .unwrap();

        assert_eq!(
            store.get("g1").unwrap().responses.get("alice").map(String::as_str),
            Some("finished the migration")
        );
    }

    #[tokio::test]
    async fn dm_reply_resolves_a_sole_membership() {
        let store = StandupStore::open_memory().unwrap();
        let transport = RecordingTransport::default();
        seeded(&store, "g1", &["alice"]);

        router()
            .handle_event(
                &store,
                &transport,
                &message(None, "alice", "dm-1", "!reply pairing on the parser"),
            )
            .await
            .unwrap();

        assert_eq!(
            store.get("g1").unwrap().responses.get("alice").map(String::as_str),
            Some("pairing on the parser")
        );
    }

    #[tokio::test]
    async fn dm_reply_with_several_memberships_needs_a_group() {
        let store = StandupStore::open_memory().unwrap();
        let transport = RecordingTransport::default();
        seeded(&store, "g1", &["alice"]);
        seeded(&store, "g2", &["alice"]);

        let r = router();
        r.handle_event(&store, &transport, &message(None, "alice", "dm-1", "!reply hello"))
            .await
            .unwrap();
        let (_, text) = transport.last().unwrap();
        assert!(text.contains("several standups"));
        assert!(store.get("g1").unwrap().responses.is_empty());
        assert!(store.get("g2").unwrap().responses.is_empty());

        // Naming the group up front resolves it.
        r.handle_event(
            &store,
            &transport,
            &message(None, "alice", "dm-1", "!reply g2 shipping the fix"),
        )
        .await
        .unwrap();
        assert_eq!(
            store.get("g2").unwrap().responses.get("alice").map(String::as_str),
            Some("shipping the fix")
        );
    }

    #[tokio::test]
    async fn reply_from_a_non_member_is_rejected() {
        let store = StandupStore::open_memory().unwrap();
        let transport = RecordingTransport::default();
        seeded(&store, "g1", &["alice"]);

        router()
            .handle_event(
                &store,
                &transport,
                &message(Some("g1"), "mallory", "chan-g1", "!reply let me in"),
            )
            .await
            .unwrap();

        let (_, text) = transport.last().unwrap();
        assert!(text.contains("not part of this standup"));
        assert!(store.get("g1").unwrap().responses.is_empty());
    }

    #[tokio::test]
    async fn show_sends_the_prompt() {
        let store = StandupStore::open_memory().unwrap();
        let transport = RecordingTransport::default();

        router()
            .handle_event(&store, &transport, &message(None, "alice", "dm-1", "!show"))
            .await
            .unwrap();

        let (_, text) = transport.last().unwrap();
        assert!(text.contains("yesterday"));
    }

    #[tokio::test]
    async fn help_lists_commands_and_explains_one() {
        let store = StandupStore::open_memory().unwrap();
        let transport = RecordingTransport::default();

        let r = router();
        r.handle_event(&store, &transport, &message(None, "alice", "dm-1", "!help"))
            .await
            .unwrap();
        let (_, listing) = transport.last().unwrap();
        for cmd in ["!am", "!rm", "!reply", "!show", "!help"] {
            assert!(listing.contains(cmd), "listing is missing {cmd}");
        }

        r.handle_event(&store, &transport, &message(None, "alice", "dm-1", "!help reply"))
            .await
            .unwrap();
        let (_, detail) = transport.last().unwrap();
        assert!(detail.contains("`!reply [group] <your update>`"));
    }

    #[tokio::test]
    async fn unknown_and_unprefixed_messages_stay_silent() {
        let store = StandupStore::open_memory().unwrap();
        let transport = RecordingTransport::default();

        let r = router();
        r.handle_event(&store, &transport, &message(Some("g1"), "alice", "chan-g1", "!dance"))
            .await
            .unwrap();
        r.handle_event(
            &store,
            &transport,
            &message(Some("g1"), "alice", "chan-g1", "morning everyone"),
        )
        .await
        .unwrap();

        assert_eq!(transport.count(), 0);
    }

    #[tokio::test]
    async fn bot_messages_never_reach_the_engine() {
        let store = StandupStore::open_memory().unwrap();
        let transport = RecordingTransport::default();

        let event = InboundEvent::Message {
            group_id: None,
            member_id: "other-bot".to_string(),
            reply_to: "dm-1".to_string(),
            text: "!help".to_string(),
            from_bot: true,
        };
        router().handle_event(&store, &transport, &event).await.unwrap();
        assert_eq!(transport.count(), 0);
    }

    #[tokio::test]
    async fn group_events_drive_the_lifecycle() {
        let store = StandupStore::open_memory().unwrap();
        let transport = RecordingTransport::default();

        let r = router();
        r.handle_event(
            &store,
            &transport,
            &InboundEvent::GroupJoined { group_id: "g1".to_string() },
        )
        .await
        .unwrap();
        assert_eq!(store.get("g1").unwrap().report_channel_id, "chan-g1");

        r.handle_event(
            &store,
            &transport,
            &InboundEvent::GroupRemoved { group_id: "g1".to_string() },
        )
        .await
        .unwrap();
        assert!(store.get("g1").is_err());
    }
}
