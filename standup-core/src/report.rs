//! Text formatting for report channels.

use crate::model::Standup;

/// Format a member id as a platform mention.
pub fn mention(member_id: &str) -> String {
    format!("<@{member_id}>")
}

/// A flush report for one standup: who answered, who is missing.
#[derive(Debug, Clone)]
pub struct Report {
    /// (member, response text) pairs, in roster order.
    pub responders: Vec<(String, String)>,
    /// Members with no response this cycle, in roster order.
    pub missing: Vec<String>,
}

impl Report {
    pub fn for_standup(standup: &Standup) -> Self {
        let (responders, missing) = standup.partition();
        Self { responders, missing }
    }

    /// Render the report payload: a title, the MIA line, then one block
    /// per responder. The MIA line always appears — a shrug when nobody
    /// is missing.
    pub fn render(&self) -> String {
        let mut lines = vec!["Daily Standup".to_string()];

        let mut mia = String::from("MIA: ");
        if self.missing.is_empty() {
            mia.push_str("🤷");
        } else {
            let mentions: Vec<String> = self.missing.iter().map(|m| mention(m)).collect();
            mia.push_str(&mentions.join(" "));
        }
        lines.push(mia);

        for (member, text) in &self.responders {
            lines.push(mention(member));
            lines.push(text.clone());
        }

        lines.join("\n")
    }
}

/// One-time welcome posted to a freshly created report channel.
pub fn intro_message(prefix: &str) -> String {
    [
        "Daily Standup 🎉".to_string(),
        "This is the newly generated channel used for daily standups!".to_string(),
        format!(
            "Any time before the report goes out, send `{prefix}show` to see the prompt \
             and `{prefix}reply [group] <your update>` to answer. At the scheduled time \
             the collected answers land here and the cycle starts over."
        ),
        format!(
            "There are no members in the standup yet — add one with `{prefix}am <member>`. \
             For everything else, try `{prefix}help`."
        ),
    ]
    .join("\n")
}
