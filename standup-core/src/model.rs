//! The standup entity — one per group.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A group's standup state for the current collection cycle.
///
/// `members` preserves enrollment order for display and allows no
/// duplicates. `responses` holds the latest text per member for the
/// current, unflushed cycle; a later submit fully replaces an earlier one.
/// A submit racing a flush on the same entity is last-write-wins — the
/// store serializes individual reads and writes but not the
/// read-modify-write sequence around them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Standup {
    /// Owning group id. Primary key, stable for the group's lifetime.
    pub group_id: String,
    /// Destination channel for scheduled reports. Set once at creation.
    pub report_channel_id: String,
    /// Enrolled members, in enrollment order.
    pub members: Vec<String>,
    /// Latest response per member for the current cycle.
    pub responses: HashMap<String, String>,
}

impl Standup {
    /// A fresh entity with an empty roster and no responses.
    pub fn new(group_id: &str, report_channel_id: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            report_channel_id: report_channel_id.to_string(),
            members: Vec::new(),
            responses: HashMap::new(),
        }
    }

    pub fn is_member(&self, member_id: &str) -> bool {
        self.members.iter().any(|m| m == member_id)
    }

    /// Enroll a member. Returns false if already on the roster.
    pub fn add_member(&mut self, member_id: &str) -> bool {
        if self.is_member(member_id) {
            return false;
        }
        self.members.push(member_id.to_string());
        true
    }

    /// Drop a member from the roster. Returns false if not enrolled.
    /// A response the member already submitted stays in `responses` until
    /// the next flush.
    pub fn remove_member(&mut self, member_id: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != member_id);
        self.members.len() < before
    }

    /// Record the member's response for this cycle, replacing any earlier
    /// one. Membership is the caller's concern (checked at submit time).
    pub fn record_response(&mut self, member_id: &str, text: &str) {
        self.responses
            .insert(member_id.to_string(), text.to_string());
    }

    /// Split the roster into (responded, missing), both in roster order.
    pub fn partition(&self) -> (Vec<(String, String)>, Vec<String>) {
        let mut responded = Vec::new();
        let mut missing = Vec::new();
        for member in &self.members {
            match self.responses.get(member) {
                Some(text) => responded.push((member.clone(), text.clone())),
                None => missing.push(member.clone()),
            }
        }
        (responded, missing)
    }

    /// Reset the cycle. Clears the whole map, including entries left by
    /// members removed since they submitted.
    pub fn clear_responses(&mut self) {
        self.responses.clear();
    }
}
