//! Applies inbound submissions and roster changes to a standup.
//!
//! Every operation is a read-modify-write of the full entity against the
//! registry. Two concurrent submits for the same member are
//! last-write-wins, as is a submit racing the flush reset.

use crate::model::Standup;
use crate::store::{StandupStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// No standup is configured for the group.
    #[error("no standup configured for this group")]
    NotFound,
    /// The member is not on the roster. Rejected, never auto-enrolled.
    #[error("member is not part of this standup")]
    NotAMember,
    #[error(transparent)]
    Store(StoreError),
}

fn fetch(store: &StandupStore, group_id: &str) -> Result<Standup, SubmitError> {
    match store.get(group_id) {
        Ok(standup) => Ok(standup),
        Err(StoreError::NotFound) => Err(SubmitError::NotFound),
        Err(e) => Err(SubmitError::Store(e)),
    }
}

/// Record a member's response for the current cycle. A repeat submission
/// replaces the earlier text; only the final value is reported.
pub fn submit(
    store: &StandupStore,
    group_id: &str,
    member_id: &str,
    text: &str,
) -> Result<(), SubmitError> {
    let mut standup = fetch(store, group_id)?;
    if !standup.is_member(member_id) {
        return Err(SubmitError::NotAMember);
    }
    standup.record_response(member_id, text);
    store.save(&standup).map_err(SubmitError::Store)?;
    tracing::debug!(group = group_id, member = member_id, "response recorded");
    Ok(())
}

/// Enroll a member. Returns false (and writes nothing) when already
/// enrolled.
pub fn add_member(
    store: &StandupStore,
    group_id: &str,
    member_id: &str,
) -> Result<bool, SubmitError> {
    let mut standup = fetch(store, group_id)?;
    if !standup.add_member(member_id) {
        return Ok(false);
    }
    store.save(&standup).map_err(SubmitError::Store)?;
    tracing::info!(group = group_id, member = member_id, "member added");
    Ok(true)
}

/// Drop a member from the roster. Returns false when not enrolled. Any
/// response they already submitted stays until the next flush.
pub fn remove_member(
    store: &StandupStore,
    group_id: &str,
    member_id: &str,
) -> Result<bool, SubmitError> {
    let mut standup = fetch(store, group_id)?;
    if !standup.remove_member(member_id) {
        return Ok(false);
    }
    store.save(&standup).map_err(SubmitError::Store)?;
    tracing::info!(group = group_id, member = member_id, "member removed");
    Ok(true)
}
