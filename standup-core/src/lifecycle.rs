//! Group onboarding and offboarding.

use anyhow::{Context, Result};

use crate::report;
use crate::store::{StandupStore, StoreError};
use crate::transport::ChatTransport;

/// Handle the bot being added to a group: create the dedicated report
/// channel, register the standup entity, and post the one-time welcome.
///
/// If the registry rejects the entity after the channel was created (a
/// duplicate onboarding event, usually), the channel is left orphaned —
/// there is no compensating cleanup, only a distinct log line so the
/// inconsistency is operable.
pub async fn group_created<T: ChatTransport>(
    store: &StandupStore,
    transport: &T,
    group_id: &str,
    prefix: &str,
) -> Result<()> {
    let channel_id = transport
        .create_channel(group_id)
        .await
        .context("failed to create report channel")?;

    if let Err(e) = store.create(group_id, &channel_id) {
        tracing::warn!(
            group = group_id,
            channel = %channel_id,
            error = %e,
            "standup entity not registered; report channel is orphaned"
        );
        return Err(e).context("failed to register standup");
    }

    transport
        .send_message(&channel_id, &report::intro_message(prefix))
        .await
        .context("failed to send welcome message")?;

    tracing::info!(group = group_id, channel = %channel_id, "standup created");
    Ok(())
}

/// Handle the bot being removed from a group. Idempotent; the report
/// channel itself is torn down by the platform, not by us.
pub fn group_removed(store: &StandupStore, group_id: &str) -> Result<(), StoreError> {
    store.delete(group_id)?;
    tracing::info!(group = group_id, "standup removed");
    Ok(())
}
