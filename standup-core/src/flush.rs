//! The scheduled flush pass: report each standup's cycle, then reset it.

use crate::model::Standup;
use crate::report::Report;
use crate::store::{StandupStore, StoreError};
use crate::transport::ChatTransport;

/// What a single flush pass did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FlushOutcome {
    /// Standups whose report was sent and whose cycle was reset.
    pub reported: usize,
    /// Standups skipped after a send or save failure.
    pub failed: usize,
}

/// Run one flush pass over a snapshot of every standup.
///
/// Per entity: partition the roster, send the report to the group's
/// report channel, clear the collected responses, persist. One entity's
/// failure is logged and counted but never aborts the rest of the pass.
/// A failure between send and save means the same responses get reported
/// again next cycle — accepted, there is no transaction spanning both.
pub async fn run_flush<T: ChatTransport>(store: &StandupStore, transport: &T) -> FlushOutcome {
    let standups = match store.list_all() {
        Ok(standups) => standups,
        Err(e) => {
            tracing::error!(error = %e, "flush: could not list standups");
            return FlushOutcome::default();
        }
    };

    let mut outcome = FlushOutcome::default();
    for mut standup in standups {
        match flush_one(store, transport, &mut standup).await {
            Ok(()) => outcome.reported += 1,
            Err(e) => {
                tracing::error!(group = %standup.group_id, error = %e, "flush: standup skipped");
                outcome.failed += 1;
            }
        }
    }

    tracing::info!(
        reported = outcome.reported,
        failed = outcome.failed,
        "flush pass complete"
    );
    outcome
}

async fn flush_one<T: ChatTransport>(
    store: &StandupStore,
    transport: &T,
    standup: &mut Standup,
) -> anyhow::Result<()> {
    let report = Report::for_standup(standup);
    transport
        .send_message(&standup.report_channel_id, &report.render())
        .await?;

    standup.clear_responses();
    match store.save(standup) {
        Ok(()) => Ok(()),
        // The group was deleted while we were reporting; nothing to reset.
        Err(StoreError::NotFound) => {
            tracing::debug!(group = %standup.group_id, "flush: standup vanished before reset");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
