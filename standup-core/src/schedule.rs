//! When the flush fires: a cron expression evaluated in a fixed timezone.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;

use crate::flush;
use crate::store::StandupStore;
use crate::transport::ChatTransport;

/// Default window: 12:00 local, Monday through Friday. Named days — the
/// `cron` crate numbers the week from Sunday, not Monday.
pub const DEFAULT_CRON: &str = "0 12 * * Mon-Fri";
pub const DEFAULT_TIMEZONE: &str = "America/Argentina/Buenos_Aires";

/// The report trigger: a five-field cron expression and the IANA timezone
/// it is evaluated in.
#[derive(Debug, Clone)]
pub struct ReportSchedule {
    pub cron: String,
    pub timezone: String,
}

impl Default for ReportSchedule {
    fn default() -> Self {
        Self {
            cron: DEFAULT_CRON.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

impl ReportSchedule {
    fn schedule(&self) -> Result<Schedule> {
        parse_cron(&self.cron)
    }

    fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| anyhow!("invalid timezone: {}", self.timezone))
    }

    /// The first fire instant strictly after `now`.
    pub fn next_fire_after(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let schedule = self.schedule()?;
        let tz = self.tz()?;
        let next = schedule
            .after(&now.with_timezone(&tz))
            .next()
            .ok_or_else(|| anyhow!("no upcoming fire time"))?;
        Ok(next.with_timezone(&Utc))
    }

    pub fn next_fire(&self) -> Result<DateTime<Utc>> {
        self.next_fire_after(Utc::now())
    }
}

/// Parse a five-field cron expression. The `cron` crate wants six fields
/// (with seconds), so prepend a zero.
pub fn parse_cron(expr: &str) -> Result<Schedule> {
    format!("0 {expr}")
        .parse::<Schedule>()
        .with_context(|| format!("invalid cron expression '{expr}'"))
}

/// Drive flush passes forever: sleep until the next fire instant, run one
/// pass, repeat. Dependencies are handed in explicitly; nothing ambient.
///
/// Each iteration advances from the previous fire instant, so a wake-up
/// that lands a hair early never runs the same instant twice.
pub async fn run<T: ChatTransport>(
    schedule: &ReportSchedule,
    store: &StandupStore,
    transport: &T,
) -> Result<()> {
    let mut after = Utc::now();
    loop {
        let next = schedule.next_fire_after(after)?;
        let wait = (next - Utc::now()).to_std().unwrap_or_default();
        tracing::info!(at = %next, "next standup report scheduled");
        tokio::time::sleep(wait).await;

        flush::run_flush(store, transport).await;
        after = next;
    }
}
