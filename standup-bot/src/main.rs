//! standup-bot: asynchronous daily standups over a chat gateway.
//!
//! Runs as a single process connected to a chat gateway. Keeps one standup
//! per group, collects member responses at any time of day, and posts the
//! aggregated report to each group's standup channel at the scheduled
//! weekday instant. Commands:
//!
//!   !am <member>            — add a member to the standup
//!   !rm <member>            — remove a member from the roster
//!   !reply [group] <text>   — record today's response
//!   !show                   — show the standup prompt
//!   !help                   — list commands
//!
//! Requires a gateway token (GATEWAY_TOKEN environment variable or --token).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use standup_core::schedule::{self, ReportSchedule};
use standup_core::store::StandupStore;

mod gateway;
mod router;

use gateway::Gateway;
use router::Router;

#[derive(Parser)]
#[command(name = "standup-bot", about = "Daily standup bot for chat groups")]
struct Args {
    /// Chat gateway base URL
    #[arg(long, env = "GATEWAY_URL", default_value = "http://localhost:8900")]
    gateway_url: String,

    /// Gateway API token (or set GATEWAY_TOKEN env var)
    #[arg(long, env = "GATEWAY_TOKEN")]
    token: String,

    /// Registry database path
    #[arg(long, default_value = "standups.db")]
    db: PathBuf,

    /// Prompt presented by the show command
    #[arg(
        long,
        default_value = "What did you do yesterday? What will you do today? Any blockers?"
    )]
    prompt: String,

    /// Report time as a five-field cron expression
    #[arg(long, default_value = schedule::DEFAULT_CRON)]
    report_cron: String,

    /// Timezone the report time is evaluated in
    #[arg(long, default_value = schedule::DEFAULT_TIMEZONE)]
    timezone: String,

    /// Command prefix
    #[arg(long, default_value = "!")]
    prefix: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "standup_bot=info,standup_core=info".into()),
        )
        .init();

    let args = Args::parse();

    let report_schedule = ReportSchedule {
        cron: args.report_cron.clone(),
        timezone: args.timezone.clone(),
    };
    // Fail fast on a bad cron expression or timezone.
    report_schedule.next_fire()?;

    let store = Arc::new(StandupStore::open(&args.db)?);
    let transport = Arc::new(Gateway::new(&args.gateway_url, &args.token));
    let router = Router::new(&args.prefix, &args.prompt);

    tracing::info!(
        gateway = %args.gateway_url,
        db = %args.db.display(),
        cron = %args.report_cron,
        timezone = %args.timezone,
        "Starting standup-bot"
    );

    // The report scheduler runs concurrently with inbound handling.
    {
        let store = store.clone();
        let transport = transport.clone();
        tokio::spawn(async move {
            if let Err(e) = schedule::run(&report_schedule, &store, transport.as_ref()).await {
                tracing::error!(error = %e, "report scheduler stopped");
            }
        });
    }

    tracing::info!("Bot running. Ctrl+C to stop.");

    // Event loop: long-poll the gateway, dispatch each event, never let a
    // single event's failure stall the feed.
    let mut cursor = 0u64;
    loop {
        match transport.next_events(cursor).await {
            Ok((events, next_cursor)) => {
                cursor = next_cursor;
                for event in &events {
                    if let Err(e) = router
                        .handle_event(&store, transport.as_ref(), event)
                        .await
                    {
                        tracing::error!(error = %e, "Event handler error");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Gateway poll failed, retrying");
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            }
        }
    }
}
