//! Standup orchestration engine.
//!
//! Coordinates asynchronous daily check-ins for groups of members. Each
//! group gets one [`model::Standup`] entity holding its roster and the
//! responses collected so far this cycle; members submit free-text updates
//! at any time, and a scheduled weekday job posts the aggregated report
//! (who answered, who did not) to the group's report channel, then resets
//! the cycle.
//!
//! The engine owns no platform specifics: outbound messaging goes through
//! [`transport::ChatTransport`], and every component is handed the
//! [`store::StandupStore`] it operates on.

pub mod collector;
pub mod flush;
pub mod lifecycle;
pub mod model;
pub mod report;
pub mod schedule;
pub mod store;
pub mod transport;
