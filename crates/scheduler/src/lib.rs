//! Durable deferred-delivery scheduler for the Tavola WhatsApp bot.
//!
//! Jobs live in the `scheduled_messages` table and move through a small
//! state machine: `pending → dispatching → sent | failed`, with
//! `cancelled` reachable only from `pending`. Claims are atomic
//! conditional updates guarded by a lease, so multiple poller instances
//! can scan the same queue without double-sending; a crashed claimer's
//! lease expires and its job returns to `pending`.
//!
//! Failed sends are requeued with a backoff until `max_retries` attempts
//! have been consumed, then fail terminally. Before any dispatch the
//! restaurant's messaging-hours window is consulted, and out-of-window
//! jobs are deferred to the next opening rather than sent.

pub mod dispatch;
pub mod error;
pub mod hours;
pub mod poller;
pub mod queue;

pub use dispatch::{run_job, DispatchResult};
pub use error::{Result, SchedulerError};
pub use poller::{BatchStats, Poller, PollerConfig};
pub use queue::{cancel_campaign, cancel_job, cancel_restaurant_jobs, schedule_campaign, CampaignSchedule};
