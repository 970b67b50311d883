//! Claiming and dispatching due jobs.

use std::collections::HashMap;

use bot_engine::contacts::phone_hash;
use chrono::{DateTime, Duration, Utc};
use database::models::{Restaurant, ScheduledMessage};
use database::{bot_config, contact, restaurant, scheduled_message};
use dispatcher::{deliver, DeliveryOutcome, MessageSender, OutboundContent, TemplateVars};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::hours;

/// Base spacing between retry attempts; multiplied by the attempt number.
const RETRY_BACKOFF_MINUTES: i64 = 5;

/// What happened to one claimed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    /// Delivered to the gateway.
    Sent {
        /// Gateway delivery identifier.
        delivery_id: String,
    },
    /// Dispatch time fell outside the messaging-hours window; the job
    /// went back to pending at the next opening.
    Deferred {
        /// When the job becomes eligible again.
        until: DateTime<Utc>,
    },
    /// The send failed and the job was requeued for another attempt.
    Retrying {
        /// Failed attempts so far.
        attempt: i64,
        /// When the next attempt becomes eligible.
        next_attempt_at: DateTime<Utc>,
    },
    /// The send failed with no retries left; terminal.
    Failed {
        /// Last gateway error.
        error: String,
    },
    /// Another poller claimed the job first.
    Skipped,
}

/// Claim and dispatch a single due job.
///
/// The claim is an atomic conditional update; losing it is a normal
/// outcome ([`DispatchResult::Skipped`]), which is what makes concurrent
/// pollers safe against double sends.
pub async fn run_job(
    pool: &SqlitePool,
    sender: &dyn MessageSender,
    job: &ScheduledMessage,
    lease: Duration,
    now: DateTime<Utc>,
) -> Result<DispatchResult> {
    if !scheduled_message::claim(pool, &job.id, now + lease, now).await? {
        debug!(job_id = %job.id, "Job already claimed; skipping");
        return Ok(DispatchResult::Skipped);
    }

    let owner = restaurant::get_restaurant(pool, &job.restaurant_id).await?;

    // Gate on dispatch time, not schedule time; backlog can shift a job
    // across the window boundary.
    if let Some(config) = bot_config::find_active_for_restaurant(pool, &job.restaurant_id).await? {
        let allowed_at = hours::next_dispatch_time(&config, now);
        if allowed_at > now {
            scheduled_message::defer(pool, &job.id, allowed_at, now).await?;
            info!(job_id = %job.id, until = %allowed_at, "Outside messaging hours; deferred");
            return Ok(DispatchResult::Deferred { until: allowed_at });
        }
    }

    let content = job_content(pool, &owner, job).await?;
    let vars = job_vars(job, &owner.name);

    match deliver(sender, &job.phone, &content, &vars).await {
        DeliveryOutcome::Sent { delivery_id } => {
            if !scheduled_message::mark_sent(pool, &job.id, &delivery_id, now).await? {
                // Lease was reaped mid-send; the message went out, so the
                // record must still reflect it for the operator.
                warn!(job_id = %job.id, "Sent but claim was lost; job state may lag");
            }
            info!(job_id = %job.id, delivery_id = %delivery_id, "Job dispatched");
            Ok(DispatchResult::Sent { delivery_id })
        }
        DeliveryOutcome::Failed { error } => {
            let attempt = job.retry_count + 1;
            if attempt < job.max_retries {
                let next_attempt_at = now + Duration::minutes(RETRY_BACKOFF_MINUTES * attempt);
                scheduled_message::retry_later(pool, &job.id, &error, next_attempt_at, now).await?;
                warn!(
                    job_id = %job.id,
                    attempt,
                    next_attempt_at = %next_attempt_at,
                    error = %error,
                    "Dispatch failed; will retry"
                );
                Ok(DispatchResult::Retrying {
                    attempt,
                    next_attempt_at,
                })
            } else {
                scheduled_message::mark_failed(pool, &job.id, &error, now).await?;
                warn!(job_id = %job.id, error = %error, "Dispatch failed; retries exhausted");
                Ok(DispatchResult::Failed { error })
            }
        }
    }
}

/// Content for a job: embedded at schedule time for current-system jobs,
/// resolved through the cascade for legacy jobs that carry none.
async fn job_content(
    pool: &SqlitePool,
    owner: &Restaurant,
    job: &ScheduledMessage,
) -> Result<OutboundContent> {
    if let Some(body) = &job.body {
        return Ok(OutboundContent {
            body: body.clone(),
            media_url: job.media_url.clone(),
            cta_url: None,
            cta_text: None,
        });
    }

    let language = match contact::find_by_hash(pool, &owner.id, &phone_hash(&job.phone)).await? {
        Some(contact) => contact.language,
        None => owner.default_language.clone(),
    };

    let resolved = bot_engine::resolve_message(pool, owner, job.message_type, &language).await?;
    Ok(OutboundContent {
        body: dispatcher::body_with_cta(&resolved.content),
        media_url: resolved.content.media_url,
        cta_url: None,
        cta_text: None,
    })
}

/// Template variables for a job, honoring legacy-system variable maps.
fn job_vars(job: &ScheduledMessage, restaurant_name: &str) -> TemplateVars {
    let mut customer_name = job.customer_name.clone();

    if let Some(raw) = &job.template_variables {
        if let Ok(variables) = serde_json::from_str::<HashMap<String, String>>(raw) {
            if let Some(name) = variables.get("customerName") {
                customer_name = name.clone();
            }
        }
    }

    TemplateVars::new(customer_name, restaurant_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_vars_prefers_legacy_variable_map() {
        let now = Utc::now();
        let job = ScheduledMessage {
            id: "j1".to_string(),
            restaurant_id: "r1".to_string(),
            interaction_id: None,
            campaign_id: None,
            phone: "+393331234567".to_string(),
            customer_name: "WhatsApp User".to_string(),
            message_type: database::MessageType::Review,
            body: None,
            media_url: None,
            legacy_template_id: Some("t1".to_string()),
            template_variables: Some(r#"{"customerName":"Marco"}"#.to_string()),
            scheduled_for: now,
            status: database::JobStatus::Pending,
            lease_expires_at: None,
            sent_at: None,
            delivery_id: None,
            error_message: None,
            retry_count: 0,
            max_retries: 3,
            created_at: now,
            updated_at: now,
        };

        let vars = job_vars(&job, "Anna");
        assert_eq!(vars.customer_name, "Marco");
        assert_eq!(vars.restaurant_name, "Anna");
    }
}
