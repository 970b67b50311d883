//! Scheduling and cancellation operations.

use chrono::{DateTime, Utc};
use database::models::{JobStatus, MessageType, ScheduledMessage};
use database::{contact, scheduled_message};
use dispatcher::OutboundContent;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;
use whatsapp_gateway::window;

use crate::error::{Result, SchedulerError};

/// Result of scheduling a campaign broadcast.
#[derive(Debug, Clone)]
pub struct CampaignSchedule {
    /// One job per consenting contact.
    pub job_ids: Vec<String>,
    /// The effective send time after clamping to the gateway window.
    pub scheduled_for: DateTime<Utc>,
}

/// Fan a campaign out to every consenting contact of a restaurant.
///
/// Campaign broadcasts may ride the gateway's own "send later" feature,
/// so the requested time is clamped into the gateway's allowed window
/// (minimum lead, maximum horizon). Content is copied onto each job at
/// schedule time.
pub async fn schedule_campaign(
    pool: &SqlitePool,
    restaurant_id: &str,
    campaign_id: &str,
    content: &OutboundContent,
    requested_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<CampaignSchedule> {
    let scheduled_for = window::clamp_to_window(now, requested_at);
    let body = dispatcher::body_with_cta(content);

    let recipients = contact::list_consenting(pool, restaurant_id).await?;
    let mut job_ids = Vec::with_capacity(recipients.len());

    for recipient in &recipients {
        let job = ScheduledMessage {
            id: Uuid::new_v4().to_string(),
            restaurant_id: restaurant_id.to_string(),
            interaction_id: None,
            campaign_id: Some(campaign_id.to_string()),
            phone: recipient.phone.clone(),
            customer_name: recipient.name.clone(),
            message_type: MessageType::Campaign,
            body: Some(body.clone()),
            media_url: content.media_url.clone(),
            legacy_template_id: None,
            template_variables: None,
            scheduled_for,
            status: JobStatus::Pending,
            lease_expires_at: None,
            sent_at: None,
            delivery_id: None,
            error_message: None,
            retry_count: 0,
            max_retries: 3,
            created_at: now,
            updated_at: now,
        };
        scheduled_message::create_job(pool, &job).await?;
        job_ids.push(job.id);
    }

    info!(
        restaurant_id,
        campaign_id,
        recipients = job_ids.len(),
        scheduled_for = %scheduled_for,
        "Campaign scheduled"
    );

    Ok(CampaignSchedule {
        job_ids,
        scheduled_for,
    })
}

/// Cancel a single job.
///
/// Only valid while the job is still pending; any other status is an
/// [`SchedulerError::InvalidTransition`]. Cancellation is a status
/// transition, never a delete.
pub async fn cancel_job(pool: &SqlitePool, id: &str, now: DateTime<Utc>) -> Result<ScheduledMessage> {
    if scheduled_message::cancel(pool, id, now).await? {
        return scheduled_message::get_job(pool, id).await.map_err(Into::into);
    }

    // Cancellation lost to an earlier transition; report what the job
    // actually is now.
    let job = scheduled_message::get_job(pool, id).await?;
    Err(SchedulerError::InvalidTransition {
        id: id.to_string(),
        status: job.status,
    })
}

/// Cancel every pending job of a campaign (campaign deletion).
pub async fn cancel_campaign(pool: &SqlitePool, campaign_id: &str, now: DateTime<Utc>) -> Result<u64> {
    let cancelled = scheduled_message::cancel_pending_for_campaign(pool, campaign_id, now).await?;
    info!(campaign_id, cancelled, "Campaign jobs cancelled");
    Ok(cancelled)
}

/// Cancel every pending job of a restaurant (bot deactivation).
pub async fn cancel_restaurant_jobs(
    pool: &SqlitePool,
    restaurant_id: &str,
    now: DateTime<Utc>,
) -> Result<u64> {
    let cancelled =
        scheduled_message::cancel_pending_for_restaurant(pool, restaurant_id, now).await?;
    info!(restaurant_id, cancelled, "Restaurant jobs cancelled");
    Ok(cancelled)
}
