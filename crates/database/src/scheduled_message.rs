//! Scheduled message operations.
//!
//! All state transitions are conditional UPDATEs keyed on the current
//! status, so concurrent pollers race on `rows_affected` rather than on
//! reads. The winner of a `claim` holds a lease; everything else observes
//! a `false` return and moves on.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{JobStatus, ScheduledMessage};

const COLUMNS: &str = "id, restaurant_id, interaction_id, campaign_id, phone, customer_name, \
     message_type, body, media_url, legacy_template_id, template_variables, \
     scheduled_for, status, lease_expires_at, sent_at, delivery_id, \
     error_message, retry_count, max_retries, created_at, updated_at";

/// Persist a new job.
pub async fn create_job(pool: &SqlitePool, job: &ScheduledMessage) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO scheduled_messages (
            id, restaurant_id, interaction_id, campaign_id, phone,
            customer_name, message_type, body, media_url, legacy_template_id,
            template_variables, scheduled_for, status, lease_expires_at,
            sent_at, delivery_id, error_message, retry_count, max_retries,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&job.id)
    .bind(&job.restaurant_id)
    .bind(&job.interaction_id)
    .bind(&job.campaign_id)
    .bind(&job.phone)
    .bind(&job.customer_name)
    .bind(job.message_type)
    .bind(&job.body)
    .bind(&job.media_url)
    .bind(&job.legacy_template_id)
    .bind(&job.template_variables)
    .bind(job.scheduled_for)
    .bind(job.status)
    .bind(job.lease_expires_at)
    .bind(job.sent_at)
    .bind(&job.delivery_id)
    .bind(&job.error_message)
    .bind(job.retry_count)
    .bind(job.max_retries)
    .bind(job.created_at)
    .bind(job.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a job by ID.
pub async fn get_job(pool: &SqlitePool, id: &str) -> Result<ScheduledMessage> {
    sqlx::query_as::<_, ScheduledMessage>(&format!(
        "SELECT {COLUMNS} FROM scheduled_messages WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "ScheduledMessage",
        id: id.to_string(),
    })
}

/// All jobs eligible for dispatch: pending and past their scheduled time.
pub async fn find_due(
    pool: &SqlitePool,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<ScheduledMessage>> {
    let jobs = sqlx::query_as::<_, ScheduledMessage>(&format!(
        "SELECT {COLUMNS} FROM scheduled_messages
         WHERE status = 'pending' AND scheduled_for <= ?
         ORDER BY scheduled_for
         LIMIT ?"
    ))
    .bind(now)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(jobs)
}

/// Atomically claim a pending job for dispatch.
///
/// Returns `true` iff this caller won the claim. A second concurrent
/// caller sees `false` because the status guard no longer matches.
pub async fn claim(
    pool: &SqlitePool,
    id: &str,
    lease_until: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE scheduled_messages
        SET status = 'dispatching', lease_expires_at = ?, updated_at = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(lease_until)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Return crashed claims to the queue.
///
/// A `dispatching` row whose lease has expired belongs to a worker that
/// died mid-send; it goes back to `pending` so another poller can pick
/// it up.
pub async fn release_expired_leases(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE scheduled_messages
        SET status = 'pending', lease_expires_at = NULL, updated_at = ?
        WHERE status = 'dispatching' AND lease_expires_at <= ?
        "#,
    )
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Transition a claimed job to `sent`.
pub async fn mark_sent(
    pool: &SqlitePool,
    id: &str,
    delivery_id: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE scheduled_messages
        SET status = 'sent', sent_at = ?, delivery_id = ?,
            lease_expires_at = NULL, updated_at = ?
        WHERE id = ? AND status = 'dispatching'
        "#,
    )
    .bind(now)
    .bind(delivery_id)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Record a failed attempt and requeue the claimed job for a later retry.
pub async fn retry_later(
    pool: &SqlitePool,
    id: &str,
    error: &str,
    scheduled_for: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE scheduled_messages
        SET status = 'pending', retry_count = retry_count + 1,
            error_message = ?, scheduled_for = ?,
            lease_expires_at = NULL, updated_at = ?
        WHERE id = ? AND status = 'dispatching'
        "#,
    )
    .bind(error)
    .bind(scheduled_for)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Record a failed attempt and transition the claimed job to terminal
/// `failed`.
pub async fn mark_failed(
    pool: &SqlitePool,
    id: &str,
    error: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE scheduled_messages
        SET status = 'failed', retry_count = retry_count + 1,
            error_message = ?, lease_expires_at = NULL, updated_at = ?
        WHERE id = ? AND status = 'dispatching'
        "#,
    )
    .bind(error)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Push a claimed job to a later time without consuming a retry.
///
/// Used by the messaging-hours gate when dispatch would land outside the
/// restaurant's window.
pub async fn defer(
    pool: &SqlitePool,
    id: &str,
    scheduled_for: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE scheduled_messages
        SET status = 'pending', scheduled_for = ?,
            lease_expires_at = NULL, updated_at = ?
        WHERE id = ? AND status = 'dispatching'
        "#,
    )
    .bind(scheduled_for)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Cancel a job. Only valid while it is still pending.
pub async fn cancel(pool: &SqlitePool, id: &str, now: DateTime<Utc>) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE scheduled_messages
        SET status = 'cancelled', updated_at = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Cancel every pending job of a campaign. Returns the number cancelled.
pub async fn cancel_pending_for_campaign(
    pool: &SqlitePool,
    campaign_id: &str,
    now: DateTime<Utc>,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE scheduled_messages
        SET status = 'cancelled', updated_at = ?
        WHERE campaign_id = ? AND status = 'pending'
        "#,
    )
    .bind(now)
    .bind(campaign_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Cancel every pending job of a restaurant (bot deactivation).
pub async fn cancel_pending_for_restaurant(
    pool: &SqlitePool,
    restaurant_id: &str,
    now: DateTime<Utc>,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE scheduled_messages
        SET status = 'cancelled', updated_at = ?
        WHERE restaurant_id = ? AND status = 'pending'
        "#,
    )
    .bind(now)
    .bind(restaurant_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Job counts per status, for the operational surface.
pub async fn status_counts(pool: &SqlitePool) -> Result<Vec<(JobStatus, i64)>> {
    let counts = sqlx::query_as::<_, (JobStatus, i64)>(
        r#"
        SELECT status, COUNT(*)
        FROM scheduled_messages
        GROUP BY status
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(counts)
}
