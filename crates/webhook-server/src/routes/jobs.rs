//! Operational job routes, consumed by the administration layer.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use database::models::ScheduledMessage;
use database::scheduled_message;
use serde::Serialize;

use crate::error::Result;
use crate::state::AppState;

/// A job as exposed on the operational surface.
#[derive(Debug, Serialize)]
pub struct JobInfo {
    pub id: String,
    pub restaurant_id: String,
    pub campaign_id: Option<String>,
    pub message_type: database::MessageType,
    pub status: database::JobStatus,
    pub scheduled_for: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivery_id: Option<String>,
    pub error_message: Option<String>,
    pub retry_count: i64,
    pub max_retries: i64,
}

impl From<ScheduledMessage> for JobInfo {
    fn from(job: ScheduledMessage) -> Self {
        Self {
            id: job.id,
            restaurant_id: job.restaurant_id,
            campaign_id: job.campaign_id,
            message_type: job.message_type,
            status: job.status,
            scheduled_for: job.scheduled_for,
            sent_at: job.sent_at,
            delivery_id: job.delivery_id,
            error_message: job.error_message,
            retry_count: job.retry_count,
            max_retries: job.max_retries,
        }
    }
}

/// Due jobs plus queue-wide counts.
#[derive(Debug, Serialize)]
pub struct DueResponse {
    pub counts: Vec<StatusCount>,
    pub due: Vec<JobInfo>,
}

/// Jobs in one status.
#[derive(Debug, Serialize)]
pub struct StatusCount {
    pub status: database::JobStatus,
    pub count: i64,
}

/// List jobs currently eligible for dispatch.
pub async fn due_api(State(state): State<AppState>) -> Result<Json<DueResponse>> {
    let pool = state.db.pool();
    let now = Utc::now();

    let counts = scheduled_message::status_counts(pool)
        .await?
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect();
    let due = scheduled_message::find_due(pool, now, 200)
        .await?
        .into_iter()
        .map(JobInfo::from)
        .collect();

    Ok(Json(DueResponse { counts, due }))
}

/// Get a job's status by id.
pub async fn status_api(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobInfo>> {
    let job = scheduled_message::get_job(state.db.pool(), &id).await?;
    Ok(Json(job.into()))
}

/// Cancel a job while it is still pending.
pub async fn cancel_api(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobInfo>> {
    let job = scheduler::cancel_job(state.db.pool(), &id, Utc::now()).await?;
    Ok(Json(job.into()))
}
