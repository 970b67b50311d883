//! Campaign scheduling routes.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use dispatcher::OutboundContent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::state::AppState;

/// Request to schedule a campaign broadcast.
#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    /// Restaurant whose consenting contacts receive the broadcast.
    pub restaurant_id: String,
    /// Campaign identifier; generated when absent.
    pub campaign_id: Option<String>,
    /// Body template.
    pub body: String,
    /// Media attachment URL.
    pub media_url: Option<String>,
    /// Call-to-action link.
    pub cta_url: Option<String>,
    /// Call-to-action label.
    pub cta_text: Option<String>,
    /// Requested send time; clamped to the gateway scheduling window.
    pub send_at: DateTime<Utc>,
}

/// Response for a scheduled campaign.
#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub campaign_id: String,
    pub scheduled: usize,
    pub scheduled_for: DateTime<Utc>,
}

/// Response for a cancelled campaign.
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub campaign_id: String,
    pub cancelled: u64,
}

/// Fan a campaign out to all consenting contacts.
pub async fn schedule_api(
    State(state): State<AppState>,
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<ScheduleResponse>> {
    // The restaurant must exist; surfaces as 404 otherwise.
    database::restaurant::get_restaurant(state.db.pool(), &request.restaurant_id).await?;

    let campaign_id = request
        .campaign_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let content = OutboundContent {
        body: request.body,
        media_url: request.media_url,
        cta_url: request.cta_url,
        cta_text: request.cta_text,
    };

    let schedule = scheduler::schedule_campaign(
        state.db.pool(),
        &request.restaurant_id,
        &campaign_id,
        &content,
        request.send_at,
        Utc::now(),
    )
    .await?;

    Ok(Json(ScheduleResponse {
        campaign_id,
        scheduled: schedule.job_ids.len(),
        scheduled_for: schedule.scheduled_for,
    }))
}

/// Cancel a campaign's pending jobs (campaign deletion).
pub async fn cancel_api(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CancelResponse>> {
    let cancelled = scheduler::cancel_campaign(state.db.pool(), &id, Utc::now()).await?;
    Ok(Json(CancelResponse {
        campaign_id: id,
        cancelled,
    }))
}
