//! Database models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A restaurant operating a WhatsApp channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Restaurant {
    /// UUID.
    pub id: String,
    /// Display name, substituted into message templates.
    pub name: String,
    /// Number the bot sends from (e.g., "whatsapp:+14155238886").
    pub whatsapp_number: String,
    /// Fallback language for message resolution (e.g., "it").
    pub default_language: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Per-restaurant bot configuration: the trigger word, the review-request
/// delay, and the messaging-hours window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BotConfig {
    /// UUID.
    pub id: String,
    /// Owning restaurant.
    pub restaurant_id: String,
    /// Trigger phrase as entered by the owner.
    pub trigger_phrase: String,
    /// Trimmed + lowercased form used for matching.
    pub trigger_phrase_norm: String,
    /// Soft-delete flag; inactive configs never match.
    pub active: bool,
    /// Minutes between menu delivery and the review request.
    pub review_delay_minutes: i64,
    /// Whether the messaging-hours gate applies.
    pub hours_enabled: bool,
    /// Window start, local hour 0-23.
    pub hours_start: i64,
    /// Window end, local hour 0-23. May be below `hours_start` for
    /// windows that wrap midnight.
    pub hours_end: i64,
    /// Restaurant-local UTC offset, in minutes.
    pub hours_utc_offset_minutes: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Kind of outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// The menu reply to a matched trigger.
    Menu,
    /// The delayed review request.
    Review,
    /// A campaign broadcast send.
    Campaign,
    /// A generic follow-up.
    Followup,
}

impl MessageType {
    /// Stable lowercase name, as stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Menu => "menu",
            MessageType::Review => "review",
            MessageType::Campaign => "campaign",
            MessageType::Followup => "followup",
        }
    }
}

/// Canonical outbound content for a (restaurant, type, language) key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RestaurantMessage {
    /// UUID.
    pub id: String,
    /// Owning restaurant.
    pub restaurant_id: String,
    /// Message kind.
    pub message_type: MessageType,
    /// Language code (e.g., "it").
    pub language: String,
    /// Body template with `{{customerName}}` / `{{restaurantName}}`
    /// placeholders.
    pub body: String,
    /// Media attachment URL, if any.
    pub media_url: Option<String>,
    /// Media kind (e.g., "image", "pdf").
    pub media_kind: Option<String>,
    /// Call-to-action link URL, if any.
    pub cta_url: Option<String>,
    /// Call-to-action label.
    pub cta_text: Option<String>,
    /// Soft-delete flag.
    pub active: bool,
    /// Provenance of the last edit (e.g., "owner", "generator").
    pub modified_by: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A template carried over from the previous notification system.
///
/// Read-only to the bot pipeline; consulted as the second resolution tier
/// for restaurants whose content was never migrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LegacyTemplate {
    /// UUID.
    pub id: String,
    /// Owning restaurant.
    pub restaurant_id: String,
    /// Template name; the semantic kind (menu-like vs review-like) is
    /// inferred from it.
    pub name: String,
    /// Language code.
    pub language: String,
    /// Body text.
    pub body: String,
    /// Media attachment URL, if any.
    pub media_url: Option<String>,
    /// Regulatory approval flag; only approved templates resolve.
    pub approved: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A WhatsApp customer of one restaurant, keyed by hashed phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Contact {
    /// UUID.
    pub id: String,
    /// Owning restaurant.
    pub restaurant_id: String,
    /// Raw phone as last seen (formatting preserved).
    pub phone: String,
    /// SHA-256 hex digest of the digits-only phone.
    pub phone_hash: String,
    /// Display name; starts as the generic placeholder.
    pub name: String,
    /// Classified language code.
    pub language: String,
    /// Number of inbound interactions.
    pub interaction_count: i64,
    /// First contact timestamp.
    pub first_contact_at: DateTime<Utc>,
    /// Most recent contact timestamp.
    pub last_contact_at: DateTime<Utc>,
    /// Marketing consent flag; defaults to opt-in on first contact.
    pub marketing_consent: bool,
    /// How the consent value was established.
    pub consent_source: String,
    /// Free-form tags, JSON array.
    pub tags: String,
}

/// One matched trigger conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Interaction {
    /// UUID.
    pub id: String,
    /// Owning restaurant.
    pub restaurant_id: String,
    /// Contact who triggered the bot.
    pub contact_id: String,
    /// The matched trigger phrase.
    pub trigger_phrase: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Lifecycle state of a scheduled message.
///
/// `pending` jobs may be claimed (`dispatching`) by a poller holding a
/// lease; `sent`, `failed`, and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting for its scheduled time.
    Pending,
    /// Claimed by a poller; lease-protected.
    Dispatching,
    /// Delivered to the gateway.
    Sent,
    /// Exhausted its retries.
    Failed,
    /// Cancelled while still pending.
    Cancelled,
}

impl JobStatus {
    /// Stable lowercase name, as stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Dispatching => "dispatching",
            JobStatus::Sent => "sent",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

/// A durable deferred-delivery job.
///
/// Content is copied in at schedule time; editing the source
/// [`RestaurantMessage`] later does not change an already-scheduled job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ScheduledMessage {
    /// UUID.
    pub id: String,
    /// Owning restaurant.
    pub restaurant_id: String,
    /// Originating interaction, for review follow-ups.
    pub interaction_id: Option<String>,
    /// Originating campaign, for broadcast sends.
    pub campaign_id: Option<String>,
    /// Destination phone.
    pub phone: String,
    /// Customer name for template substitution.
    pub customer_name: String,
    /// Message kind.
    pub message_type: MessageType,
    /// Resolved body; NULL only for legacy-template jobs.
    pub body: Option<String>,
    /// Resolved media URL, if any.
    pub media_url: Option<String>,
    /// Legacy template reference, for jobs created by the old system.
    pub legacy_template_id: Option<String>,
    /// Legacy template variables, JSON object.
    pub template_variables: Option<String>,
    /// When the job becomes eligible for dispatch.
    pub scheduled_for: DateTime<Utc>,
    /// Lifecycle state.
    pub status: JobStatus,
    /// Lease expiry while `dispatching`; an expired lease returns the job
    /// to `pending`.
    pub lease_expires_at: Option<DateTime<Utc>>,
    /// When the job was delivered.
    pub sent_at: Option<DateTime<Utc>>,
    /// Gateway delivery identifier.
    pub delivery_id: Option<String>,
    /// Last dispatch error.
    pub error_message: Option<String>,
    /// Failed attempts so far; never exceeds `max_retries`.
    pub retry_count: i64,
    /// Attempt cap before the job fails terminally.
    pub max_retries: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}
