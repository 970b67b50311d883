//! SQLite persistence layer for the Tavola WhatsApp bot.
//!
//! This crate provides async database operations for restaurants, bot
//! configurations, outbound message content, contacts, and the scheduled
//! message queue, using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:tavola.db?mode=rwc").await?;
//!     db.migrate().await?;
//!     Ok(())
//! }
//! ```

pub mod bot_config;
pub mod contact;
pub mod error;
pub mod interaction;
pub mod legacy_template;
pub mod models;
pub mod restaurant;
pub mod restaurant_message;
pub mod scheduled_message;

pub use error::{DatabaseError, Result};
pub use models::{
    BotConfig, Contact, Interaction, JobStatus, LegacyTemplate, MessageType,
    Restaurant, RestaurantMessage, ScheduledMessage,
};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Set high enough to handle webhook traffic alongside the poller.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist, or
    /// `sqlite::memory:` for tests.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    async fn seed_restaurant(db: &Database, id: &str) -> Restaurant {
        let restaurant = Restaurant {
            id: id.to_string(),
            name: "Trattoria da Anna".to_string(),
            whatsapp_number: "whatsapp:+14155238886".to_string(),
            default_language: "it".to_string(),
            created_at: Utc::now(),
        };
        restaurant::create_restaurant(db.pool(), &restaurant)
            .await
            .unwrap();
        restaurant
    }

    fn test_config(restaurant_id: &str, trigger: &str) -> BotConfig {
        let now = Utc::now();
        BotConfig {
            id: format!("cfg-{trigger}"),
            restaurant_id: restaurant_id.to_string(),
            trigger_phrase: trigger.to_string(),
            trigger_phrase_norm: trigger.trim().to_lowercase(),
            active: true,
            review_delay_minutes: 120,
            hours_enabled: false,
            hours_start: 9,
            hours_end: 22,
            hours_utc_offset_minutes: 60,
            created_at: now,
            updated_at: now,
        }
    }

    fn test_job(restaurant_id: &str, id: &str, scheduled_for: chrono::DateTime<Utc>) -> ScheduledMessage {
        let now = Utc::now();
        ScheduledMessage {
            id: id.to_string(),
            restaurant_id: restaurant_id.to_string(),
            interaction_id: None,
            campaign_id: None,
            phone: "+393331234567".to_string(),
            customer_name: "Marco".to_string(),
            message_type: MessageType::Review,
            body: Some("Hi {{customerName}}, how was it?".to_string()),
            media_url: None,
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
        }
    }

    #[tokio::test]
    async fn test_trigger_unique_among_active() {
        let db = test_db().await;
        seed_restaurant(&db, "r1").await;

        bot_config::create_bot_config(db.pool(), &test_config("r1", "menu"))
            .await
            .unwrap();

        // A second active config with the same normalized trigger is rejected.
        let mut dup = test_config("r1", "MENU");
        dup.id = "cfg-dup".to_string();
        let result = bot_config::create_bot_config(db.pool(), &dup).await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists { .. })));

        // Deactivating the first frees the trigger for a new config.
        bot_config::set_active(db.pool(), "cfg-menu", false, Utc::now())
            .await
            .unwrap();
        let deactivated = bot_config::get_bot_config(db.pool(), "cfg-menu").await.unwrap();
        assert!(!deactivated.active);
        bot_config::create_bot_config(db.pool(), &dup).await.unwrap();

        let found = bot_config::find_by_trigger(db.pool(), "menu").await.unwrap();
        assert_eq!(found.unwrap().id, "cfg-dup");
    }

    #[tokio::test]
    async fn test_restaurant_message_unique_key() {
        let db = test_db().await;
        seed_restaurant(&db, "r1").await;
        let now = Utc::now();

        let message = RestaurantMessage {
            id: "m1".to_string(),
            restaurant_id: "r1".to_string(),
            message_type: MessageType::Menu,
            language: "it".to_string(),
            body: "Ecco il menu, {{customerName}}!".to_string(),
            media_url: None,
            media_kind: None,
            cta_url: None,
            cta_text: None,
            active: true,
            modified_by: None,
            created_at: now,
            updated_at: now,
        };
        restaurant_message::create_message(db.pool(), &message)
            .await
            .unwrap();

        let mut dup = message.clone();
        dup.id = "m2".to_string();
        let result = restaurant_message::create_message(db.pool(), &dup).await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists { .. })));

        // Deactivation frees the key for regenerated content.
        restaurant_message::deactivate(db.pool(), "m1", Utc::now())
            .await
            .unwrap();
        restaurant_message::create_message(db.pool(), &dup).await.unwrap();
        let found = restaurant_message::find_active(db.pool(), "r1", MessageType::Menu, "it")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "m2");

        // A different language is a different key.
        let mut spanish = message.clone();
        spanish.id = "m3".to_string();
        spanish.language = "es".to_string();
        restaurant_message::create_message(db.pool(), &spanish)
            .await
            .unwrap();

        let found = restaurant_message::find_active(db.pool(), "r1", MessageType::Menu, "es")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "m3");
    }

    #[tokio::test]
    async fn test_contact_interaction_updates() {
        let db = test_db().await;
        seed_restaurant(&db, "r1").await;
        let now = Utc::now();

        let contact = Contact {
            id: "c1".to_string(),
            restaurant_id: "r1".to_string(),
            phone: "+39 333 1234567".to_string(),
            phone_hash: "abc123".to_string(),
            name: contact::DEFAULT_NAME.to_string(),
            language: "it".to_string(),
            interaction_count: 1,
            first_contact_at: now,
            last_contact_at: now,
            marketing_consent: true,
            consent_source: "first_contact_opt_in".to_string(),
            tags: "[]".to_string(),
        };
        contact::create_contact(db.pool(), &contact).await.unwrap();

        // Placeholder name is replaced by the supplied profile name.
        contact::record_interaction(db.pool(), "c1", "Marco", Utc::now())
            .await
            .unwrap();
        let fetched = contact::get_contact(db.pool(), "c1").await.unwrap();
        assert_eq!(fetched.name, "Marco");
        assert_eq!(fetched.interaction_count, 2);

        // A real name is never overwritten afterwards.
        contact::record_interaction(db.pool(), "c1", "Somebody Else", Utc::now())
            .await
            .unwrap();
        let fetched = contact::get_contact(db.pool(), "c1").await.unwrap();
        assert_eq!(fetched.name, "Marco");
        assert_eq!(fetched.interaction_count, 3);
    }

    #[tokio::test]
    async fn test_job_claim_is_exclusive() {
        let db = test_db().await;
        seed_restaurant(&db, "r1").await;
        let now = Utc::now();

        let job = test_job("r1", "j1", now - Duration::minutes(1));
        scheduled_message::create_job(db.pool(), &job).await.unwrap();

        let due = scheduled_message::find_due(db.pool(), now, 100).await.unwrap();
        assert_eq!(due.len(), 1);

        let lease = now + Duration::minutes(5);
        // Two pollers race for the same job; exactly one wins.
        let first = scheduled_message::claim(db.pool(), "j1", lease, now).await.unwrap();
        let second = scheduled_message::claim(db.pool(), "j1", lease, now).await.unwrap();
        assert!(first);
        assert!(!second);

        assert!(scheduled_message::mark_sent(db.pool(), "j1", "SM123", now)
            .await
            .unwrap());
        let fetched = scheduled_message::get_job(db.pool(), "j1").await.unwrap();
        assert_eq!(fetched.status, JobStatus::Sent);
        assert_eq!(fetched.delivery_id.as_deref(), Some("SM123"));

        // Terminal states reject further transitions.
        assert!(!scheduled_message::cancel(db.pool(), "j1", now).await.unwrap());
        assert!(!scheduled_message::mark_failed(db.pool(), "j1", "late", now)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_expired_lease_returns_to_pending() {
        let db = test_db().await;
        seed_restaurant(&db, "r1").await;
        let now = Utc::now();

        let job = test_job("r1", "j1", now - Duration::minutes(10));
        scheduled_message::create_job(db.pool(), &job).await.unwrap();

        let stale_lease = now - Duration::minutes(1);
        assert!(scheduled_message::claim(db.pool(), "j1", stale_lease, now)
            .await
            .unwrap());

        let released = scheduled_message::release_expired_leases(db.pool(), now)
            .await
            .unwrap();
        assert_eq!(released, 1);

        let fetched = scheduled_message::get_job(db.pool(), "j1").await.unwrap();
        assert_eq!(fetched.status, JobStatus::Pending);
        assert!(fetched.lease_expires_at.is_none());
    }

    #[tokio::test]
    async fn test_cancel_pending_for_campaign() {
        let db = test_db().await;
        seed_restaurant(&db, "r1").await;
        let now = Utc::now();

        for i in 0..3 {
            let mut job = test_job("r1", &format!("j{i}"), now + Duration::hours(1));
            job.campaign_id = Some("camp-1".to_string());
            job.message_type = MessageType::Campaign;
            scheduled_message::create_job(db.pool(), &job).await.unwrap();
        }
        // One already sent; it must stay sent.
        let lease = now + Duration::minutes(5);
        let mut sent = test_job("r1", "j-sent", now - Duration::minutes(1));
        sent.campaign_id = Some("camp-1".to_string());
        scheduled_message::create_job(db.pool(), &sent).await.unwrap();
        scheduled_message::claim(db.pool(), "j-sent", lease, now).await.unwrap();
        scheduled_message::mark_sent(db.pool(), "j-sent", "SM1", now).await.unwrap();

        let cancelled = scheduled_message::cancel_pending_for_campaign(db.pool(), "camp-1", now)
            .await
            .unwrap();
        assert_eq!(cancelled, 3);

        let fetched = scheduled_message::get_job(db.pool(), "j-sent").await.unwrap();
        assert_eq!(fetched.status, JobStatus::Sent);
    }
}
