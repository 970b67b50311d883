//! Bot configuration operations.
//!
//! Trigger phrases are matched against the normalized (trimmed, lowercased)
//! form, and a partial unique index keeps them unambiguous across all
//! active configurations.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::BotConfig;

const COLUMNS: &str = "id, restaurant_id, trigger_phrase, trigger_phrase_norm, active, \
     review_delay_minutes, hours_enabled, hours_start, hours_end, \
     hours_utc_offset_minutes, created_at, updated_at";

/// Create a new bot configuration.
///
/// Fails with [`DatabaseError::AlreadyExists`] when another active config
/// already claims the same normalized trigger phrase.
pub async fn create_bot_config(pool: &SqlitePool, config: &BotConfig) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO bot_configs (
            id, restaurant_id, trigger_phrase, trigger_phrase_norm, active,
            review_delay_minutes, hours_enabled, hours_start, hours_end,
            hours_utc_offset_minutes, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&config.id)
    .bind(&config.restaurant_id)
    .bind(&config.trigger_phrase)
    .bind(&config.trigger_phrase_norm)
    .bind(config.active)
    .bind(config.review_delay_minutes)
    .bind(config.hours_enabled)
    .bind(config.hours_start)
    .bind(config.hours_end)
    .bind(config.hours_utc_offset_minutes)
    .bind(config.created_at)
    .bind(config.updated_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "BotConfig",
                    id: config.trigger_phrase.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Get a bot configuration by ID.
pub async fn get_bot_config(pool: &SqlitePool, id: &str) -> Result<BotConfig> {
    sqlx::query_as::<_, BotConfig>(&format!(
        "SELECT {COLUMNS} FROM bot_configs WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "BotConfig",
        id: id.to_string(),
    })
}

/// Find the active configuration matching a normalized trigger phrase.
///
/// Returns `None` when nothing matches; an unmatched trigger is a normal
/// outcome, not an error.
pub async fn find_by_trigger(pool: &SqlitePool, trigger_norm: &str) -> Result<Option<BotConfig>> {
    let config = sqlx::query_as::<_, BotConfig>(&format!(
        "SELECT {COLUMNS} FROM bot_configs WHERE trigger_phrase_norm = ? AND active = 1"
    ))
    .bind(trigger_norm)
    .fetch_optional(pool)
    .await?;

    Ok(config)
}

/// Find the active configuration for a restaurant, if any.
pub async fn find_active_for_restaurant(
    pool: &SqlitePool,
    restaurant_id: &str,
) -> Result<Option<BotConfig>> {
    let config = sqlx::query_as::<_, BotConfig>(&format!(
        "SELECT {COLUMNS} FROM bot_configs
         WHERE restaurant_id = ? AND active = 1
         ORDER BY updated_at DESC
         LIMIT 1"
    ))
    .bind(restaurant_id)
    .fetch_optional(pool)
    .await?;

    Ok(config)
}

/// Activate or soft-deactivate a configuration. Configs are never deleted.
pub async fn set_active(
    pool: &SqlitePool,
    id: &str,
    active: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE bot_configs
        SET active = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "BotConfig",
            id: id.to_string(),
        });
    }

    Ok(())
}
