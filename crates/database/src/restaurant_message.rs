//! Restaurant message operations.
//!
//! A partial unique index guarantees at most one active message per
//! (restaurant, type, language) key. Messages are deactivated, never
//! deleted.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{MessageType, RestaurantMessage};

const COLUMNS: &str = "id, restaurant_id, message_type, language, body, media_url, media_kind, \
     cta_url, cta_text, active, modified_by, created_at, updated_at";

/// Create a new restaurant message.
///
/// Fails with [`DatabaseError::AlreadyExists`] when an active message
/// already occupies the (restaurant, type, language) key.
pub async fn create_message(pool: &SqlitePool, message: &RestaurantMessage) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO restaurant_messages (
            id, restaurant_id, message_type, language, body, media_url,
            media_kind, cta_url, cta_text, active, modified_by,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&message.id)
    .bind(&message.restaurant_id)
    .bind(message.message_type)
    .bind(&message.language)
    .bind(&message.body)
    .bind(&message.media_url)
    .bind(&message.media_kind)
    .bind(&message.cta_url)
    .bind(&message.cta_text)
    .bind(message.active)
    .bind(&message.modified_by)
    .bind(message.created_at)
    .bind(message.updated_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "RestaurantMessage",
                    id: format!(
                        "{}/{}/{}",
                        message.restaurant_id,
                        message.message_type.as_str(),
                        message.language
                    ),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Find the active message for an exact (restaurant, type, language) key.
pub async fn find_active(
    pool: &SqlitePool,
    restaurant_id: &str,
    message_type: MessageType,
    language: &str,
) -> Result<Option<RestaurantMessage>> {
    let message = sqlx::query_as::<_, RestaurantMessage>(&format!(
        "SELECT {COLUMNS} FROM restaurant_messages
         WHERE restaurant_id = ? AND message_type = ? AND language = ? AND active = 1"
    ))
    .bind(restaurant_id)
    .bind(message_type)
    .bind(language)
    .fetch_optional(pool)
    .await?;

    Ok(message)
}

/// Find any active message of the given type, regardless of language.
///
/// Last resort of the first resolution tier.
pub async fn find_any_active(
    pool: &SqlitePool,
    restaurant_id: &str,
    message_type: MessageType,
) -> Result<Option<RestaurantMessage>> {
    let message = sqlx::query_as::<_, RestaurantMessage>(&format!(
        "SELECT {COLUMNS} FROM restaurant_messages
         WHERE restaurant_id = ? AND message_type = ? AND active = 1
         ORDER BY language
         LIMIT 1"
    ))
    .bind(restaurant_id)
    .bind(message_type)
    .fetch_optional(pool)
    .await?;

    Ok(message)
}

/// Deactivate a message. Messages are never deleted.
pub async fn deactivate(pool: &SqlitePool, id: &str, now: DateTime<Utc>) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE restaurant_messages
        SET active = 0, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "RestaurantMessage",
            id: id.to_string(),
        });
    }

    Ok(())
}
