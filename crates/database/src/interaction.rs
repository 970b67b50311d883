//! Interaction records.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Interaction;

/// Record a matched trigger conversation.
pub async fn create_interaction(pool: &SqlitePool, interaction: &Interaction) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO interactions (id, restaurant_id, contact_id, trigger_phrase, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&interaction.id)
    .bind(&interaction.restaurant_id)
    .bind(&interaction.contact_id)
    .bind(&interaction.trigger_phrase)
    .bind(interaction.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get an interaction by ID.
pub async fn get_interaction(pool: &SqlitePool, id: &str) -> Result<Interaction> {
    sqlx::query_as::<_, Interaction>(
        r#"
        SELECT id, restaurant_id, contact_id, trigger_phrase, created_at
        FROM interactions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Interaction",
        id: id.to_string(),
    })
}
