//! Legacy template operations.
//!
//! Templates migrated from the previous notification system. The bot
//! pipeline only reads them; rows are written by the migration tooling.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::LegacyTemplate;

const COLUMNS: &str =
    "id, restaurant_id, name, language, body, media_url, approved, created_at";

/// Insert a legacy template (migration tooling and tests).
pub async fn create_template(pool: &SqlitePool, template: &LegacyTemplate) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO legacy_templates (
            id, restaurant_id, name, language, body, media_url, approved, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&template.id)
    .bind(&template.restaurant_id)
    .bind(&template.name)
    .bind(&template.language)
    .bind(&template.body)
    .bind(&template.media_url)
    .bind(template.approved)
    .bind(template.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// All approved templates for a restaurant in one language.
pub async fn find_approved(
    pool: &SqlitePool,
    restaurant_id: &str,
    language: &str,
) -> Result<Vec<LegacyTemplate>> {
    let templates = sqlx::query_as::<_, LegacyTemplate>(&format!(
        "SELECT {COLUMNS} FROM legacy_templates
         WHERE restaurant_id = ? AND language = ? AND approved = 1
         ORDER BY name"
    ))
    .bind(restaurant_id)
    .bind(language)
    .fetch_all(pool)
    .await?;

    Ok(templates)
}

/// All approved templates for a restaurant, any language.
pub async fn find_approved_any_language(
    pool: &SqlitePool,
    restaurant_id: &str,
) -> Result<Vec<LegacyTemplate>> {
    let templates = sqlx::query_as::<_, LegacyTemplate>(&format!(
        "SELECT {COLUMNS} FROM legacy_templates
         WHERE restaurant_id = ? AND approved = 1
         ORDER BY language, name"
    ))
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;

    Ok(templates)
}
