//! Contact operations.
//!
//! Contacts are keyed by (restaurant, phone hash) so that formatting
//! variants of one number collapse to a single row.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Contact;

/// Placeholder used until a real profile name is seen.
pub const DEFAULT_NAME: &str = "WhatsApp User";

const COLUMNS: &str = "id, restaurant_id, phone, phone_hash, name, language, interaction_count, \
     first_contact_at, last_contact_at, marketing_consent, consent_source, tags";

/// Create a new contact.
pub async fn create_contact(pool: &SqlitePool, contact: &Contact) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO contacts (
            id, restaurant_id, phone, phone_hash, name, language,
            interaction_count, first_contact_at, last_contact_at,
            marketing_consent, consent_source, tags
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&contact.id)
    .bind(&contact.restaurant_id)
    .bind(&contact.phone)
    .bind(&contact.phone_hash)
    .bind(&contact.name)
    .bind(&contact.language)
    .bind(contact.interaction_count)
    .bind(contact.first_contact_at)
    .bind(contact.last_contact_at)
    .bind(contact.marketing_consent)
    .bind(&contact.consent_source)
    .bind(&contact.tags)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Contact",
                    id: format!("{}/{}", contact.restaurant_id, contact.phone_hash),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Get a contact by ID.
pub async fn get_contact(pool: &SqlitePool, id: &str) -> Result<Contact> {
    sqlx::query_as::<_, Contact>(&format!("SELECT {COLUMNS} FROM contacts WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "Contact",
            id: id.to_string(),
        })
}

/// Look up a contact by its hashed phone number.
pub async fn find_by_hash(
    pool: &SqlitePool,
    restaurant_id: &str,
    phone_hash: &str,
) -> Result<Option<Contact>> {
    let contact = sqlx::query_as::<_, Contact>(&format!(
        "SELECT {COLUMNS} FROM contacts WHERE restaurant_id = ? AND phone_hash = ?"
    ))
    .bind(restaurant_id)
    .bind(phone_hash)
    .fetch_optional(pool)
    .await?;

    Ok(contact)
}

/// Record an inbound interaction on an existing contact.
///
/// Bumps `last_contact_at` and `interaction_count`. The stored name is
/// replaced with `supplied_name` only while it is still the generic
/// placeholder; consent is never touched here.
pub async fn record_interaction(
    pool: &SqlitePool,
    id: &str,
    supplied_name: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE contacts
        SET interaction_count = interaction_count + 1,
            last_contact_at = ?,
            name = CASE WHEN name = ? THEN ? ELSE name END
        WHERE id = ?
        "#,
    )
    .bind(now)
    .bind(DEFAULT_NAME)
    .bind(supplied_name)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Contact",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// All contacts of a restaurant that have marketing consent.
///
/// Campaign fan-out targets exactly this set.
pub async fn list_consenting(pool: &SqlitePool, restaurant_id: &str) -> Result<Vec<Contact>> {
    let contacts = sqlx::query_as::<_, Contact>(&format!(
        "SELECT {COLUMNS} FROM contacts
         WHERE restaurant_id = ? AND marketing_consent = 1
         ORDER BY last_contact_at DESC"
    ))
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;

    Ok(contacts)
}

/// Count contacts for a restaurant.
pub async fn count_contacts(pool: &SqlitePool, restaurant_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM contacts WHERE restaurant_id = ?
        "#,
    )
    .bind(restaurant_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
