//! Contact registry: find-or-create by hashed phone number.

use chrono::{DateTime, Utc};
use database::models::Contact;
use database::{contact, DatabaseError};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::language::{digits_only, language_for_phone};

/// Consent provenance recorded for the tacit opt-in on first contact.
pub const FIRST_CONTACT_CONSENT: &str = "first_contact_opt_in";

/// SHA-256 hex digest of the digits-only phone.
///
/// Formatting variants of the same number always hash identically.
pub fn phone_hash(phone: &str) -> String {
    let digits = digits_only(phone);
    hex::encode(Sha256::digest(digits.as_bytes()))
}

/// Find a contact by phone, creating it on first contact.
///
/// The sole writer of interaction counts and consent provenance. On a hit
/// it bumps `last_contact_at` and the interaction count; the stored name
/// is upgraded from the generic placeholder only. On a miss it creates
/// the contact with consent defaulted to opt-in and the language
/// classified from the phone number. Consent is never downgraded here.
pub async fn find_or_create(
    pool: &SqlitePool,
    restaurant_id: &str,
    raw_phone: &str,
    profile_name: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Contact> {
    let hash = phone_hash(raw_phone);

    if let Some(existing) = contact::find_by_hash(pool, restaurant_id, &hash).await? {
        let supplied = profile_name.unwrap_or(contact::DEFAULT_NAME);
        contact::record_interaction(pool, &existing.id, supplied, now).await?;
        return contact::get_contact(pool, &existing.id)
            .await
            .map_err(Into::into);
    }

    let new_contact = Contact {
        id: Uuid::new_v4().to_string(),
        restaurant_id: restaurant_id.to_string(),
        phone: strip_channel_prefix(raw_phone).to_string(),
        phone_hash: hash,
        name: profile_name.unwrap_or(contact::DEFAULT_NAME).to_string(),
        language: language_for_phone(raw_phone).to_string(),
        interaction_count: 1,
        first_contact_at: now,
        last_contact_at: now,
        marketing_consent: true,
        consent_source: FIRST_CONTACT_CONSENT.to_string(),
        tags: "[]".to_string(),
    };

    match contact::create_contact(pool, &new_contact).await {
        Ok(()) => {
            debug!(contact_id = %new_contact.id, "Created contact");
            Ok(new_contact)
        }
        // Lost a creation race with a concurrent webhook for the same
        // number; fall back to the row that won.
        Err(DatabaseError::AlreadyExists { .. }) => {
            let existing = contact::find_by_hash(pool, restaurant_id, &new_contact.phone_hash)
                .await?
                .ok_or(DatabaseError::NotFound {
                    entity: "Contact",
                    id: new_contact.phone_hash.clone(),
                })?;
            contact::record_interaction(
                pool,
                &existing.id,
                profile_name.unwrap_or(contact::DEFAULT_NAME),
                now,
            )
            .await?;
            contact::get_contact(pool, &existing.id).await.map_err(Into::into)
        }
        Err(e) => Err(e.into()),
    }
}

/// Strip the channel prefix, keeping the human-readable number.
fn strip_channel_prefix(phone: &str) -> &str {
    phone.strip_prefix("whatsapp:").unwrap_or(phone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::Database;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let restaurant = database::models::Restaurant {
            id: "r1".to_string(),
            name: "Trattoria da Anna".to_string(),
            whatsapp_number: "whatsapp:+14155238886".to_string(),
            default_language: "it".to_string(),
            created_at: Utc::now(),
        };
        database::restaurant::create_restaurant(db.pool(), &restaurant)
            .await
            .unwrap();
        db
    }

    #[test]
    fn test_hash_collapses_formatting() {
        let a = phone_hash("+39 333 1234567");
        let b = phone_hash("whatsapp:393331234567");
        assert_eq!(a, b);

        let other = phone_hash("+39 333 7654321");
        assert_ne!(a, other);
    }

    #[tokio::test]
    async fn test_find_or_create_is_idempotent_across_formats() {
        let db = test_db().await;

        let first = find_or_create(db.pool(), "r1", "+39 333 1234567", None, Utc::now())
            .await
            .unwrap();
        assert_eq!(first.interaction_count, 1);
        assert_eq!(first.language, "it");
        assert!(first.marketing_consent);
        assert_eq!(first.consent_source, FIRST_CONTACT_CONSENT);

        let second = find_or_create(
            db.pool(),
            "r1",
            "whatsapp:393331234567",
            Some("Marco"),
            Utc::now(),
        )
        .await
        .unwrap();

        // Same record, two interactions total, name upgraded from the
        // placeholder.
        assert_eq!(second.id, first.id);
        assert_eq!(second.interaction_count, 2);
        assert_eq!(second.name, "Marco");

        assert_eq!(
            database::contact::count_contacts(db.pool(), "r1").await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_real_name_is_not_overwritten() {
        let db = test_db().await;

        find_or_create(db.pool(), "r1", "+393331234567", Some("Marco"), Utc::now())
            .await
            .unwrap();
        let updated = find_or_create(
            db.pool(),
            "r1",
            "+393331234567",
            Some("Impostor"),
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Marco");
    }
}
