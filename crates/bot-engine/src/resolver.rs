//! The message-resolution cascade.
//!
//! Resolution walks an ordered list of tiers and short-circuits on the
//! first hit. The final tier always produces content, so a matched
//! conversation can never dead-end on missing data:
//!
//! 1. current system — active [`RestaurantMessage`] rows, with
//!    language → restaurant default → any-language fallback;
//! 2. legacy system — approved templates of the same semantic kind,
//!    same language fallback order;
//! 3. hardcoded generic text.

use database::models::{LegacyTemplate, MessageType, Restaurant, RestaurantMessage};
use database::{legacy_template, restaurant_message};
use dispatcher::OutboundContent;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::Result;

/// Which tier produced the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    /// An active `RestaurantMessage`.
    Current,
    /// An approved legacy template.
    Legacy,
    /// The hardcoded generic text.
    Fallback,
}

/// Resolved content plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Content ready for the dispatcher.
    pub content: OutboundContent,
    /// Which tier produced it.
    pub tier: ResolutionTier,
}

/// Resolve outbound content for (restaurant, type, language).
///
/// Total by construction: the fallback tier always yields content.
pub async fn resolve_message(
    pool: &SqlitePool,
    restaurant: &Restaurant,
    message_type: MessageType,
    language: &str,
) -> Result<Resolved> {
    if let Some(content) = tier_current(pool, restaurant, message_type, language).await? {
        return Ok(Resolved {
            content,
            tier: ResolutionTier::Current,
        });
    }

    if let Some(content) = tier_legacy(pool, restaurant, message_type, language).await? {
        return Ok(Resolved {
            content,
            tier: ResolutionTier::Legacy,
        });
    }

    debug!(
        restaurant_id = %restaurant.id,
        message_type = message_type.as_str(),
        language,
        "No configured content; using generic fallback"
    );
    Ok(Resolved {
        content: OutboundContent::text(fallback_text(message_type, language)),
        tier: ResolutionTier::Fallback,
    })
}

/// Tier 1: active restaurant messages, with language fallback.
async fn tier_current(
    pool: &SqlitePool,
    restaurant: &Restaurant,
    message_type: MessageType,
    language: &str,
) -> Result<Option<OutboundContent>> {
    if let Some(row) =
        restaurant_message::find_active(pool, &restaurant.id, message_type, language).await?
    {
        return Ok(Some(content_from_message(&row)));
    }

    if restaurant.default_language != language {
        if let Some(row) = restaurant_message::find_active(
            pool,
            &restaurant.id,
            message_type,
            &restaurant.default_language,
        )
        .await?
        {
            return Ok(Some(content_from_message(&row)));
        }
    }

    if let Some(row) =
        restaurant_message::find_any_active(pool, &restaurant.id, message_type).await?
    {
        return Ok(Some(content_from_message(&row)));
    }

    Ok(None)
}

/// Tier 2: approved legacy templates of the same semantic kind.
async fn tier_legacy(
    pool: &SqlitePool,
    restaurant: &Restaurant,
    message_type: MessageType,
    language: &str,
) -> Result<Option<OutboundContent>> {
    let by_language = legacy_template::find_approved(pool, &restaurant.id, language).await?;
    if let Some(template) = pick_template(&by_language, message_type) {
        return Ok(Some(content_from_template(template)));
    }

    if restaurant.default_language != language {
        let by_default =
            legacy_template::find_approved(pool, &restaurant.id, &restaurant.default_language)
                .await?;
        if let Some(template) = pick_template(&by_default, message_type) {
            return Ok(Some(content_from_template(template)));
        }
    }

    let any = legacy_template::find_approved_any_language(pool, &restaurant.id).await?;
    if let Some(template) = pick_template(&any, message_type) {
        return Ok(Some(content_from_template(template)));
    }

    Ok(None)
}

fn pick_template(templates: &[LegacyTemplate], message_type: MessageType) -> Option<&LegacyTemplate> {
    templates
        .iter()
        .find(|t| template_matches(&t.name, message_type))
}

/// Infer a legacy template's semantic kind from its name.
pub fn template_matches(name: &str, message_type: MessageType) -> bool {
    let name = name.to_lowercase();
    match message_type {
        MessageType::Menu => name.contains("menu"),
        MessageType::Review => {
            name.contains("review") || name.contains("feedback") || name.contains("recensione")
        }
        MessageType::Campaign | MessageType::Followup => false,
    }
}

/// Map a current-system row into the uniform content shape.
///
/// Media and CTA are exclusive template slots; a row carrying both keeps
/// its media attachment and has the CTA folded into the body as inline
/// text immediately.
fn content_from_message(row: &RestaurantMessage) -> OutboundContent {
    let content = OutboundContent {
        body: row.body.clone(),
        media_url: row.media_url.clone(),
        cta_url: row.cta_url.clone(),
        cta_text: row.cta_text.clone(),
    };

    if content.media_url.is_some() && content.cta_url.is_some() {
        return OutboundContent {
            body: dispatcher::body_with_cta(&content),
            media_url: content.media_url,
            cta_url: None,
            cta_text: None,
        };
    }

    content
}

fn content_from_template(template: &LegacyTemplate) -> OutboundContent {
    OutboundContent {
        body: template.body.clone(),
        media_url: template.media_url.clone(),
        cta_url: None,
        cta_text: None,
    }
}

/// Tier 3: minimal generic text so the conversation never dead-ends.
pub fn fallback_text(message_type: MessageType, language: &str) -> String {
    let text = match (message_type, language) {
        (MessageType::Menu, "it") => "Benvenuto da {{restaurantName}}! Ti invieremo presto il nostro menu.",
        (MessageType::Menu, "es") => "¡Bienvenido a {{restaurantName}}! Te enviaremos nuestro menú en breve.",
        (MessageType::Menu, "fr") => "Bienvenue chez {{restaurantName}} ! Nous vous enverrons notre menu très bientôt.",
        (MessageType::Menu, "de") => "Willkommen bei {{restaurantName}}! Wir senden dir in Kürze unsere Speisekarte.",
        (MessageType::Menu, "pt") => "Bem-vindo ao {{restaurantName}}! Em breve enviaremos o nosso menu.",
        (MessageType::Menu, _) => "Welcome to {{restaurantName}}! We'll send you our menu shortly.",
        (MessageType::Review, "it") => "Grazie per la tua visita da {{restaurantName}}! Ci piacerebbe sapere com'è andata.",
        (MessageType::Review, "es") => "¡Gracias por tu visita a {{restaurantName}}! Nos encantaría saber qué te pareció.",
        (MessageType::Review, "fr") => "Merci de votre visite chez {{restaurantName}} ! Dites-nous ce que vous en avez pensé.",
        (MessageType::Review, "de") => "Danke für deinen Besuch bei {{restaurantName}}! Wir würden gerne wissen, wie es dir gefallen hat.",
        (MessageType::Review, "pt") => "Obrigado pela sua visita ao {{restaurantName}}! Adoraríamos saber o que achou.",
        (MessageType::Review, _) => "Thank you for visiting {{restaurantName}}! We'd love to hear what you thought.",
        (_, "it") => "Grazie da {{restaurantName}}!",
        (_, _) => "Thank you from {{restaurantName}}!",
    };

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use database::models::Restaurant;
    use database::Database;

    async fn test_db() -> (Database, Restaurant) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let restaurant = Restaurant {
            id: "r1".to_string(),
            name: "Trattoria da Anna".to_string(),
            whatsapp_number: "whatsapp:+14155238886".to_string(),
            default_language: "it".to_string(),
            created_at: Utc::now(),
        };
        database::restaurant::create_restaurant(db.pool(), &restaurant)
            .await
            .unwrap();
        (db, restaurant)
    }

    fn message(id: &str, message_type: MessageType, language: &str, body: &str) -> RestaurantMessage {
        let now = Utc::now();
        RestaurantMessage {
            id: id.to_string(),
            restaurant_id: "r1".to_string(),
            message_type,
            language: language.to_string(),
            body: body.to_string(),
            media_url: None,
            media_kind: None,
            cta_url: None,
            cta_text: None,
            active: true,
            modified_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_exact_language_is_preferred() {
        let (db, restaurant) = test_db().await;
        restaurant_message::create_message(db.pool(), &message("m-it", MessageType::Menu, "it", "menu it"))
            .await
            .unwrap();
        restaurant_message::create_message(db.pool(), &message("m-es", MessageType::Menu, "es", "menu es"))
            .await
            .unwrap();

        let resolved = resolve_message(db.pool(), &restaurant, MessageType::Menu, "es")
            .await
            .unwrap();
        assert_eq!(resolved.tier, ResolutionTier::Current);
        assert_eq!(resolved.content.body, "menu es");
    }

    #[tokio::test]
    async fn test_falls_back_to_default_then_any_language() {
        let (db, restaurant) = test_db().await;
        restaurant_message::create_message(db.pool(), &message("m-it", MessageType::Menu, "it", "menu it"))
            .await
            .unwrap();

        // "fr" is missing; the restaurant default "it" covers it.
        let resolved = resolve_message(db.pool(), &restaurant, MessageType::Menu, "fr")
            .await
            .unwrap();
        assert_eq!(resolved.content.body, "menu it");

        // Only a German review exists; any-language still resolves.
        restaurant_message::create_message(
            db.pool(),
            &message("m-de", MessageType::Review, "de", "review de"),
        )
        .await
        .unwrap();
        let resolved = resolve_message(db.pool(), &restaurant, MessageType::Review, "es")
            .await
            .unwrap();
        assert_eq!(resolved.content.body, "review de");
    }

    #[tokio::test]
    async fn test_legacy_tier_matches_semantic_kind() {
        let (db, restaurant) = test_db().await;
        let template = LegacyTemplate {
            id: "t1".to_string(),
            restaurant_id: "r1".to_string(),
            name: "weekly_menu_update".to_string(),
            language: "it".to_string(),
            body: "legacy menu".to_string(),
            media_url: None,
            approved: true,
            created_at: Utc::now(),
        };
        legacy_template::create_template(db.pool(), &template).await.unwrap();

        let resolved = resolve_message(db.pool(), &restaurant, MessageType::Menu, "it")
            .await
            .unwrap();
        assert_eq!(resolved.tier, ResolutionTier::Legacy);
        assert_eq!(resolved.content.body, "legacy menu");

        // The menu template must not satisfy a review request.
        let resolved = resolve_message(db.pool(), &restaurant, MessageType::Review, "it")
            .await
            .unwrap();
        assert_eq!(resolved.tier, ResolutionTier::Fallback);
    }

    #[tokio::test]
    async fn test_unapproved_legacy_template_is_skipped() {
        let (db, restaurant) = test_db().await;
        let template = LegacyTemplate {
            id: "t1".to_string(),
            restaurant_id: "r1".to_string(),
            name: "menu_card".to_string(),
            language: "it".to_string(),
            body: "draft menu".to_string(),
            media_url: None,
            approved: false,
            created_at: Utc::now(),
        };
        legacy_template::create_template(db.pool(), &template).await.unwrap();

        let resolved = resolve_message(db.pool(), &restaurant, MessageType::Menu, "it")
            .await
            .unwrap();
        assert_eq!(resolved.tier, ResolutionTier::Fallback);
    }

    #[tokio::test]
    async fn test_fallback_never_dead_ends() {
        let (db, restaurant) = test_db().await;

        let resolved = resolve_message(db.pool(), &restaurant, MessageType::Menu, "it")
            .await
            .unwrap();
        assert_eq!(resolved.tier, ResolutionTier::Fallback);
        assert!(!resolved.content.body.is_empty());
    }

    #[tokio::test]
    async fn test_media_row_keeps_media_and_inlines_cta() {
        let (db, restaurant) = test_db().await;
        let mut row = message("m-it", MessageType::Menu, "it", "Our menu");
        row.media_url = Some("https://cdn.example.com/menu.pdf".to_string());
        row.cta_url = Some("https://example.com/book".to_string());
        row.cta_text = Some("Book a table".to_string());
        restaurant_message::create_message(db.pool(), &row).await.unwrap();

        let resolved = resolve_message(db.pool(), &restaurant, MessageType::Menu, "it")
            .await
            .unwrap();
        assert!(resolved.content.media_url.is_some());
        assert!(resolved.content.cta_url.is_none());
        assert!(resolved.content.body.contains("Book a table: https://example.com/book"));
    }
}
