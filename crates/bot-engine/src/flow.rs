//! The inbound conversation flow.
//!
//! One webhook invocation is a linear sequence: trigger match → contact
//! upsert → menu resolution → delivery → review follow-up scheduling. The
//! menu send always happens before the review job is persisted, and the
//! review delay counts from the moment of menu delivery, not from trigger
//! receipt.

use chrono::{Duration, Utc};
use database::models::{Interaction, JobStatus, MessageType, ScheduledMessage};
use database::{interaction, restaurant, scheduled_message};
use dispatcher::{deliver, DeliveryOutcome, MessageSender, TemplateVars};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::contacts;
use crate::error::Result;
use crate::resolver;
use crate::triggers;

/// An inbound webhook message, already decoded from the transport.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Message body text; trigger matching operates on this only.
    pub body: String,
    /// Sender address (e.g., "whatsapp:+393331234567").
    pub from: String,
    /// Recipient address (the bot's number).
    pub to: String,
    /// Sender display name, if the channel provides one.
    pub profile_name: Option<String>,
}

/// What the flow did with an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// No active trigger matched; the message is not for the bot.
    NoTrigger,
    /// Menu delivered and the review follow-up scheduled.
    Replied {
        /// Contact the conversation belongs to.
        contact_id: String,
        /// Recorded interaction.
        interaction_id: String,
        /// Gateway delivery id of the menu message.
        menu_delivery_id: String,
        /// The scheduled review job.
        review_job_id: String,
    },
    /// The menu send failed at the gateway; the caller owes the customer
    /// an apology through its own reply path.
    ReplyFailed {
        /// Language for the apology text.
        language: String,
        /// Gateway error, for the logs.
        error: String,
    },
}

/// Handle one inbound message end to end.
pub async fn handle_inbound(
    pool: &SqlitePool,
    sender: &dyn MessageSender,
    inbound: &InboundMessage,
) -> Result<InboundOutcome> {
    let Some(config) = triggers::resolve(pool, &inbound.body).await? else {
        debug!(from = %inbound.from, "No trigger match; ignoring message");
        return Ok(InboundOutcome::NoTrigger);
    };

    let restaurant = restaurant::get_restaurant(pool, &config.restaurant_id).await?;
    let now = Utc::now();

    let contact = contacts::find_or_create(
        pool,
        &restaurant.id,
        &inbound.from,
        inbound.profile_name.as_deref(),
        now,
    )
    .await?;

    let menu =
        resolver::resolve_message(pool, &restaurant, MessageType::Menu, &contact.language).await?;
    let vars = TemplateVars::new(&contact.name, &restaurant.name);

    let outcome = deliver(sender, &contact.phone, &menu.content, &vars).await;
    let delivery_id = match outcome {
        DeliveryOutcome::Sent { delivery_id } => delivery_id,
        DeliveryOutcome::Failed { error } => {
            warn!(
                restaurant_id = %restaurant.id,
                contact_id = %contact.id,
                error = %error,
                "Menu delivery failed"
            );
            return Ok(InboundOutcome::ReplyFailed {
                language: contact.language.clone(),
                error,
            });
        }
    };

    let delivered_at = Utc::now();

    let conversation = Interaction {
        id: Uuid::new_v4().to_string(),
        restaurant_id: restaurant.id.clone(),
        contact_id: contact.id.clone(),
        trigger_phrase: config.trigger_phrase.clone(),
        created_at: delivered_at,
    };
    interaction::create_interaction(pool, &conversation).await?;

    // Review content is copied into the job now; later edits to the
    // source message do not change what this job will send.
    let review =
        resolver::resolve_message(pool, &restaurant, MessageType::Review, &contact.language)
            .await?;
    let job = ScheduledMessage {
        id: Uuid::new_v4().to_string(),
        restaurant_id: restaurant.id.clone(),
        interaction_id: Some(conversation.id.clone()),
        campaign_id: None,
        phone: contact.phone.clone(),
        customer_name: contact.name.clone(),
        message_type: MessageType::Review,
        body: Some(dispatcher::body_with_cta(&review.content)),
        media_url: review.content.media_url.clone(),
        legacy_template_id: None,
        template_variables: None,
        scheduled_for: delivered_at + Duration::minutes(config.review_delay_minutes),
        status: JobStatus::Pending,
        lease_expires_at: None,
        sent_at: None,
        delivery_id: None,
        error_message: None,
        retry_count: 0,
        max_retries: 3,
        created_at: delivered_at,
        updated_at: delivered_at,
    };
    scheduled_message::create_job(pool, &job).await?;

    info!(
        restaurant_id = %restaurant.id,
        contact_id = %contact.id,
        review_job_id = %job.id,
        delay_minutes = config.review_delay_minutes,
        "Menu delivered, review follow-up scheduled"
    );

    Ok(InboundOutcome::Replied {
        contact_id: contact.id,
        interaction_id: conversation.id,
        menu_delivery_id: delivery_id,
        review_job_id: job.id,
    })
}

/// Apology sent through the caller's own reply path when the gateway
/// fails mid-conversation. Leaving a matched trigger unanswered is the
/// worst failure mode, so this path must not depend on the gateway.
pub fn apology_text(language: &str) -> &'static str {
    match language {
        "it" => "Ci scusiamo, si è verificato un problema. Riprova tra qualche minuto!",
        "es" => "Lo sentimos, ha ocurrido un problema. ¡Inténtalo de nuevo en unos minutos!",
        "fr" => "Désolé, un problème est survenu. Réessayez dans quelques minutes !",
        "de" => "Entschuldigung, es ist ein Problem aufgetreten. Bitte versuche es in ein paar Minuten erneut!",
        "pt" => "Pedimos desculpa, ocorreu um problema. Tente novamente dentro de alguns minutos!",
        _ => "Sorry, something went wrong. Please try again in a few minutes!",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::models::{BotConfig, Restaurant, RestaurantMessage};
    use database::{bot_config, restaurant_message, Database};
    use dispatcher::RecordingSender;

    async fn seeded_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let now = Utc::now();

        let restaurant = Restaurant {
            id: "r1".to_string(),
            name: "Trattoria da Anna".to_string(),
            whatsapp_number: "whatsapp:+14155238886".to_string(),
            default_language: "it".to_string(),
            created_at: now,
        };
        restaurant::create_restaurant(db.pool(), &restaurant)
            .await
            .unwrap();

        let config = BotConfig {
            id: "cfg1".to_string(),
            restaurant_id: "r1".to_string(),
            trigger_phrase: "ciao".to_string(),
            trigger_phrase_norm: "ciao".to_string(),
            active: true,
            review_delay_minutes: 120,
            hours_enabled: false,
            hours_start: 9,
            hours_end: 22,
            hours_utc_offset_minutes: 60,
            created_at: now,
            updated_at: now,
        };
        bot_config::create_bot_config(db.pool(), &config).await.unwrap();

        for (id, message_type, body) in [
            ("m-menu", MessageType::Menu, "Ecco il menu, {{customerName}}!"),
            ("m-review", MessageType::Review, "Com'è andata, {{customerName}}?"),
        ] {
            let message = RestaurantMessage {
                id: id.to_string(),
                restaurant_id: "r1".to_string(),
                message_type,
                language: "it".to_string(),
                body: body.to_string(),
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
        }

        db
    }

    fn inbound(body: &str) -> InboundMessage {
        InboundMessage {
            body: body.to_string(),
            from: "whatsapp:+393331234567".to_string(),
            to: "whatsapp:+14155238886".to_string(),
            profile_name: Some("Marco".to_string()),
        }
    }

    #[tokio::test]
    async fn test_trigger_sends_menu_and_schedules_review() {
        let db = seeded_db().await;
        let sender = RecordingSender::new();
        let before = Utc::now();

        // Case-insensitive whole-string match.
        let outcome = handle_inbound(db.pool(), &sender, &inbound("Ciao"))
            .await
            .unwrap();

        let InboundOutcome::Replied {
            contact_id,
            interaction_id,
            review_job_id,
            ..
        } = outcome
        else {
            panic!("expected a reply, got {outcome:?}");
        };

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body, "Ecco il menu, Marco!");
        assert_eq!(sent[0].to, "+393331234567");

        let conversation = interaction::get_interaction(db.pool(), &interaction_id)
            .await
            .unwrap();
        assert_eq!(conversation.contact_id, contact_id);
        assert_eq!(conversation.trigger_phrase, "ciao");

        let job = scheduled_message::get_job(db.pool(), &review_job_id)
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.message_type, MessageType::Review);
        assert_eq!(job.customer_name, "Marco");
        assert_eq!(job.interaction_id.as_deref(), Some(interaction_id.as_str()));
        assert_eq!(job.body.as_deref(), Some("Com'è andata, {{customerName}}?"));

        // Delay counts from menu delivery.
        let delta = job.scheduled_for - before;
        assert!(delta >= Duration::minutes(120));
        assert!(delta < Duration::minutes(121));
    }

    #[tokio::test]
    async fn test_extra_words_do_not_match() {
        let db = seeded_db().await;
        let sender = RecordingSender::new();

        let outcome = handle_inbound(db.pool(), &sender, &inbound("ciao, un tavolo per due"))
            .await
            .unwrap();

        assert_eq!(outcome, InboundOutcome::NoTrigger);
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_failure_yields_apology_path() {
        let db = seeded_db().await;
        let sender = RecordingSender::failing("boom");

        let outcome = handle_inbound(db.pool(), &sender, &inbound("ciao"))
            .await
            .unwrap();

        let InboundOutcome::ReplyFailed { language, error } = outcome else {
            panic!("expected a failed reply, got {outcome:?}");
        };
        assert_eq!(language, "it");
        assert!(error.contains("boom"));

        // No review job without a delivered menu.
        let due = scheduled_message::find_due(db.pool(), Utc::now() + Duration::days(30), 100)
            .await
            .unwrap();
        assert!(due.is_empty());
    }
}
