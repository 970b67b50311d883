//! Trigger phrase resolution.

use database::bot_config;
use database::BotConfig;
use sqlx::SqlitePool;

use crate::error::Result;

/// Normalize a phrase for matching: trim and lowercase.
pub fn normalize_trigger(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Match inbound text against the active trigger phrases.
///
/// Matching is whole-string: a message containing extra words does not
/// match. `None` means the message is simply not for the bot.
pub async fn resolve(pool: &SqlitePool, inbound_text: &str) -> Result<Option<BotConfig>> {
    let normalized = normalize_trigger(inbound_text);
    if normalized.is_empty() {
        return Ok(None);
    }

    let config = bot_config::find_by_trigger(pool, &normalized).await?;
    Ok(config)
}
