//! Outbound content shape and template rendering.

use serde::{Deserialize, Serialize};

/// Customer-name placeholder recognized in message bodies.
pub const CUSTOMER_NAME_PLACEHOLDER: &str = "{{customerName}}";

/// Restaurant-name placeholder recognized in message bodies.
pub const RESTAURANT_NAME_PLACEHOLDER: &str = "{{restaurantName}}";

/// Resolved content ready for delivery, uniform across resolution tiers.
///
/// `media_url` and `cta_url` are mutually exclusive as template slots: a
/// message is either a media attachment or a call-to-action link. A CTA on
/// media content is still representable, but only as inline text appended
/// to the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundContent {
    /// Body template, with placeholders not yet substituted.
    pub body: String,
    /// Media attachment URL, if any.
    pub media_url: Option<String>,
    /// Call-to-action link URL, if any.
    pub cta_url: Option<String>,
    /// Call-to-action label.
    pub cta_text: Option<String>,
}

impl OutboundContent {
    /// Text-only content.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            media_url: None,
            cta_url: None,
            cta_text: None,
        }
    }
}

/// Values substituted into the body placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVars {
    /// Customer display name.
    pub customer_name: String,
    /// Restaurant display name.
    pub restaurant_name: String,
}

impl TemplateVars {
    /// Create template variables.
    pub fn new(customer_name: impl Into<String>, restaurant_name: impl Into<String>) -> Self {
        Self {
            customer_name: customer_name.into(),
            restaurant_name: restaurant_name.into(),
        }
    }
}

/// Substitute the known placeholders into a body template.
pub fn substitute(body: &str, vars: &TemplateVars) -> String {
    body.replace(CUSTOMER_NAME_PLACEHOLDER, &vars.customer_name)
        .replace(RESTAURANT_NAME_PLACEHOLDER, &vars.restaurant_name)
}

/// Body template with the CTA folded in as an inline suffix.
///
/// The channel has no native button type, so a CTA travels as plain text
/// at the end of the body. Placeholders are left untouched, which lets
/// jobs embed this form at schedule time and substitute at dispatch.
pub fn body_with_cta(content: &OutboundContent) -> String {
    let mut body = content.body.clone();

    if let Some(cta_url) = &content.cta_url {
        match &content.cta_text {
            Some(cta_text) => body.push_str(&format!("\n\n{cta_text}: {cta_url}")),
            None => body.push_str(&format!("\n\n{cta_url}")),
        }
    }

    body
}

/// Render the final body: CTA suffix plus placeholder substitution.
pub fn render_body(content: &OutboundContent, vars: &TemplateVars) -> String {
    substitute(&body_with_cta(content), vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_both_placeholders() {
        let vars = TemplateVars::new("Marco", "Trattoria da Anna");
        let body = substitute(
            "Ciao {{customerName}}, benvenuto da {{restaurantName}}!",
            &vars,
        );
        assert_eq!(body, "Ciao Marco, benvenuto da Trattoria da Anna!");
    }

    #[test]
    fn test_render_appends_cta() {
        let content = OutboundContent {
            body: "Hi {{customerName}}".to_string(),
            media_url: None,
            cta_url: Some("https://g.page/review".to_string()),
            cta_text: Some("Leave a review".to_string()),
        };
        let vars = TemplateVars::new("Marco", "Anna");
        assert_eq!(
            render_body(&content, &vars),
            "Hi Marco\n\nLeave a review: https://g.page/review"
        );
    }

    #[test]
    fn test_render_cta_without_label() {
        let content = OutboundContent {
            body: "Hi".to_string(),
            media_url: None,
            cta_url: Some("https://g.page/review".to_string()),
            cta_text: None,
        };
        let vars = TemplateVars::new("Marco", "Anna");
        assert_eq!(render_body(&content, &vars), "Hi\n\nhttps://g.page/review");
    }
}
