//! # AI Content-Generation Adapter
//!
//! Builds natural-language prompts from product data (optionally with
//! base64-encoded images), calls a hosted multimodal chat-completion
//! endpoint, and parses structured fields back out of the free-text reply.
//!
//! ## Degradation Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Missing API key / HTTP failure / non-2xx  → AiError (terminal)        │
//! │  Reply arrived but parsing found nothing   → EMPTY result, no error    │
//! │                                                                         │
//! │  Callers check `is_empty()` on parse results. No retry, no backoff;    │
//! │  the user resubmits manually.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use marula_db::Product;

/// Default chat-completions endpoint.
const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
/// Default model.
const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Request timeout. No retry happens after it fires.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Brand names stripped from generated titles for trademark avoidance.
const BRAND_DENYLIST: &[&str] = &["Samsung", "Defy", "Hisense", "LG", "Bosch", "Whirlpool"];

// =============================================================================
// Errors
// =============================================================================

/// AI adapter errors. All are terminal for the call.
#[derive(Debug, Error)]
pub enum AiError {
    /// No API key configured.
    #[error("AI API key not configured: set MARULA_AI_API_KEY")]
    MissingApiKey,

    /// The HTTP request itself failed (DNS, timeout, TLS).
    #[error("AI request failed: {0}")]
    Http(String),

    /// The endpoint answered with a non-success status.
    #[error("AI endpoint returned {status}: {body}")]
    Endpoint { status: u16, body: String },

    /// The reply JSON did not contain a message.
    #[error("AI response was malformed: {0}")]
    MalformedResponse(String),
}

// =============================================================================
// Configuration
// =============================================================================

/// AI endpoint configuration.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
}

impl AiConfig {
    /// Builds a configuration, rejecting an empty API key up front so the
    /// failure is descriptive rather than a 401 later.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, AiError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AiError::MissingApiKey);
        }

        Ok(AiConfig {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
        })
    }

    /// Loads configuration from the environment.
    ///
    /// `MARULA_AI_API_KEY` is required; `MARULA_AI_ENDPOINT` and
    /// `MARULA_AI_MODEL` have defaults.
    pub fn from_env() -> Result<Self, AiError> {
        let api_key = env::var("MARULA_AI_API_KEY").map_err(|_| AiError::MissingApiKey)?;
        let endpoint =
            env::var("MARULA_AI_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let model = env::var("MARULA_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        AiConfig::new(endpoint, model, api_key)
    }
}

// =============================================================================
// Result Shapes
// =============================================================================

/// Title-generation result, parsed line-by-line from the reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleSuggestions {
    pub main_title: Option<String>,
    pub alternative_titles: Vec<String>,
    pub keywords: Vec<String>,
}

impl TitleSuggestions {
    /// Whether parsing found nothing usable.
    pub fn is_empty(&self) -> bool {
        self.main_title.is_none() && self.alternative_titles.is_empty() && self.keywords.is_empty()
    }
}

/// Description-generation result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionContent {
    pub description: Option<String>,
    pub features: Vec<String>,
    pub tags: Vec<String>,
}

impl DescriptionContent {
    /// Whether parsing found nothing usable.
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.features.is_empty() && self.tags.is_empty()
    }
}

/// Pricing suggestion, extracted from a strict-JSON reply when possible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSuggestion {
    /// Whether strict-JSON extraction succeeded.
    pub parsed: bool,
    pub suggested_price_cents: Option<i64>,
    pub reasoning: Option<String>,
    /// The raw reply text, kept for the "could not parse" path.
    pub raw: String,
}

impl PriceSuggestion {
    fn unparseable(raw: &str) -> Self {
        PriceSuggestion {
            parsed: false,
            suggested_price_cents: None,
            reasoning: None,
            raw: raw.to_string(),
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// Client for the hosted language-model endpoint.
#[derive(Debug, Clone)]
pub struct AiClient {
    http: reqwest::Client,
    config: AiConfig,
}

impl AiClient {
    /// Creates a client with the request timeout applied.
    pub fn new(config: AiConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AiError::Http(e.to_string()))?;

        Ok(AiClient { http, config })
    }

    /// Generates a main title, alternatives, and keywords for a product.
    ///
    /// `images` are base64-encoded JPEG payloads, sent inline as data URLs.
    /// An empty result means the reply could not be parsed; check with
    /// [`TitleSuggestions::is_empty`].
    pub async fn generate_titles(
        &self,
        product: &Product,
        images: &[String],
    ) -> Result<TitleSuggestions, AiError> {
        let prompt = build_title_prompt(product);
        let text = self.complete(&prompt, images).await?;

        let mut suggestions = parse_title_response(&text);
        if let Some(title) = suggestions.main_title.take() {
            suggestions.main_title = Some(strip_brand_names(&title, BRAND_DENYLIST));
        }

        Ok(suggestions)
    }

    /// Generates a description, feature list, and tags for a product.
    pub async fn generate_description(
        &self,
        product: &Product,
        images: &[String],
    ) -> Result<DescriptionContent, AiError> {
        let prompt = build_description_prompt(product);
        let text = self.complete(&prompt, images).await?;

        Ok(parse_description_response(&text))
    }

    /// Asks for a pricing suggestion, expecting a strict-JSON reply.
    ///
    /// A reply without an extractable JSON object degrades to a
    /// `parsed: false` result carrying the raw text.
    pub async fn suggest_pricing(&self, product: &Product) -> Result<PriceSuggestion, AiError> {
        let prompt = build_pricing_prompt(product);
        let text = self.complete(&prompt, &[]).await?;

        Ok(parse_price_response(&text))
    }

    /// Sends one chat-completion request and returns the reply text.
    async fn complete(&self, prompt: &str, images: &[String]) -> Result<String, AiError> {
        let mut content = vec![json!({ "type": "text", "text": prompt })];
        for image in images {
            content.push(json!({
                "type": "image_url",
                "image_url": { "url": format!("data:image/jpeg;base64,{image}") }
            }));
        }

        let body = json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": content }],
        });

        debug!(model = %self.config.model, images = images.len(), "Calling AI endpoint");

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| AiError::MalformedResponse(e.to_string()))?;

        value["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AiError::MalformedResponse("no message content in reply".to_string()))
    }
}

// =============================================================================
// Prompt Builders
// =============================================================================

fn product_summary(product: &Product) -> String {
    let mut summary = format!("Product: {} (SKU {})", product.name, product.sku);
    if let Some(category) = &product.category {
        summary.push_str(&format!("\nCategory: {category}"));
    }
    if let Some(brand) = &product.brand {
        summary.push_str(&format!("\nBrand: {brand}"));
    }
    if let Some(description) = &product.description {
        summary.push_str(&format!("\nCurrent description: {description}"));
    }
    summary.push_str(&format!(
        "\nPrice: R{}.{:02}",
        product.price_cents / 100,
        product.price_cents % 100
    ));
    summary
}

fn build_title_prompt(product: &Product) -> String {
    format!(
        "You are writing retail listing copy.\n\n{}\n\n\
         Suggest titles for this product. Answer in exactly this format:\n\
         Main Title: <one title>\n\
         Alternative Title: <another title>\n\
         Alternative Title: <another title>\n\
         Keywords: <comma-separated search keywords>",
        product_summary(product)
    )
}

fn build_description_prompt(product: &Product) -> String {
    format!(
        "You are writing retail listing copy.\n\n{}\n\n\
         Write sales copy for this product. Answer in exactly this format:\n\
         Description: <one paragraph>\n\
         Feature: <one feature>\n\
         Feature: <one feature>\n\
         Tags: <comma-separated tags>",
        product_summary(product)
    )
}

fn build_pricing_prompt(product: &Product) -> String {
    format!(
        "{}\n\nCurrent stock: {}\n\n\
         Suggest an optimized retail price. Reply with ONLY a JSON object:\n\
         {{\"suggested_price_cents\": <integer>, \"reasoning\": \"<short reason>\"}}",
        product_summary(product),
        product.stock
    )
}

// =============================================================================
// Response Parsers
// =============================================================================

/// Parses the title reply by line prefixes.
fn parse_title_response(text: &str) -> TitleSuggestions {
    let mut result = TitleSuggestions::default();

    for line in text.lines() {
        let line = line.trim();
        if let Some(title) = line.strip_prefix("Main Title:") {
            let title = title.trim();
            if !title.is_empty() {
                result.main_title = Some(title.to_string());
            }
        } else if let Some(title) = line.strip_prefix("Alternative Title:") {
            let title = title.trim();
            if !title.is_empty() {
                result.alternative_titles.push(title.to_string());
            }
        } else if let Some(keywords) = line.strip_prefix("Keywords:") {
            result.keywords = split_list(keywords);
        }
    }

    result
}

/// Parses the description reply by line prefixes.
fn parse_description_response(text: &str) -> DescriptionContent {
    let mut result = DescriptionContent::default();

    for line in text.lines() {
        let line = line.trim();
        if let Some(description) = line.strip_prefix("Description:") {
            let description = description.trim();
            if !description.is_empty() {
                result.description = Some(description.to_string());
            }
        } else if let Some(feature) = line.strip_prefix("Feature:") {
            let feature = feature.trim();
            if !feature.is_empty() {
                result.features.push(feature.to_string());
            }
        } else if let Some(tags) = line.strip_prefix("Tags:") {
            result.tags = split_list(tags);
        }
    }

    result
}

/// Parses the pricing reply via strict-JSON extraction, degrading to the
/// unparseable fallback.
fn parse_price_response(text: &str) -> PriceSuggestion {
    let Some(object) = extract_json_object(text) else {
        return PriceSuggestion::unparseable(text);
    };

    let Ok(value) = serde_json::from_str::<Value>(object) else {
        return PriceSuggestion::unparseable(text);
    };

    let suggested = value["suggested_price_cents"].as_i64();
    if suggested.is_none() {
        return PriceSuggestion::unparseable(text);
    }

    PriceSuggestion {
        parsed: true,
        suggested_price_cents: suggested,
        reasoning: value["reasoning"].as_str().map(str::to_string),
        raw: text.to_string(),
    }
}

/// Slices the outermost `{...}` out of a reply, tolerating prose around it.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

/// Splits a comma-separated list, trimming and dropping empties.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Strips known brand substrings from a title (ASCII case-insensitive) and
/// collapses the whitespace left behind.
///
/// ASCII lowercasing keeps byte positions aligned with the original title,
/// so the match offsets are safe to splice with even when the title itself
/// contains non-ASCII characters.
fn strip_brand_names(title: &str, brands: &[&str]) -> String {
    let mut cleaned = title.to_string();

    for brand in brands {
        let target = brand.to_ascii_lowercase();
        while let Some(pos) = cleaned.to_ascii_lowercase().find(&target) {
            cleaned.replace_range(pos..pos + target.len(), "");
        }
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product() -> Product {
        let now = Utc::now();
        Product {
            id: "p1".to_string(),
            sku: "FRIDGE-450".to_string(),
            name: "450L Fridge".to_string(),
            description: Some("Large family fridge".to_string()),
            category: Some("Appliances".to_string()),
            brand: Some("KoolCo".to_string()),
            price_cents: 899_900,
            stock: 4,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_config_rejects_empty_key() {
        let err = AiConfig::new(DEFAULT_ENDPOINT, DEFAULT_MODEL, "").unwrap_err();
        assert!(matches!(err, AiError::MissingApiKey));

        assert!(AiConfig::new(DEFAULT_ENDPOINT, DEFAULT_MODEL, "sk-test").is_ok());
    }

    #[test]
    fn test_parse_title_response() {
        let reply = "\
Main Title: Spacious 450L Family Fridge\n\
Alternative Title: Energy-Saving 450L Refrigerator\n\
Alternative Title: Double-Door 450L Cooler\n\
Keywords: fridge, refrigerator, 450l, family, kitchen";

        let parsed = parse_title_response(reply);
        assert_eq!(
            parsed.main_title.as_deref(),
            Some("Spacious 450L Family Fridge")
        );
        assert_eq!(parsed.alternative_titles.len(), 2);
        assert_eq!(parsed.keywords.len(), 5);
        assert!(!parsed.is_empty());
    }

    #[test]
    fn test_unparseable_reply_degrades_to_empty() {
        let parsed = parse_title_response("Sorry, I cannot help with that.");
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_parse_description_response() {
        let reply = "\
Description: A spacious fridge for the whole family.\n\
Feature: 450 litre capacity\n\
Feature: A++ energy rating\n\
Tags: kitchen, appliance";

        let parsed = parse_description_response(reply);
        assert_eq!(
            parsed.description.as_deref(),
            Some("A spacious fridge for the whole family.")
        );
        assert_eq!(parsed.features.len(), 2);
        assert_eq!(parsed.tags, vec!["kitchen".to_string(), "appliance".to_string()]);
    }

    #[test]
    fn test_strip_brand_names() {
        assert_eq!(
            strip_brand_names("Samsung 450L Fridge", BRAND_DENYLIST),
            "450L Fridge"
        );
        // Case-insensitive
        assert_eq!(
            strip_brand_names("HISENSE Double Door", BRAND_DENYLIST),
            "Double Door"
        );
        // Untouched titles pass through
        assert_eq!(
            strip_brand_names("Generic 450L Fridge", BRAND_DENYLIST),
            "Generic 450L Fridge"
        );
    }

    #[test]
    fn test_extract_json_object() {
        assert_eq!(
            extract_json_object("Here you go: {\"a\": 1} hope that helps"),
            Some("{\"a\": 1}")
        );
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_parse_price_response() {
        let reply = "Sure! {\"suggested_price_cents\": 849900, \"reasoning\": \"competitive\"}";
        let parsed = parse_price_response(reply);
        assert!(parsed.parsed);
        assert_eq!(parsed.suggested_price_cents, Some(849_900));
        assert_eq!(parsed.reasoning.as_deref(), Some("competitive"));
    }

    #[test]
    fn test_parse_price_response_fallback() {
        let parsed = parse_price_response("I think around R8500 would work well.");
        assert!(!parsed.parsed);
        assert!(parsed.suggested_price_cents.is_none());
        assert_eq!(parsed.raw, "I think around R8500 would work well.");
    }

    #[test]
    fn test_prompts_embed_product_attributes() {
        let p = product();
        let title_prompt = build_title_prompt(&p);
        assert!(title_prompt.contains("450L Fridge"));
        assert!(title_prompt.contains("FRIDGE-450"));
        assert!(title_prompt.contains("Appliances"));

        let pricing_prompt = build_pricing_prompt(&p);
        assert!(pricing_prompt.contains("suggested_price_cents"));
        assert!(pricing_prompt.contains("Current stock: 4"));
    }
}
