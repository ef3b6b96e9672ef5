//! Intent analysis for the project wizard.
//!
//! Turns a free-text investment goal plus a target URL into a structured
//! [`ScrapingPlan`], and guesses likely extractable fields when only a URL
//! is known. Both operations are schema-constrained single calls.

use crate::error::GeminiError;
use crate::gemini::schema::ResponseSchema;
use crate::gemini::{GenerateRequest, TextGenerator, decode_structured};
use crate::models::GeminiModel;
use crate::prompt;
use serde::{Deserialize, Serialize};

/// Structured plan for a new scraping project.
///
/// Produced once per wizard run and immutable afterwards; the UI threads
/// `fields_to_extract` into spider generation. Scores are model-assigned
/// and surfaced verbatim, out-of-range values included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapingPlan {
    #[serde(default)]
    pub suggested_name: String,
    #[serde(default)]
    pub frequency_hint: String,
    #[serde(default)]
    pub fields_to_extract: Vec<String>,
    /// Scraping difficulty, 1-10 as instructed.
    #[serde(default)]
    pub difficulty_rating: f64,
    /// Investment attractiveness, 1-10 as instructed.
    #[serde(default)]
    pub investment_priority_score: f64,
}

const PLAN_TEMPLATE: &str = "\
Analyze this LED property investment intent for URL: {{ url }}. Intent: {{ intent }}.\
{% if province %} Only consider assets located in {{ province }} province.{% endif %} \
Provide a structured JSON output with fields for AHP Analysis: suggested_name, \
frequency_hint, fields_to_extract (price, appraisal_value, location, size, status), \
difficulty_rating (1-10), and investment_priority_score (1-10).";

const FIELD_TEMPLATE: &str = "\
Inspect this listing site URL and guess which data fields a scraper could extract \
from it: {{ url }}. Think of auction listing attributes such as prices, appraisal \
values, locations, sizes and asset statuses. Return a JSON array of snake_case \
field names, most useful first.";

/// Builds the plan-analysis instruction. Pure function of its inputs;
/// the province filter, when present, always appears in the text.
pub fn plan_prompt(
    intent: &str,
    url: &str,
    province: Option<&str>,
) -> Result<String, minijinja::Error> {
    prompt!(PLAN_TEMPLATE, intent = intent, url = url, province = province)
}

/// Builds the field-suggestion instruction from a URL alone.
pub fn field_prompt(url: &str) -> Result<String, minijinja::Error> {
    prompt!(FIELD_TEMPLATE, url = url)
}

fn plan_schema() -> ResponseSchema {
    ResponseSchema::object([
        ("suggested_name", ResponseSchema::string()),
        ("frequency_hint", ResponseSchema::string()),
        ("fields_to_extract", ResponseSchema::array_of_strings()),
        ("difficulty_rating", ResponseSchema::number()),
        ("investment_priority_score", ResponseSchema::number()),
    ])
}

/// Analyzes investment intents into scraping plans.
pub struct IntentAnalyzer<G> {
    gemini: G,
}

impl<G: TextGenerator> IntentAnalyzer<G> {
    pub fn new(gemini: G) -> Self {
        Self { gemini }
    }

    /// Turns an intent and target URL into a [`ScrapingPlan`].
    pub async fn analyze(
        &self,
        intent: &str,
        url: &str,
        province: Option<&str>,
    ) -> Result<ScrapingPlan, GeminiError> {
        let schema = plan_schema();
        let request = GenerateRequest::new(GeminiModel::FlashLite25, plan_prompt(intent, url, province)?)
            .with_response_schema(schema.clone());
        let response = self.gemini.generate(request).await?;
        decode_structured(&schema, &response.text)
    }

    /// Guesses likely extractable field names for a URL alone.
    pub async fn suggest_fields(&self, url: &str) -> Result<Vec<String>, GeminiError> {
        let schema = ResponseSchema::array_of_strings();
        let request = GenerateRequest::new(GeminiModel::FlashLite25, field_prompt(url)?)
            .with_response_schema(schema.clone());
        let response = self.gemini.generate(request).await?;
        decode_structured(&schema, &response.text)
    }
}
