//! AHP-style scoring and provincial aggregation.
//!
//! "AHP" here is a narrative the model is prompted to emulate with fixed
//! criteria weights, not deterministic arithmetic: scores arrive as
//! model-generated numbers and are surfaced without validation or
//! reordering. The caller joins ranked entries back to their records by id
//! and sorts descending for display.

use crate::error::GeminiError;
use crate::gemini::schema::ResponseSchema;
use crate::gemini::{GenerateRequest, TextGenerator, decode_structured};
use crate::models::GeminiModel;
use crate::prompt;
use crate::sample::SampleRecord;
use serde::{Deserialize, Serialize};

/// Relevance verdict for one sample record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRecord {
    /// Matches an identifier in the scored record set.
    #[serde(default)]
    pub id: String,
    /// 0.0-10.0 as instructed.
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub reasoning: String,
}

/// Aggregate opportunity estimate for one province.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvincialSummary {
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub count: f64,
    #[serde(default)]
    pub avg_gap: f64,
    #[serde(default)]
    pub ahp_potential_score: f64,
}

/// Grouped provincial distribution plus a narrative market insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvincialBreakdown {
    #[serde(default)]
    pub top_provinces: Vec<ProvincialSummary>,
    #[serde(default)]
    pub market_insight: String,
}

const SCORE_TEMPLATE: &str = "\
Calculate AHP scores (0.0 to 10.0) for these LED properties based on intent: {{ intent }}.
Data: {{ data }}.
Criteria Weights: Price Gap (50%), Location Potential (30%), Property Status (20%).
Return JSON array of objects with keys: id, score, reasoning.";

const PROVINCIAL_TEMPLATE: &str = "\
Perform a provincial distribution analysis for {{ total_items }} LED property items \
based on the intent: {{ intent }}.
Group the items by province and estimate where the most profitable opportunities lie.
Return a JSON object with:
- top_provinces: Array of {province, count, avg_gap, ahp_potential_score}
- market_insight: A summary of why certain provinces are trending in LED auctions.";

/// Builds the scoring instruction with the records inlined as JSON.
pub fn score_prompt(intent: &str, records: &[SampleRecord]) -> Result<String, minijinja::Error> {
    let data = serde_json::to_string(records).unwrap_or_default();
    prompt!(SCORE_TEMPLATE, intent = intent, data = data)
}

/// Builds the provincial-analysis instruction.
pub fn provincial_prompt(total_items: u64, intent: &str) -> Result<String, minijinja::Error> {
    prompt!(PROVINCIAL_TEMPLATE, total_items = total_items, intent = intent)
}

fn score_schema() -> ResponseSchema {
    ResponseSchema::array(ResponseSchema::object([
        ("id", ResponseSchema::string()),
        ("score", ResponseSchema::number()),
        ("reasoning", ResponseSchema::string()),
    ]))
}

fn provincial_schema() -> ResponseSchema {
    ResponseSchema::object([
        (
            "top_provinces",
            ResponseSchema::array(ResponseSchema::object([
                ("province", ResponseSchema::string()),
                ("count", ResponseSchema::number()),
                ("avg_gap", ResponseSchema::number()),
                ("ahp_potential_score", ResponseSchema::number()),
            ])),
        ),
        ("market_insight", ResponseSchema::string()),
    ])
}

/// Scores sample records and aggregates provincial opportunity.
pub struct AhpRanker<G> {
    gemini: G,
}

impl<G: TextGenerator> AhpRanker<G> {
    pub fn new(gemini: G) -> Self {
        Self { gemini }
    }

    /// Scores each record for investment relevance against the intent.
    pub async fn score(
        &self,
        intent: &str,
        records: &[SampleRecord],
    ) -> Result<Vec<RankedRecord>, GeminiError> {
        let schema = score_schema();
        let request = GenerateRequest::new(GeminiModel::Flash3, score_prompt(intent, records)?)
            .with_response_schema(schema.clone());
        let response = self.gemini.generate(request).await?;
        decode_structured(&schema, &response.text)
    }

    /// Fabricates a by-province opportunity summary for a record count.
    pub async fn provincial_breakdown(
        &self,
        total_items: u64,
        intent: &str,
    ) -> Result<ProvincialBreakdown, GeminiError> {
        let schema = provincial_schema();
        let request =
            GenerateRequest::new(GeminiModel::Flash3, provincial_prompt(total_items, intent)?)
                .with_response_schema(schema.clone());
        let response = self.gemini.generate(request).await?;
        decode_structured(&schema, &response.text)
    }
}
