//! Fabricated sample records standing in for real scraped output.
//!
//! The dashboard has no scraping engine; "running" a spider asks the model
//! to invent a handful of plausible records instead. The field set of each
//! record is whatever the model chose to emit, so records are dynamic maps
//! rather than a fixed struct.

use crate::error::GeminiError;
use crate::extract::extract_json;
use crate::gemini::{GenerateRequest, TextGenerator};
use crate::models::GeminiModel;
use crate::prompt;
use serde_json::{Map, Value};

/// One fabricated record: field names discovered per call.
pub type SampleRecord = Map<String, Value>;

const SAMPLE_TEMPLATE: &str = "\
Generate {{ count }} realistic LED property records for AHP analysis based on: \
{{ intent }}. Include: property_id, appraisal_value, start_price, location, \
property_type. Return as JSON array.";

/// Builds the fabrication instruction; the requested count always appears.
pub fn sample_prompt(intent: &str, count: usize) -> Result<String, minijinja::Error> {
    prompt!(SAMPLE_TEMPLATE, intent = intent, count = count)
}

/// Fabricates sample auction records for a project.
pub struct SampleForge<G> {
    gemini: G,
}

impl<G: TextGenerator> SampleForge<G> {
    pub fn new(gemini: G) -> Self {
        Self { gemini }
    }

    /// Asks for `count` records shaped after the project's intent.
    ///
    /// The envelope must be an array of objects; anything else is a parse
    /// error. The count is instructed, not enforced: the model is trusted
    /// to honor it and the caller renders however many came back.
    pub async fn generate(
        &self,
        intent: &str,
        count: usize,
    ) -> Result<Vec<SampleRecord>, GeminiError> {
        let request = GenerateRequest::new(GeminiModel::Flash3, sample_prompt(intent, count)?)
            .with_json_response();
        let response = self.gemini.generate(request).await?;
        decode_records(&response.text)
    }
}

fn decode_records(text: &str) -> Result<Vec<SampleRecord>, GeminiError> {
    let raw = extract_json(text)?;
    let value: Value = serde_json::from_str(&raw)
        .map_err(|err| GeminiError::ParseError(format!("response is not valid JSON: {err}")))?;

    let Value::Array(items) = value else {
        return Err(GeminiError::ParseError(
            "expected a top-level array of records".to_string(),
        ));
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(record) => Ok(record),
            other => Err(GeminiError::ParseError(format!(
                "expected record objects in the array, got {other}"
            ))),
        })
        .collect()
}
