//! Spider source generation and repair.
//!
//! The "spider" is opaque Python text: this layer produces and edits it but
//! never executes it. Generation and refactoring both run on the Pro model
//! with deep thinking, under a Scrapy-engineer persona.

use crate::error::GeminiError;
use crate::extract::unfence_code;
use crate::gemini::{GenerateRequest, TextGenerator, ThinkingLevel};
use crate::models::GeminiModel;
use crate::prompt;

/// Persona for first-pass generation: extraction tuned for AHP inputs.
const ENGINEER_PERSONA: &str = "\
You are an expert Scrapy engineer and a Legal Execution Department (LED) \
property-investment analyst. Focus extraction on the data needed for AHP \
analysis: appraisal value, starting price, location, size, and asset status.";

/// Persona for refactoring: selector repair on LED property sites.
const REFACTOR_PERSONA: &str = "\
You are a specialist in repairing Scrapy spiders for Legal Execution \
Department property sites.";

const GENERATE_TEMPLATE: &str = "\
Write a Scrapy spider for LED Properties: {{ url }}.
Focus on: {{ fields | join(', ') }}.
{% if drive_export %}Export directly to Google Drive as CSV for AHP processing.\
{% else %}Standard CSV output.{% endif %}
CRITICAL: Extract appraisal value vs starting price to calculate 'Investment Gap'.
Return ONLY clean Python code.";

const REFACTOR_TEMPLATE: &str = "\
Refactor this LED Property Spider. Fix selectors or add drive integration. \
Intent: {{ intent }}. Logs: {{ logs }}. Current Code: {{ current_source }}\
{% if drive_export %}
The spider must export directly to Google Drive as CSV.{% endif %}";

/// Builds the generation instruction. Every requested field and the
/// drive-export choice appear in the text.
pub fn generation_prompt(
    url: &str,
    fields: &[String],
    drive_export: bool,
) -> Result<String, minijinja::Error> {
    prompt!(
        GENERATE_TEMPLATE,
        url = url,
        fields = fields,
        drive_export = drive_export,
    )
}

/// Builds the refactoring instruction from the current source and run logs.
pub fn refactor_prompt(
    current_source: &str,
    logs: &str,
    intent: &str,
    drive_export: bool,
) -> Result<String, minijinja::Error> {
    prompt!(
        REFACTOR_TEMPLATE,
        current_source = current_source,
        logs = logs,
        intent = intent,
        drive_export = drive_export,
    )
}

/// Generates and refactors spider source text.
pub struct SpiderStudio<G> {
    gemini: G,
}

impl<G: TextGenerator> SpiderStudio<G> {
    pub fn new(gemini: G) -> Self {
        Self { gemini }
    }

    /// Emits fresh spider source for a target URL and field list.
    ///
    /// The reply is unfenced if the model wrapped it in Markdown despite
    /// being told not to; otherwise the raw text is returned as-is.
    pub async fn generate(
        &self,
        url: &str,
        fields: &[String],
        drive_export: bool,
    ) -> Result<String, GeminiError> {
        let request = GenerateRequest::new(
            GeminiModel::Pro3,
            generation_prompt(url, fields, drive_export)?,
        )
        .with_system_instruction(ENGINEER_PERSONA)
        .with_thinking_level(ThinkingLevel::High);

        let response = self.gemini.generate(request).await?;
        Ok(unfence_code(&response.text, "python"))
    }

    /// Revises existing spider source against recent run logs.
    pub async fn refactor(
        &self,
        current_source: &str,
        logs: &str,
        intent: &str,
        drive_export: bool,
    ) -> Result<String, GeminiError> {
        let request = GenerateRequest::new(
            GeminiModel::Pro3,
            refactor_prompt(current_source, logs, intent, drive_export)?,
        )
        .with_system_instruction(REFACTOR_PERSONA)
        .with_thinking_level(ThinkingLevel::High);

        let response = self.gemini.generate(request).await?;
        Ok(unfence_code(&response.text, "python"))
    }
}
