//! Search-grounded advisory: bidding strategy and log diagnosis.
//!
//! Both operations are free-text calls with the Google Search tool enabled,
//! so the reply is prose plus whatever citations the service surfaced. A
//! report always carries a citation list; it is simply empty when no
//! grounding occurred.

use crate::error::GeminiError;
use crate::gemini::{Citation, GenerateRequest, TextGenerator, ThinkingLevel};
use crate::models::GeminiModel;
use crate::prompt;
use serde::{Deserialize, Serialize};

/// Prose advisory plus its supporting web sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryReport {
    pub text: String,
    pub sources: Vec<Citation>,
}

/// Compact digest of a top-ranked asset, as inlined into the strategy
/// prompt. Mirrors the dashboard's ranking table columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDigest {
    pub id: String,
    #[serde(rename = "loc")]
    pub location: String,
    /// Appraisal-vs-start-price gap, in percent.
    pub gap: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

const ADVISOR_PERSONA: &str = "\
You are a professional property-investment advisor specializing in Legal \
Execution Department (LED) auction assets. Use live Google Search results to \
support every recommendation.";

const STRATEGY_TEMPLATE: &str = "\
Analyze these top-ranked LED assets for investment potential: {{ assets }}.
Perform a SWOT analysis for each location using Google Search to find recent \
news (infrastructure, new factories, flood risks).
Suggest a specific bidding strategy for each (e.g., skip first round, bid at 80%).
Format the response clearly with sections for Market Pulse, SWOT, and Recommendations.";

const LOG_TEMPLATE: &str = "\
Analyze these Scrapy system logs and identify any issues, bottlenecks, or \
anti-bot detections. Suggest specific technical fixes. If there are HTTP \
errors, search for recent site changes or Scrapy solutions. Logs:
{{ logs }}";

/// Builds the strategy instruction with asset digests inlined as JSON.
pub fn strategy_prompt(assets: &[AssetDigest]) -> Result<String, minijinja::Error> {
    let digest = serde_json::to_string(assets).unwrap_or_default();
    prompt!(STRATEGY_TEMPLATE, assets = digest)
}

/// Builds the log-diagnosis instruction.
pub fn diagnosis_prompt(logs: &str) -> Result<String, minijinja::Error> {
    prompt!(LOG_TEMPLATE, logs = logs)
}

/// Grounded advisory over ranked assets and run logs.
pub struct ResearchAdvisor<G> {
    gemini: G,
}

impl<G: TextGenerator> ResearchAdvisor<G> {
    pub fn new(gemini: G) -> Self {
        Self { gemini }
    }

    /// SWOT-style strategy review of the top-ranked assets.
    pub async fn strategic_analysis(
        &self,
        assets: &[AssetDigest],
    ) -> Result<AdvisoryReport, GeminiError> {
        let request = GenerateRequest::new(GeminiModel::Pro3, strategy_prompt(assets)?)
            .with_system_instruction(ADVISOR_PERSONA)
            .with_thinking_level(ThinkingLevel::High)
            .with_google_search(true);

        let response = self.gemini.generate(request).await?;
        Ok(AdvisoryReport {
            text: response.text,
            sources: response.citations,
        })
    }

    /// Triage of raw spider run logs, grounded against current fixes.
    pub async fn diagnose_logs(&self, logs: &str) -> Result<AdvisoryReport, GeminiError> {
        let request = GenerateRequest::new(GeminiModel::Pro3, diagnosis_prompt(logs)?)
            .with_thinking_level(ThinkingLevel::Medium)
            .with_google_search(true);

        let response = self.gemini.generate(request).await?;
        Ok(AdvisoryReport {
            text: response.text,
            sources: response.citations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::GenerateResponse;
    use crate::gemini::testing::StubGemini;

    fn assets() -> Vec<AssetDigest> {
        vec![AssetDigest {
            id: "LED-042".to_string(),
            location: "Chonburi".to_string(),
            gap: 22.5,
            kind: "warehouse".to_string(),
        }]
    }

    #[test]
    fn asset_digest_uses_compact_keys() {
        let wire = serde_json::to_value(&assets()[0]).unwrap();
        assert_eq!(wire["loc"], "Chonburi");
        assert_eq!(wire["type"], "warehouse");
        assert!(wire.get("location").is_none());
    }

    #[test]
    fn strategy_prompt_embeds_every_asset() {
        let text = strategy_prompt(&assets()).unwrap();
        assert!(text.contains("LED-042"));
        assert!(text.contains("SWOT"));
    }

    #[tokio::test]
    async fn strategic_analysis_surfaces_citations() {
        let stub = StubGemini::new().reply(GenerateResponse {
            text: "Market Pulse: demand is up.".to_string(),
            citations: vec![
                Citation {
                    uri: "https://news.example/eec".to_string(),
                    title: "EEC expansion".to_string(),
                },
                Citation {
                    uri: "https://news.example/floods".to_string(),
                    title: "Flood map update".to_string(),
                },
            ],
        });
        let advisor = ResearchAdvisor::new(&stub);

        let report = advisor.strategic_analysis(&assets()).await.unwrap();
        assert_eq!(report.sources.len(), 2);
        assert!(report.text.contains("Market Pulse"));

        let requests = stub.recorded();
        assert!(requests[0].google_search);
        assert_eq!(requests[0].thinking_level, Some(ThinkingLevel::High));
    }

    #[tokio::test]
    async fn diagnose_logs_with_no_grounding_metadata() {
        let stub = StubGemini::new().reply_text("Retry with AUTOTHROTTLE enabled.");
        let advisor = ResearchAdvisor::new(&stub);

        let report = advisor.diagnose_logs("503 x 40").await.unwrap();
        assert!(report.sources.is_empty());

        let requests = stub.recorded();
        assert!(requests[0].messages[0].text.contains("503 x 40"));
        assert_eq!(requests[0].thinking_level, Some(ThinkingLevel::Medium));
    }

    #[tokio::test]
    async fn diagnosis_failure_propagates_without_partial_result() {
        let stub = StubGemini::new().fail_transport();
        let advisor = ResearchAdvisor::new(&stub);

        let result = advisor.diagnose_logs("anything").await;
        assert!(matches!(result, Err(GeminiError::TransportError { .. })));
    }
}
