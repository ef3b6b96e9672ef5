//! `led-scout` - Gemini-backed orchestration for an LED auction dashboard.
//!
//! This library is the intelligence layer of a dashboard that scouts Thai
//! Legal Execution Department (LED) property auctions: it plans scraping
//! projects, writes and repairs Scrapy spiders, fabricates sample records,
//! ranks them with an AHP-style narrative, and answers free-form questions,
//! all by orchestrating calls to the Gemini `generateContent` API.
//!
//! It focuses on the last-mile problems at the boundary between a
//! strongly-typed Rust application and an unpredictable generative service:
//! building instructions that faithfully carry every caller parameter,
//! declaring the JSON shape a call must produce, salvaging payloads out of
//! chatty replies, and keeping chat-session state coherent across failures.
//!
//! # Components
//!
//! Each component is an independent leaf over the same [`gemini::TextGenerator`]
//! seam; nothing here persists state or talks to anything but the model:
//!
//! - [`plan::IntentAnalyzer`] - investment intent + URL into a [`plan::ScrapingPlan`],
//!   and field-name suggestion from a URL alone
//! - [`spider::SpiderStudio`] - spider source generation and log-driven repair
//! - [`sample::SampleForge`] - fabricated sample records (no real scraping exists)
//! - [`ranking::AhpRanker`] - per-record AHP scores and provincial aggregation
//! - [`advisor::ResearchAdvisor`] - search-grounded strategy and log diagnosis
//! - [`chat::ChatAgent`] - the chat panel's session-keeping assistant
//!
//! # Example
//!
//! ```rust,no_run
//! use led_scout::{GeminiClient, IntentAnalyzer, SpiderStudio};
//!
//! # async fn example() -> Result<(), led_scout::GeminiError> {
//! let client = GeminiClient::try_from_env()?;
//!
//! let analyzer = IntentAnalyzer::new(client.clone());
//! let plan = analyzer
//!     .analyze(
//!         "undervalued warehouses near the EEC",
//!         "https://asset.led.go.th",
//!         Some("Chonburi"),
//!     )
//!     .await?;
//!
//! let studio = SpiderStudio::new(client);
//! let source = studio
//!     .generate("https://asset.led.go.th", &plan.fields_to_extract, false)
//!     .await?;
//! println!("{source}");
//! # Ok(())
//! # }
//! ```

pub mod advisor;
pub mod chat;
pub mod error;
pub mod extract;
pub mod gemini;
pub mod models;
pub mod plan;
pub mod prompt;
pub mod ranking;
pub mod sample;
pub mod spider;

pub use advisor::{AdvisoryReport, AssetDigest, ResearchAdvisor};
pub use chat::{ChatAgent, ChatTurn, needs_live_search};
pub use error::GeminiError;
pub use extract::{extract_json, fenced_block, unfence_code};
pub use gemini::schema::ResponseSchema;
pub use gemini::{
    Citation, GeminiClient, GenerateRequest, GenerateResponse, Role, TextGenerator, ThinkingLevel,
};
pub use models::GeminiModel;
pub use plan::{IntentAnalyzer, ScrapingPlan};
pub use ranking::{AhpRanker, ProvincialBreakdown, ProvincialSummary, RankedRecord};
pub use sample::{SampleForge, SampleRecord};
pub use spider::SpiderStudio;
