//! Direct REST client for the Gemini `generateContent` API.
//!
//! Every orchestration component in this crate funnels through one
//! operation: build a [`GenerateRequest`], await [`TextGenerator::generate`],
//! and shape the text that comes back. The [`GeminiClient`] is the real
//! implementation; tests substitute scripted fakes behind the same trait.
//!
//! # Example
//!
//! ```rust,no_run
//! use led_scout::gemini::{GeminiClient, GenerateRequest, TextGenerator};
//! use led_scout::models::GeminiModel;
//!
//! # async fn example() -> Result<(), led_scout::GeminiError> {
//! // From environment variable (GEMINI_API_KEY)
//! let client = GeminiClient::try_from_env()?;
//!
//! let request = GenerateRequest::new(GeminiModel::Flash3, "Hello!")
//!     .with_google_search(true);
//! let response = client.generate(request).await?;
//! println!("{} ({} sources)", response.text, response.citations.len());
//! # Ok(())
//! # }
//! ```

pub mod schema;

use crate::error::GeminiError;
use crate::models::GeminiModel;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::HeaderValue};
use self::schema::ResponseSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::env;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Internal deliberation depth requested from the model.
///
/// A latency/quality knob, not a semantic input: the same instruction with
/// a higher level costs more wall-clock time for (usually) better output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThinkingLevel {
    Low,
    Medium,
    High,
}

/// Who produced a message: the caller or the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One turn of conversation content, in wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// A web source surfaced by search grounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub uri: String,
    pub title: String,
}

/// A single `generateContent` call, fully described.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: GeminiModel,
    /// Conversation contents, oldest first. Single-shot calls carry one
    /// user message; chat sessions replay their whole history here.
    pub messages: Vec<ChatMessage>,
    /// Persona preamble sent as the system instruction.
    pub system_instruction: Option<String>,
    /// Declared output shape. Implies a JSON response.
    pub response_schema: Option<ResponseSchema>,
    /// Ask for JSON output without constraining its shape.
    pub json_response: bool,
    pub thinking_level: Option<ThinkingLevel>,
    /// Enables the Google Search grounding tool for this call.
    pub google_search: bool,
}

impl GenerateRequest {
    /// A single-shot request carrying one user instruction.
    pub fn new(model: GeminiModel, instruction: impl Into<String>) -> Self {
        Self::from_messages(model, vec![ChatMessage::user(instruction)])
    }

    /// A request replaying an existing conversation.
    pub fn from_messages(model: GeminiModel, messages: Vec<ChatMessage>) -> Self {
        Self {
            model,
            messages,
            system_instruction: None,
            response_schema: None,
            json_response: false,
            thinking_level: None,
            google_search: false,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Declares the expected JSON output shape for this call.
    pub fn with_response_schema(mut self, schema: ResponseSchema) -> Self {
        self.response_schema = Some(schema);
        self.json_response = true;
        self
    }

    /// Requests a JSON MIME type without declaring a shape.
    pub fn with_json_response(mut self) -> Self {
        self.json_response = true;
        self
    }

    pub fn with_thinking_level(mut self, level: ThinkingLevel) -> Self {
        self.thinking_level = Some(level);
        self
    }

    pub fn with_google_search(mut self, enable: bool) -> Self {
        self.google_search = enable;
        self
    }
}

/// The model's reply: candidate text plus any grounding citations.
///
/// `citations` is always present and empty unless the search tool was
/// enabled and the service returned grounding metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateResponse {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// The seam between orchestration and the generative service.
///
/// [`GeminiClient`] is the production implementation; tests inject
/// scripted fakes. Implementations are stateless per call: identical
/// requests may legitimately produce different responses.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, GeminiError>;
}

#[async_trait]
impl<'a, T: TextGenerator + ?Sized> TextGenerator for &'a T {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, GeminiError> {
        (**self).generate(request).await
    }
}

/// HTTP client for the Gemini REST API.
///
/// Cheap to construct and `Clone`; the API credential is passed in
/// explicitly rather than read from ambient state at call time.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
}

impl GeminiClient {
    /// Creates a client with the provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Loads the API key from the `GEMINI_API_KEY` environment variable.
    pub fn try_from_env() -> Result<Self, GeminiError> {
        let api_key = env::var("GEMINI_API_KEY").map_err(|_| {
            GeminiError::Other("GEMINI_API_KEY environment variable not set".to_string())
        })?;
        Ok(Self::new(api_key))
    }

    async fn send_request(
        &self,
        model: &GeminiModel,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            BASE_URL,
            model = model.as_api_id(),
            api_key = self.api_key
        );

        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| GeminiError::TransportError {
                status_code: None,
                message: format!("Gemini API request failed: {err}"),
                is_retryable: err.is_connect() || err.is_timeout(),
                retry_after: None,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        let body_text = response.text().await.map_err(|err| {
            GeminiError::Other(format!("Failed to read Gemini response body: {err}"))
        })?;

        serde_json::from_str(&body_text).map_err(|err| {
            let truncated = if body_text.len() > 500 {
                format!("{}... (truncated, total {} bytes)", &body_text[..500], body_text.len())
            } else {
                body_text.clone()
            };
            GeminiError::ParseError(format!(
                "Failed to parse Gemini response: {err}\n\nResponse body:\n{truncated}"
            ))
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, GeminiError> {
        debug!(
            target: "led_scout::gemini",
            model = %request.model,
            grounded = request.google_search,
            structured = request.response_schema.is_some(),
            turns = request.messages.len(),
            "dispatching generateContent"
        );

        let body = build_wire_request(&request)?;
        let parsed = self.send_request(&request.model, &body).await?;
        shape_response(parsed)
    }
}

/// Decodes a structured response against its declared shape.
///
/// The guarantee is deliberately thin: the salvaged text must be valid
/// JSON whose top level matches the declared root (object vs array).
/// Everything below that is handled by `serde` defaults on the target
/// type, so a missing field is an absent value, not an error.
pub fn decode_structured<T: DeserializeOwned>(
    schema: &ResponseSchema,
    text: &str,
) -> Result<T, GeminiError> {
    let raw = crate::extract::extract_json(text)?;
    let value: Value = serde_json::from_str(&raw)
        .map_err(|err| GeminiError::ParseError(format!("response is not valid JSON: {err}")))?;

    if !schema.matches_root(&value) {
        return Err(GeminiError::ParseError(format!(
            "expected a top-level {:?}, got {}",
            schema.schema_type,
            json_kind(&value)
        )));
    }

    serde_json::from_value(value).map_err(|err| {
        GeminiError::ParseError(format!("response did not fit the declared shape: {err}"))
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

fn build_wire_request(request: &GenerateRequest) -> Result<GenerateContentRequest, GeminiError> {
    if request.messages.iter().all(|m| m.text.trim().is_empty()) {
        return Err(GeminiError::Other(
            "Gemini request must include at least one non-empty message".to_string(),
        ));
    }

    let contents = request
        .messages
        .iter()
        .map(|message| Content {
            role: message.role.as_str().to_string(),
            parts: vec![Part {
                text: message.text.clone(),
            }],
        })
        .collect();

    let system_instruction = request.system_instruction.as_ref().map(|text| Content {
        role: "system".to_string(),
        parts: vec![Part { text: text.clone() }],
    });

    let generation_config = if request.json_response || request.thinking_level.is_some() {
        Some(GenerationConfig {
            response_mime_type: request
                .json_response
                .then(|| "application/json".to_string()),
            response_schema: request.response_schema.clone(),
            thinking_config: request
                .thinking_level
                .map(|level| ThinkingConfig { thinking_level: level }),
        })
    } else {
        None
    };

    let tools = request
        .google_search
        .then(|| vec![Tool::GoogleSearch(GoogleSearchTool {})]);

    Ok(GenerateContentRequest {
        contents,
        system_instruction,
        generation_config,
        tools,
    })
}

fn shape_response(response: GenerateContentResponse) -> Result<GenerateResponse, GeminiError> {
    let candidate = response
        .candidates
        .and_then(|mut candidates| {
            if candidates.is_empty() {
                None
            } else {
                Some(candidates.remove(0))
            }
        })
        .ok_or_else(|| {
            GeminiError::ParseError("Gemini API returned no response candidates".to_string())
        })?;

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GeminiError::ParseError(
            "Gemini API returned no text in the response candidate".to_string(),
        ));
    }

    let citations = candidate
        .grounding_metadata
        .and_then(|metadata| metadata.grounding_chunks)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|chunk| chunk.web)
        .filter_map(|web| {
            let uri = web.uri?;
            let title = web.title.filter(|t| !t.is_empty()).unwrap_or_else(|| uri.clone());
            Some(Citation { uri, title })
        })
        .collect();

    Ok(GenerateResponse { text, citations })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<ResponseSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_level: ThinkingLevel,
}

#[derive(Serialize)]
enum Tool {
    #[serde(rename = "googleSearch")]
    GoogleSearch(GoogleSearchTool),
}

#[derive(Serialize)]
struct GoogleSearchTool {}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ContentResponse>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    grounding_chunks: Option<Vec<GroundingChunk>>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Deserialize)]
struct WebSource {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: Option<i32>,
    message: Option<String>,
    status: Option<String>,
}

fn map_http_error(status: StatusCode, body: String, retry_after: Option<Duration>) -> GeminiError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    GeminiError::TransportError {
        status_code: Some(status.as_u16()),
        message,
        is_retryable,
        retry_after,
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    None
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire_json(request: &GenerateRequest) -> Value {
        let body = build_wire_request(request).unwrap();
        serde_json::to_value(&body).unwrap()
    }

    #[test]
    fn basic_request_serialization() {
        let request = GenerateRequest::new(GeminiModel::Flash25, "Hello");
        let wire = wire_json(&request);

        assert_eq!(wire["contents"][0]["role"], "user");
        assert_eq!(wire["contents"][0]["parts"][0]["text"], "Hello");
        assert!(wire.get("systemInstruction").is_none());
        assert!(wire.get("generationConfig").is_none());
        assert!(wire.get("tools").is_none());
    }

    #[test]
    fn thinking_level_serialization() {
        let request = GenerateRequest::new(GeminiModel::Pro3, "Solve this")
            .with_thinking_level(ThinkingLevel::High);
        let wire = wire_json(&request);

        assert_eq!(
            wire["generationConfig"]["thinkingConfig"]["thinkingLevel"],
            "HIGH"
        );
    }

    #[test]
    fn google_search_tool_serialization() {
        let request =
            GenerateRequest::new(GeminiModel::Flash3, "Search for news").with_google_search(true);
        let wire = wire_json(&request);

        assert!(wire["tools"][0].get("googleSearch").is_some());
    }

    #[test]
    fn schema_implies_json_mime_type() {
        let request = GenerateRequest::new(GeminiModel::FlashLite25, "Plan it")
            .with_response_schema(ResponseSchema::object([(
                "suggested_name",
                ResponseSchema::string(),
            )]));
        let wire = wire_json(&request);

        assert_eq!(
            wire["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            wire["generationConfig"]["responseSchema"]["type"],
            "OBJECT"
        );
    }

    #[test]
    fn json_mime_without_schema() {
        let request =
            GenerateRequest::new(GeminiModel::Flash3, "Records please").with_json_response();
        let wire = wire_json(&request);

        assert_eq!(
            wire["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert!(wire["generationConfig"].get("responseSchema").is_none());
    }

    #[test]
    fn system_instruction_serialization() {
        let request = GenerateRequest::new(GeminiModel::Pro3, "Write a spider")
            .with_system_instruction("You are an expert Scrapy engineer.");
        let wire = wire_json(&request);

        assert_eq!(wire["systemInstruction"]["role"], "system");
        assert_eq!(
            wire["systemInstruction"]["parts"][0]["text"],
            "You are an expert Scrapy engineer."
        );
    }

    #[test]
    fn empty_request_is_rejected() {
        let request = GenerateRequest::new(GeminiModel::Flash25, "   ");
        assert!(build_wire_request(&request).is_err());
    }

    #[test]
    fn response_text_concatenates_parts() {
        let parsed: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "parts": [{"text": "Hello, "}, {"text": "world!"}]
                }
            }]
        }))
        .unwrap();

        let response = shape_response(parsed).unwrap();
        assert_eq!(response.text, "Hello, world!");
        assert!(response.citations.is_empty());
    }

    #[test]
    fn empty_candidates_is_a_parse_error() {
        let parsed: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": []})).unwrap();
        assert!(matches!(
            shape_response(parsed),
            Err(GeminiError::ParseError(_))
        ));
    }

    #[test]
    fn grounding_chunks_become_citations() {
        let parsed: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"text": "Grounded answer"}]},
                "groundingMetadata": {
                    "groundingChunks": [
                        {"web": {"uri": "https://a.example", "title": "Site A"}},
                        {"web": {"uri": "https://b.example"}},
                        {"retrievedContext": {"uri": "ignored"}}
                    ]
                }
            }]
        }))
        .unwrap();

        let response = shape_response(parsed).unwrap();
        assert_eq!(response.citations.len(), 2);
        assert_eq!(response.citations[0].title, "Site A");
        // Missing title falls back to the URI.
        assert_eq!(response.citations[1].title, "https://b.example");
    }

    #[test]
    fn http_error_body_is_surfaced() {
        let body = json!({
            "error": {"code": 400, "message": "Invalid API key", "status": "INVALID_ARGUMENT"}
        })
        .to_string();

        let error = map_http_error(StatusCode::BAD_REQUEST, body, None);
        match error {
            GeminiError::TransportError {
                status_code,
                message,
                is_retryable,
                ..
            } => {
                assert_eq!(status_code, Some(400));
                assert!(message.contains("INVALID_ARGUMENT"));
                assert!(message.contains("Invalid API key"));
                assert!(!is_retryable);
            }
            other => panic!("Expected TransportError, got {other:?}"),
        }
    }

    #[test]
    fn retryable_status_classification() {
        for status in [
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            let error = map_http_error(status, "error".to_string(), None);
            assert!(error.is_retryable(), "{status:?} should be retryable");
        }

        for status in [StatusCode::UNAUTHORIZED, StatusCode::NOT_FOUND] {
            let error = map_http_error(status, "error".to_string(), None);
            assert!(!error.is_retryable(), "{status:?} should not be retryable");
        }
    }

    #[test]
    fn retry_after_header_parsing() {
        let header = HeaderValue::from_static("30");
        assert_eq!(
            parse_retry_after(Some(&header)),
            Some(Duration::from_secs(30))
        );

        let bad = HeaderValue::from_static("soon");
        assert_eq!(parse_retry_after(Some(&bad)), None);
        assert_eq!(parse_retry_after(None), None);
    }

    #[test]
    fn decode_structured_accepts_declared_object() {
        #[derive(Deserialize)]
        struct Out {
            #[serde(default)]
            name: String,
            #[serde(default)]
            score: f64,
        }

        let schema = ResponseSchema::object([
            ("name", ResponseSchema::string()),
            ("score", ResponseSchema::number()),
        ]);
        let out: Out =
            decode_structured(&schema, "```json\n{\"name\": \"lot-1\", \"score\": 8.5}\n```")
                .unwrap();
        assert_eq!(out.name, "lot-1");
        assert_eq!(out.score, 8.5);
    }

    #[test]
    fn decode_structured_defaults_missing_fields() {
        #[derive(Deserialize)]
        struct Out {
            #[serde(default)]
            name: String,
            #[serde(default)]
            score: f64,
        }

        let schema = ResponseSchema::object([("name", ResponseSchema::string())]);
        let out: Out = decode_structured(&schema, "{}").unwrap();
        assert_eq!(out.name, "");
        assert_eq!(out.score, 0.0);
    }

    #[test]
    fn decode_structured_rejects_wrong_envelope() {
        let schema = ResponseSchema::array(ResponseSchema::object([]));
        let result: Result<Vec<Value>, _> = decode_structured(&schema, "{\"not\": \"an array\"}");
        match result {
            Err(GeminiError::ParseError(message)) => {
                assert!(message.contains("Array"), "unexpected message: {message}");
            }
            other => panic!("Expected ParseError, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn decode_structured_rejects_prose() {
        let schema = ResponseSchema::object([]);
        let result: Result<Value, _> = decode_structured(&schema, "I could not produce JSON.");
        assert!(matches!(result, Err(GeminiError::ParseError(_))));
    }

    #[test]
    fn try_from_env_missing_key() {
        // SAFETY: tests in this module do not race on this variable.
        unsafe { env::remove_var("GEMINI_API_KEY") };
        assert!(GeminiClient::try_from_env().is_err());
    }
}
