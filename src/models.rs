//! Model identifiers for the Gemini API.
//!
//! Using an enum prevents typos in model names and keeps the mapping from
//! orchestration tasks to models in one place. The `Custom` variant allows
//! new models without a code change, validated by prefix on conversion.

use std::fmt;

/// Error type for model-related operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Model name doesn't match the expected `gemini-` prefix.
    InvalidPrefix { model: String },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPrefix { model } => {
                write!(f, "Invalid model name '{}'. Expected prefix: gemini-", model)
            }
        }
    }
}

impl std::error::Error for ModelError {}

/// Google Gemini model identifiers.
///
/// # Examples
///
/// ```
/// use led_scout::models::GeminiModel;
///
/// let model = GeminiModel::Pro3;
/// assert_eq!(model.as_api_id(), "gemini-3-pro-preview");
///
/// let model: GeminiModel = "flash".parse().unwrap();
/// assert_eq!(model, GeminiModel::Flash25);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GeminiModel {
    /// Gemini 3 Pro - deep reasoning, used for code generation and advisory
    Pro3,
    /// Gemini 3 Flash - fast frontier-class, used for ranking and grounded lookups
    Flash3,
    /// Gemini 2.5 Pro - stable capable model
    Pro25,
    /// Gemini 2.5 Flash - stable fast model (default)
    Flash25,
    /// Gemini 2.5 Flash Lite - lightest option, used for intent analysis
    FlashLite25,
    /// Custom model (validated: must start with "gemini-")
    Custom(String),
}

impl Default for GeminiModel {
    fn default() -> Self {
        Self::Flash25
    }
}

impl GeminiModel {
    /// Returns the full API model identifier.
    pub fn as_api_id(&self) -> &str {
        match self {
            Self::Pro3 => "gemini-3-pro-preview",
            Self::Flash3 => "gemini-3-flash-preview",
            Self::Pro25 => "gemini-2.5-pro",
            Self::Flash25 => "gemini-2.5-flash",
            Self::FlashLite25 => "gemini-2.5-flash-lite",
            Self::Custom(s) => s,
        }
    }

    fn validate_custom(s: &str) -> Result<(), ModelError> {
        if s.starts_with("gemini-") {
            Ok(())
        } else {
            Err(ModelError::InvalidPrefix {
                model: s.to_string(),
            })
        }
    }
}

impl std::str::FromStr for GeminiModel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pro-3" | "pro3" | "gemini-3-pro-preview" | "gemini-3-pro" => Ok(Self::Pro3),
            "flash-3" | "flash3" | "gemini-3-flash-preview" | "gemini-3-flash" => Ok(Self::Flash3),
            "pro" | "pro-2.5" | "pro25" | "gemini-2.5-pro" => Ok(Self::Pro25),
            "flash" | "flash-2.5" | "flash25" | "gemini-2.5-flash" => Ok(Self::Flash25),
            "flash-lite" | "lite" | "gemini-2.5-flash-lite" => Ok(Self::FlashLite25),
            _ => {
                Self::validate_custom(s)?;
                Ok(Self::Custom(s.to_string()))
            }
        }
    }
}

impl fmt::Display for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_api_id())
    }
}
