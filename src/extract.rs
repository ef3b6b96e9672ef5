//! Salvaging structured content out of chatty model output.
//!
//! Gemini is asked for bare JSON or bare code, but replies routinely arrive
//! wrapped in Markdown fences or surrounded by prose. The helpers here pull
//! the useful payload back out before any `serde` parsing happens.

use regex::Regex;
use thiserror::Error;

/// Extraction failures. These are salvage-level errors; callers usually
/// convert them into a parse error for the operation that needed the content.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    #[error("no JSON value found in response text")]
    NoJsonFound,

    #[error("no matching code block found in response text")]
    NoCodeBlock,

    #[error("invalid extraction pattern: {0}")]
    BadPattern(String),
}

/// Extracts a JSON string from a raw model response.
///
/// Tries, in order: a ```json fenced block, any fenced block that contains a
/// JSON value, and finally a balanced scan of the raw text. The returned
/// string is not validated beyond bracket balance; parse it with `serde_json`.
pub fn extract_json(text: &str) -> Result<String, ExtractError> {
    if let Ok(block) = fenced_block(text, Some("json")) {
        return Ok(block);
    }

    if let Ok(block) = fenced_block(text, None)
        && let Some(json) = first_json_entity(&block)
    {
        return Ok(json);
    }

    first_json_entity(text).ok_or(ExtractError::NoJsonFound)
}

/// Extracts the content of a Markdown code block with the given language
/// hint (e.g. "python"). Pass `None` to match any fence.
pub fn fenced_block(text: &str, lang: Option<&str>) -> Result<String, ExtractError> {
    let pattern = match lang {
        Some(lang) => format!(
            r"(?m)^\s*```\s*{}\s*\n((?:.*\n)*?)^\s*```\s*$",
            regex::escape(lang)
        ),
        None => r"(?m)^\s*```[^\n]*\n((?:.*\n)*?)^\s*```\s*$".to_string(),
    };

    let regex =
        Regex::new(&pattern).map_err(|e| ExtractError::BadPattern(e.to_string()))?;

    regex
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|content| content.as_str().trim_end().to_string())
        .ok_or(ExtractError::NoCodeBlock)
}

/// Unwraps generated source code from its fence, if any.
///
/// Models told to "return only clean code" still fence it more often than
/// not. Prefers a block with the expected language hint, falls back to any
/// fenced block, and finally to the trimmed raw text.
pub fn unfence_code(text: &str, lang: &str) -> String {
    fenced_block(text, Some(lang))
        .or_else(|_| fenced_block(text, None))
        .unwrap_or_else(|_| text.trim().to_string())
}

/// Finds the first balanced JSON object or array in the text.
///
/// Walks the string tracking bracket depth and string state so braces inside
/// string literals don't terminate the scan early.
fn first_json_entity(text: &str) -> Option<String> {
    let mut depth = 0;
    let mut start_pos = None;
    let mut in_string = false;
    let mut escape_next = false;
    let mut opening = None;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => {
                if depth == 0 {
                    start_pos = Some(i);
                    opening = Some(ch);
                }
                depth += 1;
            }
            '}' | ']' if !in_string => {
                depth -= 1;
                if depth == 0
                    && let Some(p) = start_pos
                    && let Some(open) = opening
                {
                    let balanced = (open == '{' && ch == '}') || (open == '[' && ch == ']');
                    if balanced {
                        return Some(text[p..=i].to_string());
                    }
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_json_object() {
        let input = "Some text before {\"key\": \"value\"} and after.";
        assert_eq!(extract_json(input).unwrap(), "{\"key\": \"value\"}");
    }

    #[test]
    fn inline_json_array() {
        let input = "Here is an array: [{\"id\": \"a1\"}] and more text";
        assert_eq!(extract_json(input).unwrap(), "[{\"id\": \"a1\"}]");
    }

    #[test]
    fn braces_inside_strings_do_not_terminate() {
        let input = r#"{"note": "uses } inside", "ok": true}"#;
        assert_eq!(extract_json(input).unwrap(), input);
    }

    #[test]
    fn json_fence_preferred_over_inline() {
        let text = "Inline {\"inline\": 1} here.\n```json\n{\"block\": 2}\n```\nMore text.";
        assert_eq!(extract_json(text).unwrap(), "{\"block\": 2}");
    }

    #[test]
    fn generic_fence_with_json_content() {
        let text = "The output is:\n```\n{\"result\": \"ok\", \"value\": 123}\n```\nEnd.";
        assert_eq!(extract_json(text).unwrap(), "{\"result\": \"ok\", \"value\": 123}");
    }

    #[test]
    fn non_json_fence_falls_back_to_inline() {
        let text = "```rust\nlet x = 42;\n```\nThe result is {\"data\": \"inline\"}";
        assert_eq!(extract_json(text).unwrap(), "{\"data\": \"inline\"}");
    }

    #[test]
    fn no_json_anywhere() {
        assert!(matches!(
            extract_json("just prose, no data"),
            Err(ExtractError::NoJsonFound)
        ));
    }

    #[test]
    fn fenced_block_by_language() {
        let text = "First:\n```json\n{\"k\": 1}\n```\nThen:\n```python\nprint('hi')\n```\n";
        assert_eq!(fenced_block(text, Some("python")).unwrap(), "print('hi')");
    }

    #[test]
    fn unfence_code_with_language_hint() {
        let text = "```python\nimport scrapy\n\nclass LedSpider(scrapy.Spider):\n    pass\n```";
        let code = unfence_code(text, "python");
        assert!(code.starts_with("import scrapy"));
        assert!(!code.contains("```"));
    }

    #[test]
    fn unfence_code_returns_raw_when_unfenced() {
        let text = "\nimport scrapy\n";
        assert_eq!(unfence_code(text, "python"), "import scrapy");
    }

    #[test]
    fn multiline_json_in_fence() {
        let text = "Response:\n```json\n{\n  \"name\": \"test\",\n  \"values\": [1, 2, 3]\n}\n```";
        let json = extract_json(text).unwrap();
        assert!(json.contains("\"values\": [1, 2, 3]"));
    }
}
