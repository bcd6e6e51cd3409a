use serde::de::DeserializeOwned;

use crate::error::AgentError;

/// True when the text holds a `{` followed somewhere later by a `}`.
///
/// Replies without such a span are treated as prose rather than malformed JSON.
pub fn has_brace_block(text: &str) -> bool {
    greedy_span(text).is_some()
}

/// Extract the first JSON object from a string that may contain surrounding text.
///
/// Tried in order:
/// - Clean JSON: `{"key": "value"}`
/// - Greedy span from the first `{` to the last `}`
/// - Markdown-wrapped: ```json\n{"key": "value"}\n```
/// - First balanced `{ ... }` pair
pub fn extract_json(text: &str) -> Result<String, AgentError> {
    let trimmed = text.trim();

    if trimmed.starts_with('{') && is_json(trimmed) {
        return Ok(trimmed.to_string());
    }

    if let Some(span) = greedy_span(trimmed) {
        if is_json(span) {
            return Ok(span.to_string());
        }
    }

    if let Some(block) = extract_from_markdown_block(trimmed) {
        if is_json(&block) {
            return Ok(block);
        }
    }

    if let Some(object) = extract_first_object(trimmed) {
        if is_json(&object) {
            return Ok(object);
        }
    }

    Err(AgentError::Parse(format!(
        "No valid JSON object found in response (length={})",
        text.len()
    )))
}

/// Extract and deserialize in one step.
pub fn parse_reply<T: DeserializeOwned>(raw: &str) -> Result<T, AgentError> {
    let json_str = extract_json(raw)?;
    serde_json::from_str(&json_str)
        .map_err(|e| AgentError::Parse(format!("{e}\nJSON: {json_str}")))
}

fn is_json(candidate: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(candidate).is_ok()
}

fn greedy_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Extract JSON from a markdown code block (```json ... ``` or ``` ... ```)
fn extract_from_markdown_block(text: &str) -> Option<String> {
    let start_markers = ["```json\n", "```json\r\n", "```\n", "```\r\n"];

    for marker in &start_markers {
        if let Some(start) = text.find(marker) {
            let json_start = start + marker.len();
            if let Some(end) = text[json_start..].find("```") {
                return Some(text[json_start..json_start + end].trim().to_string());
            }
        }
    }

    None
}

/// Find the first balanced { ... } in the text.
fn extract_first_object(text: &str) -> Option<String> {
    let mut depth = 0;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if !in_string && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start {
                        return Some(text[s..=i].to_string());
                    }
                }
            }
            _ => {}
        }
    }

    None
}
