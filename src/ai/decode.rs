use crate::error::DecodeError;
use serde::de::DeserializeOwned;

/// Payloads that carry constraints beyond what serde checks
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// Extract the payload from a model reply
///
/// The first markdown code fence wins, wherever it appears (```json ... ```, ``` ... ```,
/// or the one-line ```json{...}``` form). Unfenced replies with prose around the payload
/// are cut down to the outermost `{...}` or `[...]` span.
pub fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();

    let Some(open) = trimmed.find("```") else {
        return json_span(trimmed);
    };
    let rest = &trimmed[open + 3..];

    // Drop the info string ("json", "JSON", ...) on the opening fence
    let info_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    let body = &rest[info_len..];

    let body = match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    };

    body.trim()
}

fn json_span(text: &str) -> &str {
    if text.starts_with('{') || text.starts_with('[') {
        return text;
    }

    let start = text.find(|c: char| c == '{' || c == '[');
    let end = text.rfind(|c: char| c == '}' || c == ']');
    match (start, end) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Decode a fenced or bare JSON payload and validate it
pub fn decode_payload<T>(raw: &str) -> Result<T, DecodeError>
where
    T: DeserializeOwned + Validate,
{
    let body = strip_fences(raw);
    if body.is_empty() {
        return Err(DecodeError::Empty);
    }

    let value: T =
        serde_json::from_str(body).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    value.validate().map_err(DecodeError::Schema)?;

    Ok(value)
}
