use super::{GeneratedContent, ProviderFailure};
use serde_json::Value;

/// Turns raw provider text into `GeneratedContent`.
///
/// Markdown code fences around the payload are stripped first. The object
/// must carry a non-empty string `description` (older prompts asked for
/// `desc`, which is accepted too). `tags` may be missing; when present it has
/// to be an array of strings. Anything else is rejected as a whole.
pub fn parse_generated_content(raw: &str) -> Result<GeneratedContent, ProviderFailure> {
    let cleaned = strip_markdown_fence(raw);
    if cleaned.is_empty() {
        return Err(ProviderFailure::Unparsable("empty content".into()));
    }

    let value: Value = serde_json::from_str(cleaned)
        .map_err(|err| ProviderFailure::Unparsable(format!("invalid json: {err}")))?;
    let Value::Object(obj) = value else {
        return Err(ProviderFailure::Unparsable("expected a json object".into()));
    };

    let description = obj
        .get("description")
        .or_else(|| obj.get("desc"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProviderFailure::Unparsable("missing description".into()))?
        .to_string();

    let tags = match obj.get("tags") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let mut tags = Vec::with_capacity(items.len());
            for item in items {
                let Some(tag) = item.as_str() else {
                    return Err(ProviderFailure::Unparsable("tags must be strings".into()));
                };
                let tag = tag.trim();
                if !tag.is_empty() {
                    tags.push(tag.to_string());
                }
            }
            tags
        }
        Some(_) => {
            return Err(ProviderFailure::Unparsable("tags must be an array".into()));
        }
    };

    Ok(GeneratedContent { description, tags })
}

pub fn strip_markdown_fence(input: &str) -> &str {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    // info string, e.g. ```json
    rest.trim_start_matches(|ch: char| ch.is_ascii_alphanumeric())
        .trim()
}
