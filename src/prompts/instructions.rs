use super::interface::{PromptGenError, PromptRequest};
use serde_json::Value;

pub const PROMPT_WRITER_SYSTEM_PROMPT: &str = r#"You are an art director for a blog.
Read the article and propose illustrations that would sit well next to it.

Rules:
- Each prompt describes one self-contained image: subject, setting, mood, composition and style.
- Prompts must be distinct from each other and from any prompt listed as already used.
- No text, captions, logos or watermarks in the images.
- Return JSON only: an array of strings. No explanation."#;

/// Build the user turn for a prompt request.
pub fn build_user_message(request: &PromptRequest) -> String {
    let mut message = format!(
        "Write {} image generation prompts for the following article.\n\nARTICLE:\n{}\n",
        request.count,
        request.article.trim()
    );
    if !request.existing.is_empty() {
        message.push_str("\nALREADY USED (do not repeat or paraphrase these):\n");
        for prompt in &request.existing {
            message.push_str("- ");
            message.push_str(prompt);
            message.push('\n');
        }
    }
    message
}

/// Read a prompt list out of model output. Accepts a bare JSON array, an
/// object with a `prompts` array, and either wrapped in a markdown fence.
pub fn parse_prompt_list(raw: &str) -> Result<Vec<String>, PromptGenError> {
    let text = strip_code_fence(raw.trim());
    let value: Value =
        serde_json::from_str(text).map_err(|e| PromptGenError::Parse(e.to_string()))?;

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("prompts")
            .and_then(|v| v.as_array())
            .ok_or_else(|| PromptGenError::Parse("expected a 'prompts' array".to_string()))?,
        _ => return Err(PromptGenError::Parse("expected a JSON array".to_string())),
    };

    let prompts: Vec<String> = items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| PromptGenError::Parse(format!("non-string prompt: {}", item)))
        })
        .collect::<Result<_, _>>()?;

    if prompts.is_empty() {
        return Err(PromptGenError::Empty);
    }
    Ok(prompts)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
