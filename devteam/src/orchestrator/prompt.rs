//! User message rendering for completion-driven steps

use serde_json::Value;

use devteam_sdk::WorkflowContext;

/// Context strings at or above this many characters are summarised by type
const MAX_CONTEXT_VALUE_CHARS: usize = 1000;

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Render a materialised step input plus prior context as one user message.
///
/// Text input is used as-is. Structured input is listed key by key with
/// pretty-printed values. Prior context follows, short strings verbatim and
/// everything else as `[type]`.
pub fn format_input(input: &Value, context: &WorkflowContext) -> String {
    let mut prompt = match input {
        Value::String(text) => text.clone(),
        Value::Object(map) => {
            let mut out = String::from("Please process the following:\n\n");
            for (key, value) in map {
                let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                out.push_str(&format!("{}:\n{}\n\n", key, pretty));
            }
            out
        }
        other => format!(
            "Please process the following:\n\n{}\n\n",
            serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string())
        ),
    };

    if !context.is_empty() {
        prompt.push_str("\nContext from previous steps:\n");
        for (key, value) in context.iter() {
            match value {
                Value::String(text) if text.chars().count() < MAX_CONTEXT_VALUE_CHARS => {
                    prompt.push_str(&format!("\n{}:\n{}\n", key, text));
                }
                other => prompt.push_str(&format!("\n{}: [{}]\n", key, type_name(other))),
            }
        }
    }

    prompt
}
