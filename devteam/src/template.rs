//! `{{key}}` placeholder substitution against a workflow context
//!
//! Substitution is best-effort: a placeholder whose key is not (yet) in the
//! context is left as literal text. Only string leaves are rewritten;
//! numbers, booleans and null pass through, objects and arrays are walked
//! recursively and object keys are never rewritten.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;

use devteam_sdk::WorkflowContext;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("placeholder pattern is valid"))
}

/// Outcome of resolving one placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Substitution {
    /// Key found; display text of the stored value
    Resolved(String),
    /// Key absent; the original placeholder text
    Unresolved(String),
}

impl Substitution {
    pub fn into_text(self) -> String {
        match self {
            Substitution::Resolved(text) | Substitution::Unresolved(text) => text,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Substitution::Resolved(_))
    }
}

/// Resolve `key` against the context; `placeholder` is returned untouched when absent
pub fn resolve_placeholder(key: &str, placeholder: &str, context: &WorkflowContext) -> Substitution {
    match context.get_text(key) {
        Some(text) => Substitution::Resolved(text),
        None => Substitution::Unresolved(placeholder.to_string()),
    }
}

/// Rewrite every placeholder in one string
pub fn substitute_str(text: &str, context: &WorkflowContext) -> String {
    placeholder_regex()
        .replace_all(text, |caps: &Captures| {
            resolve_placeholder(&caps[1], &caps[0], context).into_text()
        })
        .into_owned()
}

/// Materialize a step input against the context
pub fn substitute(input: &Value, context: &WorkflowContext) -> Value {
    match input {
        Value::String(text) => Value::String(substitute_str(text, context)),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), substitute(value, context)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| substitute(item, context)).collect())
        }
        other => other.clone(),
    }
}

/// Every placeholder key referenced by an input, in order of appearance
pub fn placeholders(input: &Value) -> Vec<String> {
    let mut keys = Vec::new();
    collect_placeholders(input, &mut keys);
    keys
}

fn collect_placeholders(input: &Value, keys: &mut Vec<String>) {
    match input {
        Value::String(text) => {
            for caps in placeholder_regex().captures_iter(text) {
                keys.push(caps[1].to_string());
            }
        }
        Value::Object(map) => map.values().for_each(|v| collect_placeholders(v, keys)),
        Value::Array(items) => items.iter().for_each(|v| collect_placeholders(v, keys)),
        _ => {}
    }
}
