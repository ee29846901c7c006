//! Output parsers for role responses

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Map, Value};

use devteam_sdk::OutputParser;

fn json_object_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[\s\S]*\}").expect("valid regex"))
}

fn bullet_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:[-*]|\d+\.)\s+").expect("valid regex"))
}

/// Value following `label:` (or `label` and whitespace) up to the end of the line
fn extract_field(text: &str, label: &str) -> Option<String> {
    let pattern = format!(r"(?i){}[:\s]+([^\n]+)", regex::escape(label));
    let re = Regex::new(&pattern).ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parses a product manager response into a requirements document.
///
/// Prefers the outermost `{...}` span of the response, then the whole
/// response, as JSON. When neither parses, builds a structured document
/// from headings and bullet lines and keeps the raw text under `raw`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequirementsParser;

impl RequirementsParser {
    fn parse_json(raw: &str) -> Option<Value> {
        let candidate = json_object_regex().find(raw).map(|m| m.as_str());
        candidate
            .and_then(|text| serde_json::from_str::<Value>(text).ok())
            .or_else(|| serde_json::from_str::<Value>(raw.trim()).ok())
            .filter(Value::is_object)
    }

    fn features(raw: &str) -> Vec<Value> {
        let features: Vec<Value> = raw
            .lines()
            .map(str::trim)
            .filter(|line| line.len() > 10 && bullet_regex().is_match(line))
            .map(|line| {
                let text = bullet_regex().replace(line, "").trim().to_string();
                let name: String = text.chars().take(50).collect();
                json!({"name": name, "description": text, "priority": "MVP"})
            })
            .collect();

        if features.is_empty() {
            vec![json!({
                "name": "Core functionality",
                "description": "Main application features",
                "priority": "MVP"
            })]
        } else {
            features
        }
    }

    fn fallback(raw: &str) -> Value {
        let mut doc = Map::new();
        doc.insert(
            "title".into(),
            json!(extract_field(raw, "title").unwrap_or_else(|| "Untitled Project".to_string())),
        );
        doc.insert(
            "overview".into(),
            json!(extract_field(raw, "overview")
                .unwrap_or_else(|| raw.chars().take(200).collect())),
        );
        doc.insert("features".into(), Value::Array(Self::features(raw)));
        doc.insert(
            "technicalRequirements".into(),
            json!({
                "frontend": "Next.js with TypeScript",
                "backend": "Next.js API Routes",
                "database": "PostgreSQL",
                "deployment": "Vercel"
            }),
        );
        doc.insert(
            "mvpScope".into(),
            json!(extract_field(raw, "mvp").unwrap_or_else(|| "Core features".to_string())),
        );
        doc.insert("raw".into(), json!(raw));
        Value::Object(doc)
    }
}

impl OutputParser for RequirementsParser {
    fn parse(&self, raw: &str) -> Value {
        match Self::parse_json(raw) {
            Some(value) => value,
            None => {
                tracing::warn!("Requirements response is not JSON, using structured fallback");
                Self::fallback(raw)
            }
        }
    }
}
