//! YAML workflow definitions
//!
//! ```yaml
//! name: todo
//! description: Requirements then UI
//! steps:
//!   - role: product-manager
//!     input: A todo app
//!     output_key: requirements
//!   - role: frontend-developer
//!     input:
//!       requirements: "{{requirements}}"
//!     output_key: frontend_code
//! ```

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use devteam_sdk::WorkflowStep;

use crate::template::placeholders;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowFile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<WorkflowStep>,
}

impl WorkflowFile {
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read workflow file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid workflow file {}", path.display()))
    }

    /// Parse raw YAML, tolerating a fenced code block and a leading `---`
    pub fn parse(content: &str) -> Result<Self> {
        let workflow: WorkflowFile =
            serde_yaml::from_str(&extract_yaml(content)).context("Failed to parse YAML")?;
        workflow.validate()?;
        Ok(workflow)
    }

    /// Reject empty workflows and duplicate output keys; warn about
    /// placeholders that no earlier step produces
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            bail!("Workflow has no steps");
        }

        let mut produced = HashSet::new();
        for (index, step) in self.steps.iter().enumerate() {
            if step.role.trim().is_empty() {
                bail!("Step {} has an empty role", index + 1);
            }
            for key in placeholders(&step.input) {
                if !produced.contains(key.as_str()) {
                    tracing::warn!(
                        step = index + 1,
                        key = %key,
                        "Placeholder is not produced by an earlier step and will stay literal"
                    );
                }
            }
            if !produced.insert(step.output_key.as_str()) {
                bail!("Duplicate output key '{}'", step.output_key);
            }
        }
        Ok(())
    }
}

/// Strip a ```yaml fence and a leading document separator
fn extract_yaml(text: &str) -> String {
    let text = text.trim();
    let body = match text.find("```") {
        Some(start) => {
            let after = &text[start + 3..];
            let after = after.strip_prefix("yaml").or_else(|| after.strip_prefix("yml")).unwrap_or(after);
            match after.rfind("```") {
                Some(end) => &after[..end],
                None => after,
            }
        }
        None => text,
    };
    body.trim().trim_start_matches("---").trim().to_string()
}
