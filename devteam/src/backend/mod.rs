//! Completion backends and the named backend registry

pub mod claude;
pub mod mock;

use std::collections::BTreeMap;
use std::sync::Arc;

use devteam_sdk::{CompletionBackend, DevTeamError, Result};

pub use claude::ClaudeBackend;
pub use mock::MockBackend;

/// Named completion backends with a default
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: BTreeMap<String, Arc<dyn CompletionBackend>>,
    default: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under the backend's own name. The first registered backend becomes the default.
    pub fn register(&mut self, backend: Arc<dyn CompletionBackend>) {
        let name = backend.name().to_string();
        if self.default.is_none() {
            self.default = Some(name.clone());
        }
        self.backends.insert(name, backend);
    }

    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.backends.contains_key(name) {
            return Err(DevTeamError::completion(format!("Unknown provider: {}", name)));
        }
        self.default = Some(name.to_string());
        Ok(())
    }

    /// Named backend, or the default when `name` is `None`
    pub fn get(&self, name: Option<&str>) -> Result<Arc<dyn CompletionBackend>> {
        let name = name
            .or(self.default.as_deref())
            .ok_or_else(|| DevTeamError::completion("No completion backend registered"))?;
        self.backends
            .get(name)
            .cloned()
            .ok_or_else(|| DevTeamError::completion(format!("Unknown provider: {}", name)))
    }

    pub fn names(&self) -> Vec<&str> {
        self.backends.keys().map(String::as_str).collect()
    }
}
