//! Role registry: lookup table from role identifier to role instance

use std::collections::HashMap;
use std::sync::Arc;

use devteam_sdk::{DevTeamError, Result, Role};

use crate::roles::scripted::ScriptedRole;

/// Maps role identifiers to executable roles.
///
/// Registration replaces any existing mapping for the same id.
#[derive(Clone, Default)]
pub struct RoleRegistry {
    roles: HashMap<String, Arc<dyn Role>>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the offline scripted team
    pub fn with_scripted_roles() -> Self {
        let mut registry = Self::new();
        for role in ScriptedRole::team() {
            registry.register_role(Arc::new(role));
        }
        registry
    }

    /// Insert or replace the mapping for `id`
    pub fn register(&mut self, id: impl Into<String>, role: Arc<dyn Role>) {
        let id = id.into();
        if self.roles.insert(id.clone(), role).is_some() {
            tracing::debug!(role = %id, "Replaced registered role");
        }
    }

    /// Register a role under its own id
    pub fn register_role(&mut self, role: Arc<dyn Role>) {
        let id = role.id().to_string();
        self.register(id, role);
    }

    pub fn get_role(&self, id: &str) -> Result<Arc<dyn Role>> {
        self.roles
            .get(id)
            .cloned()
            .ok_or_else(|| DevTeamError::RoleNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.roles.contains_key(id)
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.roles.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl std::fmt::Debug for RoleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleRegistry")
            .field("roles", &self.ids())
            .finish()
    }
}
