//! Premium role catalog and license bookkeeping

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock};

use devteam_sdk::{DevTeamError, MarketplaceRoleMetadata, PurchaseOutcome, Result, Role};

use crate::roles::RoleSource;
use crate::utils::{read, write};

/// License keys accepted by [`MarketplaceRegistry::purchase_with_key`]
const VALID_LICENSE_KEYS: [&str; 2] = ["DEMO-2024", "MPCM-STRIPE-EXPERT"];

fn stripe_expert() -> MarketplaceRoleMetadata {
    MarketplaceRoleMetadata {
        id: "stripe-expert".to_string(),
        name: "Stripe Payment Expert".to_string(),
        description: "Complete Stripe integration with checkout, subscriptions, and webhooks"
            .to_string(),
        price: 29.0,
        capabilities: [
            "payment-processing",
            "subscriptions",
            "invoicing",
            "customer-portal",
            "webhooks",
        ]
        .into_iter()
        .map(String::from)
        .collect(),
        author: "mpcm-pro".to_string(),
        version: "1.0.0".to_string(),
        rating: 4.9,
        downloads: 1249,
    }
}

#[derive(Debug, Default)]
struct Catalog {
    roles: BTreeMap<String, MarketplaceRoleMetadata>,
    /// role id -> licensed user ids
    licenses: HashMap<String, HashSet<String>>,
}

/// Catalog of premium roles plus the set of licensed users per role.
///
/// Clones share the same catalog. Purchasing is simulated: a purchase
/// succeeds for any catalogued role and is idempotent per user.
#[derive(Debug, Clone)]
pub struct MarketplaceRegistry {
    inner: Arc<RwLock<Catalog>>,
}

impl Default for MarketplaceRegistry {
    fn default() -> Self {
        let registry = Self::empty();
        registry.add_role(stripe_expert());
        registry
    }
}

impl MarketplaceRegistry {
    /// Catalog pre-populated with the Stripe expert
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Catalog::default())),
        }
    }

    /// Insert or replace a catalog entry
    pub fn add_role(&self, metadata: MarketplaceRoleMetadata) {
        write(&self.inner)
            .roles
            .insert(metadata.id.clone(), metadata);
    }

    pub fn get_role_metadata(&self, role_id: &str) -> Option<MarketplaceRoleMetadata> {
        read(&self.inner).roles.get(role_id).cloned()
    }

    /// Catalog entries ordered by id
    pub fn list(&self) -> Vec<MarketplaceRoleMetadata> {
        read(&self.inner).roles.values().cloned().collect()
    }

    pub fn has_license(&self, role_id: &str, user_id: &str) -> bool {
        read(&self.inner)
            .licenses
            .get(role_id)
            .is_some_and(|users| users.contains(user_id))
    }

    /// Number of users licensed for a role
    pub fn license_count(&self, role_id: &str) -> usize {
        read(&self.inner)
            .licenses
            .get(role_id)
            .map_or(0, HashSet::len)
    }

    /// Grant `user_id` a license for `role_id`
    pub fn purchase(&self, role_id: &str, user_id: &str) -> PurchaseOutcome {
        let mut catalog = write(&self.inner);
        let Some(role) = catalog.roles.get(role_id).cloned() else {
            tracing::warn!(role_id, "Purchase of unknown marketplace role");
            return PurchaseOutcome::failed("Role not found");
        };

        let newly_licensed = catalog
            .licenses
            .entry(role_id.to_string())
            .or_default()
            .insert(user_id.to_string());
        if newly_licensed {
            tracing::info!(role_id, user_id, "Marketplace role purchased");
        }

        PurchaseOutcome::ok(format!(
            "Successfully purchased {} for ${}",
            role.name, role.price
        ))
    }

    pub fn validate_license(&self, role_id: &str, license_key: &str) -> Result<()> {
        if VALID_LICENSE_KEYS.contains(&license_key) {
            Ok(())
        } else {
            Err(DevTeamError::LicenseInvalid(role_id.to_string()))
        }
    }

    /// Purchase gated by a license key. An invalid key leaves licenses untouched.
    pub fn purchase_with_key(&self, role_id: &str, user_id: &str, license_key: &str) -> PurchaseOutcome {
        if let Err(err) = self.validate_license(role_id, license_key) {
            tracing::warn!(role_id, user_id, "Rejected license key");
            return PurchaseOutcome::failed(err.to_string());
        }
        self.purchase(role_id, user_id)
    }

    /// Executable role for a catalog entry, in the runtime's role flavour
    pub fn create_executable_role(
        &self,
        metadata: &MarketplaceRoleMetadata,
        source: &RoleSource,
    ) -> Arc<dyn Role> {
        source.premium_role(metadata)
    }
}
