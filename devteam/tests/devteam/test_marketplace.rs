//! Marketplace licensing and premium role execution

use serde_json::json;

use devteam::marketplace::MarketplaceRegistry;
use devteam::roles::RoleSource;
use devteam_sdk::{MarketplaceRoleMetadata, WorkflowContext};

#[test]
fn test_wrong_key_grants_nothing() {
    let marketplace = MarketplaceRegistry::new();
    let outcome = marketplace.purchase_with_key("stripe-expert", "alice", "WRONG-KEY");

    assert!(!outcome.success);
    assert!(!marketplace.has_license("stripe-expert", "alice"));
}

#[test]
fn test_repeat_purchase_is_idempotent() {
    let marketplace = MarketplaceRegistry::new();
    for key in ["DEMO-2024", "MPCM-STRIPE-EXPERT"] {
        assert!(marketplace.purchase_with_key("stripe-expert", "alice", key).success);
    }

    assert_eq!(marketplace.license_count("stripe-expert"), 1);
    assert!(marketplace.has_license("stripe-expert", "alice"));
}

#[test]
fn test_licenses_are_shared_between_clones() {
    let marketplace = MarketplaceRegistry::new();
    let handle = marketplace.clone();
    handle.purchase("stripe-expert", "bob");
    assert!(marketplace.has_license("stripe-expert", "bob"));
}

#[tokio::test]
async fn test_added_role_executes_as_echo() {
    let marketplace = MarketplaceRegistry::empty();
    marketplace.add_role(MarketplaceRoleMetadata {
        id: "seo-expert".to_string(),
        name: "SEO Expert".to_string(),
        description: "Search optimisation".to_string(),
        price: 9.0,
        capabilities: vec!["seo".to_string()],
        author: "acme".to_string(),
        version: "0.1.0".to_string(),
        rating: 4.0,
        downloads: 3,
    });
    assert!(marketplace.purchase("seo-expert", "alice").success);

    let metadata = marketplace.get_role_metadata("seo-expert").unwrap();
    let role = marketplace.create_executable_role(&metadata, &RoleSource::Scripted);
    let result = role
        .execute(&json!("tune the landing page"), &WorkflowContext::new())
        .await
        .unwrap();

    assert_eq!(result.output_text(), "SEO Expert completed: tune the landing page");
}
