use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;

use crate::client::MockTransport;
use crate::tools::associations::AssociationTools;
use crate::tools::blog::BlogTools;
use crate::tools::calendars::CalendarTools;
use crate::tools::contacts::ContactTools;
use crate::tools::conversations::ConversationTools;
use crate::tools::email::EmailTools;
use crate::tools::invoices::InvoiceTools;
use crate::tools::locations::LocationTools;
use crate::tools::media::MediaTools;
use crate::tools::opportunities::OpportunityTools;
use crate::tools::payments::PaymentTools;
use crate::tools::products::ProductTools;
use crate::tools::social::SocialMediaTools;
use crate::tools::store::StoreTools;
use crate::tools::surveys::SurveyTools;
use crate::tools::test_support::*;
use crate::tools::{ToolError, ToolModule, ToolRegistry};

type M = MockTransport;

fn registry() -> ToolRegistry {
    ToolRegistry::new(context(MockTransport::new()))
}

fn declared_names() -> Vec<&'static str> {
    [
        ContactTools::<M>::TOOL_NAMES,
        ConversationTools::<M>::TOOL_NAMES,
        CalendarTools::<M>::TOOL_NAMES,
        OpportunityTools::<M>::TOOL_NAMES,
        LocationTools::<M>::TOOL_NAMES,
        PaymentTools::<M>::TOOL_NAMES,
        ProductTools::<M>::TOOL_NAMES,
        InvoiceTools::<M>::TOOL_NAMES,
        StoreTools::<M>::TOOL_NAMES,
        SocialMediaTools::<M>::TOOL_NAMES,
        BlogTools::<M>::TOOL_NAMES,
        MediaTools::<M>::TOOL_NAMES,
        AssociationTools::<M>::TOOL_NAMES,
        SurveyTools::<M>::TOOL_NAMES,
        EmailTools::<M>::TOOL_NAMES,
    ]
    .concat()
}

#[tokio::test]
async fn test_unknown_tool_is_named() {
    let err = registry()
        .execute("not_a_real_tool", json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::UnknownTool { ref name } if name == "not_a_real_tool"));
    assert_eq!(err.to_string(), "Unknown tool: not_a_real_tool");
}

#[test]
fn test_every_declared_tool_is_registered_once() {
    let registry = registry();
    let names = declared_names();
    let unique: HashSet<_> = names.iter().collect();

    assert_eq!(unique.len(), names.len(), "tool names must be unique");
    assert_eq!(registry.len(), names.len());
    assert_eq!(registry.definitions().len(), names.len());
    assert!(names.iter().all(|name| registry.contains(name)));
}

#[test]
fn test_all_families_present() {
    let families = registry().families();

    assert_eq!(families.len(), 15);
    for family in ["contacts", "calendars", "social", "store", "email"] {
        assert!(families.contains(&family), "missing family {family}");
    }
}

#[test]
fn test_family_definitions_filter() {
    let registry = registry();

    let surveys = registry.family_definitions("surveys");

    assert_eq!(surveys.len(), 2);
    assert!(surveys.iter().all(|d| d.family == "surveys"));
    assert!(registry.family_definitions("nope").is_empty());
}

#[tokio::test]
async fn test_every_definition_routes_to_its_handler() {
    let registry = registry();

    for definition in registry.definitions() {
        // A non-object argument fails inside the owning family's parser,
        // which proves the name was routed there without any API call.
        let err = registry
            .execute(definition.name, json!("not an object"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, ToolError::InvalidArguments { ref tool, .. } if tool == definition.name),
            "{} was not routed: {err}",
            definition.name
        );
    }
}

#[tokio::test]
async fn test_first_registration_wins() {
    let (first, _) = recording(vec![Ok(json!({"contact": {"id": "c1"}}))]);
    let second = MockTransport::new();
    let modules: Vec<Arc<dyn ToolModule>> = vec![
        Arc::new(ContactTools::new(context(first))),
        Arc::new(ContactTools::new(context(second))),
    ];
    let registry = ToolRegistry::from_modules(modules);

    assert_eq!(registry.len(), ContactTools::<M>::TOOL_NAMES.len());
    registry
        .execute("get_contact", json!({"contactId": "c1"}))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_family_rejects_foreign_names() {
    let tools = SurveyTools::new(context(MockTransport::new()));

    let err = tools.execute("get_contact", json!({})).await.unwrap_err();

    assert!(matches!(err, ToolError::UnknownTool { .. }));
}

#[test]
fn test_catalog_matches_registry() {
    let catalog: Vec<&str> = ToolRegistry::catalog().iter().map(|d| d.name).collect();
    let registered: Vec<&str> = registry().definitions().iter().map(|d| d.name).collect();

    assert_eq!(catalog, registered);
}
