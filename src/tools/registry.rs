//! Name-based dispatch across all tool families.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument, warn};

use super::associations::AssociationTools;
use super::blog::BlogTools;
use super::calendars::CalendarTools;
use super::contacts::ContactTools;
use super::conversations::ConversationTools;
use super::email::EmailTools;
use super::invoices::InvoiceTools;
use super::locations::LocationTools;
use super::media::MediaTools;
use super::opportunities::OpportunityTools;
use super::payments::PaymentTools;
use super::products::ProductTools;
use super::social::SocialMediaTools;
use super::store::StoreTools;
use super::surveys::SurveyTools;
use super::{ToolDefinition, ToolError, ToolModule, ToolOutput, ToolResult};
use crate::client::{ApiContext, HttpTransport, Transport};

/// Routes a tool name to the family that owns it.
#[derive(Clone)]
pub struct ToolRegistry {
    modules: Vec<Arc<dyn ToolModule>>,
    index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    /// Registry with every tool family sharing one API context.
    pub fn new<T: Transport + 'static>(ctx: Arc<ApiContext<T>>) -> Self {
        let modules: Vec<Arc<dyn ToolModule>> = vec![
            Arc::new(ContactTools::new(Arc::clone(&ctx))),
            Arc::new(ConversationTools::new(Arc::clone(&ctx))),
            Arc::new(CalendarTools::new(Arc::clone(&ctx))),
            Arc::new(OpportunityTools::new(Arc::clone(&ctx))),
            Arc::new(LocationTools::new(Arc::clone(&ctx))),
            Arc::new(PaymentTools::new(Arc::clone(&ctx))),
            Arc::new(ProductTools::new(Arc::clone(&ctx))),
            Arc::new(InvoiceTools::new(Arc::clone(&ctx))),
            Arc::new(StoreTools::new(Arc::clone(&ctx))),
            Arc::new(SocialMediaTools::new(Arc::clone(&ctx))),
            Arc::new(BlogTools::new(Arc::clone(&ctx))),
            Arc::new(MediaTools::new(Arc::clone(&ctx))),
            Arc::new(AssociationTools::new(Arc::clone(&ctx))),
            Arc::new(SurveyTools::new(Arc::clone(&ctx))),
            Arc::new(EmailTools::new(ctx)),
        ];
        Self::from_modules(modules)
    }

    /// Registry over an explicit set of families. The first family to
    /// declare a name owns it.
    pub fn from_modules(modules: Vec<Arc<dyn ToolModule>>) -> Self {
        let mut index = HashMap::new();
        for (position, module) in modules.iter().enumerate() {
            for definition in module.definitions() {
                if let Some(existing) = index.insert(definition.name, position) {
                    warn!(
                        tool = definition.name,
                        family = module.family(),
                        "duplicate tool name, keeping first registration"
                    );
                    index.insert(definition.name, existing);
                }
            }
        }
        info!(tools = index.len(), families = modules.len(), "tool registry built");
        Self { modules, index }
    }

    /// Every tool definition, without building a transport. Order matches
    /// [`ToolRegistry::new`].
    pub fn catalog() -> Vec<ToolDefinition> {
        type H = HttpTransport;
        [
            ContactTools::<H>::tool_definitions(),
            ConversationTools::<H>::tool_definitions(),
            CalendarTools::<H>::tool_definitions(),
            OpportunityTools::<H>::tool_definitions(),
            LocationTools::<H>::tool_definitions(),
            PaymentTools::<H>::tool_definitions(),
            ProductTools::<H>::tool_definitions(),
            InvoiceTools::<H>::tool_definitions(),
            StoreTools::<H>::tool_definitions(),
            SocialMediaTools::<H>::tool_definitions(),
            BlogTools::<H>::tool_definitions(),
            MediaTools::<H>::tool_definitions(),
            AssociationTools::<H>::tool_definitions(),
            SurveyTools::<H>::tool_definitions(),
            EmailTools::<H>::tool_definitions(),
        ]
        .concat()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.modules
            .iter()
            .flat_map(|module| module.definitions())
            .collect()
    }

    pub fn families(&self) -> Vec<&'static str> {
        self.modules.iter().map(|module| module.family()).collect()
    }

    pub fn family_definitions(&self, family: &str) -> Vec<ToolDefinition> {
        self.modules
            .iter()
            .filter(|module| module.family() == family)
            .flat_map(|module| module.definitions())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[instrument(skip(self, args))]
    pub async fn execute(&self, name: &str, args: Value) -> ToolResult<ToolOutput> {
        let Some(&position) = self.index.get(name) else {
            return Err(ToolError::unknown(name));
        };
        self.modules[position].execute(name, args).await
    }
}
