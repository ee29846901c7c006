//! Built-in team roles
//!
//! Every member of the team exists in two flavours: a scripted role that
//! answers with canned output (offline runs and tests) and an LLM role that
//! asks a completion backend. [`RoleSource`] picks one flavour for a whole
//! runtime.

pub mod llm;
pub mod parsers;
pub mod scripted;

use std::sync::Arc;

use devteam_sdk::{CompletionBackend, MarketplaceRoleMetadata, Role};

use crate::registry::RoleRegistry;

pub use llm::LlmRole;
pub use parsers::RequirementsParser;
pub use scripted::ScriptedRole;

/// Wrap a role-specific prompt in the shared team framing
pub fn team_prompt(name: &str, prompt: &str) -> String {
    format!(
        "You are a {name} working as part of an AI development team.

{prompt}

Guidelines:
- Be concise and focused on your specific role
- Output should be well-structured and ready for the next role
- Follow best practices for your domain
- Consider the context from previous steps
- Produce production-ready output"
    )
}

/// The members of the development team
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamMember {
    ProductManager,
    FrontendDeveloper,
    BackendDeveloper,
    StripeExpert,
}

impl TeamMember {
    /// Members every runtime registers; the Stripe expert is sold through the marketplace
    pub const CORE: [TeamMember; 3] = [
        TeamMember::ProductManager,
        TeamMember::FrontendDeveloper,
        TeamMember::BackendDeveloper,
    ];

    pub fn id(self) -> &'static str {
        match self {
            TeamMember::ProductManager => "product-manager",
            TeamMember::FrontendDeveloper => "frontend-developer",
            TeamMember::BackendDeveloper => "backend-developer",
            TeamMember::StripeExpert => "stripe-expert",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TeamMember::ProductManager => "Product Manager",
            TeamMember::FrontendDeveloper => "Frontend Developer",
            TeamMember::BackendDeveloper => "Backend Developer",
            TeamMember::StripeExpert => "Stripe Payment Expert",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        [
            TeamMember::ProductManager,
            TeamMember::FrontendDeveloper,
            TeamMember::BackendDeveloper,
            TeamMember::StripeExpert,
        ]
        .into_iter()
        .find(|member| member.id() == id)
    }

    /// Role-specific part of the system prompt
    pub fn prompt(self) -> &'static str {
        match self {
            TeamMember::ProductManager => PRODUCT_MANAGER_PROMPT,
            TeamMember::FrontendDeveloper => FRONTEND_DEVELOPER_PROMPT,
            TeamMember::BackendDeveloper => BACKEND_DEVELOPER_PROMPT,
            TeamMember::StripeExpert => STRIPE_EXPERT_PROMPT,
        }
    }

    /// Advisory follow-on steps reported with each result
    pub fn next_steps(self) -> &'static [&'static str] {
        match self {
            TeamMember::ProductManager => &["frontend_design", "backend_architecture"],
            TeamMember::FrontendDeveloper => &["integrate_api"],
            TeamMember::BackendDeveloper => &["test_api", "deploy"],
            TeamMember::StripeExpert => &["test_payments", "configure_stripe_dashboard"],
        }
    }

    /// Advisory inputs downstream steps will need
    pub fn dependencies(self) -> &'static [&'static str] {
        match self {
            TeamMember::ProductManager => &[],
            TeamMember::FrontendDeveloper => &["api_endpoints"],
            TeamMember::BackendDeveloper => &["database_schema"],
            TeamMember::StripeExpert => &["api_routes", "frontend_components"],
        }
    }
}

const PRODUCT_MANAGER_PROMPT: &str = "You are an experienced Product Manager who transforms user ideas into detailed requirements.

Your responsibilities:
- Understand the user's vision and intent
- Create comprehensive requirements documents
- Define user stories and acceptance criteria
- Specify technical requirements and constraints
- Consider edge cases and error scenarios
- Prioritize features for MVP vs future releases

Output format: Structured JSON with:
- title: Project name
- overview: Executive summary
- features: Array of feature objects with name, description, priority
- userStories: Array of user stories in standard format
- technicalRequirements: Frontend, backend, database, deployment specs
- mvpScope: What's included in the first version
- futureEnhancements: Features for later versions";

const FRONTEND_DEVELOPER_PROMPT: &str = "You are an expert Frontend Developer specializing in React and Next.js.
You write clean, modern TypeScript code with excellent UI/UX.

When given requirements, you create:
1. Component structure
2. Complete React component code
3. Tailwind CSS styling
4. Type definitions
5. Basic responsiveness

Output actual, working code - not placeholders or snippets.";

const BACKEND_DEVELOPER_PROMPT: &str = "You are an expert Backend Developer specializing in Node.js and API design.
You create robust, scalable APIs with proper error handling.

When given requirements, you create:
1. API endpoint structure
2. Complete route implementations
3. Data models
4. Validation logic
5. Error handling

Use Next.js API routes. Output actual, working code.";

const STRIPE_EXPERT_PROMPT: &str = "You are a Stripe Payments Integration Expert.
You specialize in implementing complete payment systems using Stripe.

Your expertise includes:
- Stripe Checkout for one-time payments
- Subscription management with Stripe Billing
- Customer portal setup
- Webhook handling for payment events
- Invoice generation and management
- Payment method management
- SCA/3D Secure compliance

When implementing payments, you provide:
1. Complete Stripe integration code
2. Secure API route implementations
3. Frontend checkout components
4. Webhook handlers
5. Testing instructions

Never expose secret keys client-side, add idempotency keys and handle every webhook event.
Output production-ready code that handles real money.";

/// Which flavour of roles a runtime executes
#[derive(Clone)]
pub enum RoleSource {
    /// Canned responses, no backend calls
    Scripted,
    /// Roles that call the given completion backend
    Llm(Arc<dyn CompletionBackend>),
}

impl RoleSource {
    pub fn role(&self, member: TeamMember) -> Arc<dyn Role> {
        match self {
            RoleSource::Scripted => Arc::new(ScriptedRole::member(member)),
            RoleSource::Llm(backend) => Arc::new(LlmRole::member(member, backend.clone())),
        }
    }

    /// Registry holding the core team
    pub fn team_registry(&self) -> RoleRegistry {
        let mut registry = RoleRegistry::new();
        for member in TeamMember::CORE {
            registry.register_role(self.role(member));
        }
        registry
    }

    /// Executable role for a marketplace catalog entry
    pub fn premium_role(&self, metadata: &MarketplaceRoleMetadata) -> Arc<dyn Role> {
        match self {
            RoleSource::Scripted => Arc::new(ScriptedRole::for_marketplace(metadata)),
            RoleSource::Llm(backend) => {
                Arc::new(LlmRole::for_marketplace(metadata, backend.clone()))
            }
        }
    }

    pub fn is_scripted(&self) -> bool {
        matches!(self, RoleSource::Scripted)
    }
}
