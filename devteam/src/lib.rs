//! devteam: an AI development team that turns a description into an app.
//!
//! Roles run through a workflow [`orchestrator`] that threads a shared
//! context between steps, substitutes `{{key}}` references and enforces a
//! cost ceiling. The [`build`] pipeline drives the core team and the
//! [`marketplace`] gates premium roles. [`runtime::StudioRuntime`] wires it
//! together for the CLI and the stdio tool server.

pub mod backend;
pub mod build;
pub mod cli;
pub mod config;
pub mod cost;
pub mod events;
pub mod generator;
pub mod marketplace;
pub mod mcp_server;
pub mod mcp_tools;
pub mod orchestrator;
pub mod progress;
pub mod registry;
pub mod roles;
pub mod runtime;
pub mod template;
pub mod utils;
pub mod workflow_file;

pub use config::{Config, Provider};
pub use cost::CostTracker;
pub use orchestrator::{ExecutionMode, Orchestrator, OrchestratorConfig, RunState};
pub use registry::RoleRegistry;
pub use runtime::StudioRuntime;
