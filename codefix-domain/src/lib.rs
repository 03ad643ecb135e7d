//! Domain logic: match diagnostics to fix providers and turn their candidate fixes into edits.
//!
//! This crate owns *which* providers run and how their failures are contained. It does not own how
//! snapshots are diffed; that's the `codefix-edit` crate.

mod engine;
mod ports;
mod provider;
mod providers;
mod registry;

pub use engine::{FixEngine, FixResolution, ProviderOutcome, RegisteredFix};
pub use ports::{BuiltinProviders, ProjectModel, ProviderSource};
pub use provider::{CandidateFix, FixContext, FixProvider, FixTarget};
pub use providers::{EmptyStatementProvider, TrailingWhitespaceProvider, builtin_providers};
pub use registry::{ProviderDescriptor, ProviderRegistry, RegistryError};
