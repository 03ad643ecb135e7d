//! Embeddable core library for codefix.
//!
//! Provides transport-free entry points that a request router links against.
//!
//! # Port traits
//!
//! All collaborators are abstracted behind port traits in [`ports`]:
//! - [`DiagnosticSource`](ports::DiagnosticSource): diagnostics grouped by file
//! - [`ProjectModel`](ports::ProjectModel): live snapshot, load waits, publishing
//! - [`ProviderSource`](ports::ProviderSource): fix providers registered at startup
//!
//! The [`adapters`] module provides in-memory and filesystem-backed implementations.
//!
//! # Entry points
//!
//! - [`FixService::list_fixes_for_diagnostics`](pipeline::FixService::list_fixes_for_diagnostics)
//! - [`FixService::list_fixes_for_files`](pipeline::FixService::list_fixes_for_files)
//! - [`FixService::list_available_fixes`](pipeline::FixService::list_available_fixes)
//! - [`FixService::run_named_fix`](pipeline::FixService::run_named_fix)

pub mod adapters;
pub mod aggregate;
pub mod config;
mod error;
pub mod observe;
pub mod pipeline;
pub mod ports;
pub mod settings;

pub use error::CoreError;
pub use pipeline::{FixService, Selection};

// Re-export so embedders don't need the lower crates directly.
pub use codefix_domain::{ProviderRegistry, builtin_providers};
pub use codefix_edit::{CancelSignal, Cancelled, ProjectSnapshot};
pub use codefix_types::endpoints;
