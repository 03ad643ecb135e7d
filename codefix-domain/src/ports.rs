use std::sync::Arc;

use camino::Utf8Path;
use codefix_edit::{Document, LiveProject, OpFut, ProjectSnapshot, SnapshotVersion};

use crate::provider::FixProvider;
use crate::providers::builtin_providers;

/// Supplies the providers registered at startup.
pub trait ProviderSource {
    fn providers(&self) -> Vec<Arc<dyn FixProvider>>;
}

/// The providers that ship with codefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinProviders;

impl ProviderSource for BuiltinProviders {
    fn providers(&self) -> Vec<Arc<dyn FixProvider>> {
        builtin_providers()
    }
}

/// The host's project model.
///
/// codefix-domain only reads from it; publishing is driven by the request pipelines.
pub trait ProjectModel: LiveProject {
    /// Wait until the project around `file` is fully loaded.
    ///
    /// Returns `None` when the file is not part of any loaded project.
    fn wait_for_fully_loaded<'a>(&'a self, file: &'a Utf8Path) -> OpFut<'a, Option<Document>>;

    /// Replace the live snapshot with `snapshot`.
    ///
    /// Returns false when the live snapshot is no longer `base`, i.e. someone else changed it.
    fn publish(&self, base: SnapshotVersion, snapshot: ProjectSnapshot) -> bool;
}
