//! Port traits abstracting the host away from the pipelines.

use camino::Utf8PathBuf;
use codefix_edit::OpFut;
use codefix_types::diagnostic::DocumentDiagnostics;

pub use codefix_domain::{ProjectModel, ProviderSource};
pub use codefix_edit::LiveProject;

/// Source of diagnostics from the external rule engine.
pub trait DiagnosticSource: Send + Sync {
    /// Diagnostics for `files`, or for every tracked file when `None`.
    fn get_diagnostics<'a>(
        &'a self,
        files: Option<&'a [Utf8PathBuf]>,
    ) -> OpFut<'a, Vec<DocumentDiagnostics>>;
}
