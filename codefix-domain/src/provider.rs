use std::collections::BTreeSet;

use camino::Utf8Path;
use codefix_edit::{CancelSignal, CodeOperation, Document, OpFut, ProjectSnapshot};
use codefix_types::diagnostic::SourceSpan;
use codefix_types::response::DiagnosticLocation;

/// The diagnostic a provider is asked to fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixTarget {
    pub diagnostic_id: String,
    pub message: String,
    pub span: SourceSpan,
}

impl From<&DiagnosticLocation> for FixTarget {
    fn from(location: &DiagnosticLocation) -> Self {
        Self {
            diagnostic_id: location.id.clone(),
            message: location.text.clone(),
            span: location.span(),
        }
    }
}

/// A source of automated fixes for a set of rules.
///
/// Implementations are untrusted: errors and panics are contained by the engine.
pub trait FixProvider: Send + Sync {
    fn id(&self) -> &str;

    fn fixable_diagnostic_ids(&self) -> BTreeSet<String>;

    /// Register zero or more candidate fixes on `ctx`.
    fn register_fixes<'a>(&'a self, ctx: &'a mut FixContext) -> OpFut<'a, ()>;
}

/// One proposed remedy. Operations are computed lazily.
pub trait CandidateFix: Send + Sync {
    fn title(&self) -> &str;

    fn equivalence_key(&self) -> Option<&str> {
        None
    }

    /// Identifier used to run this fix later: the equivalence key, else the title.
    fn identifier(&self) -> &str {
        self.equivalence_key().unwrap_or_else(|| self.title())
    }

    fn operations<'a>(
        &'a self,
        snapshot: &'a ProjectSnapshot,
        cancel: &'a CancelSignal,
    ) -> OpFut<'a, Vec<CodeOperation>>;
}

/// Invocation context scoped to one diagnostic and its document.
pub struct FixContext {
    target: FixTarget,
    document: Document,
    snapshot: ProjectSnapshot,
    cancel: CancelSignal,
    fixes: Vec<Box<dyn CandidateFix>>,
}

impl FixContext {
    pub fn new(
        target: FixTarget,
        document: Document,
        snapshot: ProjectSnapshot,
        cancel: CancelSignal,
    ) -> Self {
        Self {
            target,
            document,
            snapshot,
            cancel,
            fixes: Vec::new(),
        }
    }

    pub fn target(&self) -> &FixTarget {
        &self.target
    }

    pub fn diagnostic_id(&self) -> &str {
        &self.target.diagnostic_id
    }

    pub fn span(&self) -> &SourceSpan {
        &self.target.span
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn snapshot(&self) -> &ProjectSnapshot {
        &self.snapshot
    }

    pub fn cancel(&self) -> &CancelSignal {
        &self.cancel
    }

    /// Directory of the diagnostic's file, used for documents the fix adds.
    pub fn document_directory(&self) -> Option<&Utf8Path> {
        self.target.span.file_name.parent()
    }

    pub fn register(&mut self, fix: impl CandidateFix + 'static) {
        self.fixes.push(Box::new(fix));
    }

    pub(crate) fn into_fixes(self) -> Vec<Box<dyn CandidateFix>> {
        self.fixes
    }
}
