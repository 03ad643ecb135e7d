use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::snapshot::{DocumentId, ProjectSnapshot};

/// Boxed future used at the object-safe async seams.
pub type OpFut<'a, T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>;

/// The live project state that side effects act on.
pub trait LiveProject: Send + Sync {
    fn current_snapshot(&self) -> ProjectSnapshot;

    fn open_document(&self, id: DocumentId) -> OpFut<'_, ()>;
}

/// An operation that acts on the live project instead of producing text.
///
/// [`LiveProject`] is read-only apart from opening documents, so a side effect cannot change
/// document contents. Text changes must come from [`CodeOperation::ApplyChanges`]; the running
/// snapshot is never re-read from the live project after a side effect.
pub trait SideEffectOperation: Send + Sync + fmt::Debug {
    fn title(&self) -> &str;

    fn apply<'a>(&'a self, project: &'a dyn LiveProject) -> OpFut<'a, ()>;
}

/// One atomic step of a fix.
#[derive(Clone)]
pub enum CodeOperation {
    /// Replace the running snapshot with this candidate.
    ApplyChanges(ProjectSnapshot),
    /// Ask the editor to open a document.
    OpenDocument(DocumentId),
    SideEffect(Arc<dyn SideEffectOperation>),
}

impl CodeOperation {
    pub fn kind(&self) -> &'static str {
        match self {
            CodeOperation::ApplyChanges(_) => "apply_changes",
            CodeOperation::OpenDocument(_) => "open_document",
            CodeOperation::SideEffect(_) => "side_effect",
        }
    }
}

impl fmt::Debug for CodeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeOperation::ApplyChanges(snapshot) => f
                .debug_tuple("ApplyChanges")
                .field(&snapshot.version())
                .finish(),
            CodeOperation::OpenDocument(id) => f.debug_tuple("OpenDocument").field(id).finish(),
            CodeOperation::SideEffect(op) => f.debug_tuple("SideEffect").field(&op.title()).finish(),
        }
    }
}
