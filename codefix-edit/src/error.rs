//! Error types for codefix-edit.
//!
//! Cancellation is kept apart from every other failure: callers degrade ordinary failures into an
//! empty fix but must unwind on cancellation.

use thiserror::Error;

use crate::cancel::Cancelled;
use crate::snapshot::DocumentId;

#[derive(Debug, Error)]
pub enum EditError {
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    #[error("document {0} is not part of the snapshot")]
    UnknownDocument(DocumentId),

    /// A document has neither a path nor a directory to resolve its name against.
    #[error("document `{name}` has no path and no document directory was given")]
    MissingPath { name: String },

    #[error("side effect `{title}` failed: {source:#}")]
    SideEffect {
        title: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("runtime error: {0:#}")]
    Runtime(#[from] anyhow::Error),
}

impl EditError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EditError::Cancelled(_))
    }
}

pub type EditResult<T> = Result<T, EditError>;
