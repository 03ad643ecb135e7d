//! Snapshot and edit engine for codefix.
//!
//! Responsibilities:
//! - Hold immutable, versioned project snapshots with structural sharing.
//! - Apply a fix's operations in order against a private snapshot lineage.
//! - Derive per-file text edits by diffing each snapshot against its predecessor.

mod apply;
mod cancel;
mod diff;
mod error;
mod operation;
mod snapshot;

pub use apply::{AppliedChanges, ApplyOptions, apply_operations, diff_snapshots};
pub use cancel::{CancelSignal, Cancelled};
pub use diff::text_edits;
pub use error::{EditError, EditResult};
pub use operation::{CodeOperation, LiveProject, OpFut, SideEffectOperation};
pub use snapshot::{Document, DocumentId, ProjectSnapshot, SnapshotVersion};
