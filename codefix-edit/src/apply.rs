use camino::{Utf8Path, Utf8PathBuf};
use codefix_types::edit::{FileEditBundle, Position, TextEdit};
use tracing::{debug, warn};

use crate::cancel::CancelSignal;
use crate::diff::text_edits;
use crate::error::{EditError, EditResult};
use crate::operation::{CodeOperation, LiveProject};
use crate::snapshot::ProjectSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Line-level edits when true, one whole-file replacement per file when false.
    pub wants_text_changes: bool,
    /// Surface open-document operations in [`AppliedChanges::opened`].
    pub wants_all_operations: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            wants_text_changes: true,
            wants_all_operations: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppliedChanges {
    /// Bundles in production order. Each one is relative to the text left by the operations
    /// before it.
    pub file_edits: Vec<FileEditBundle>,
    pub opened: Vec<Utf8PathBuf>,
    /// Titles of side effects that were recorded but not executed (no live project).
    pub deferred: Vec<String>,
    /// Head of the lineage after the last operation.
    pub snapshot: ProjectSnapshot,
}

/// Apply a fix's operations in emission order.
///
/// Content changes are diffed against the snapshot left by the previous operation, never against
/// `base` once the lineage has advanced. Side effects run only when `live` is given. Nothing here
/// publishes; the returned snapshot is private to the caller.
pub async fn apply_operations(
    operations: &[CodeOperation],
    base: &ProjectSnapshot,
    document_directory: Option<&Utf8Path>,
    opts: &ApplyOptions,
    live: Option<&dyn LiveProject>,
    cancel: &CancelSignal,
) -> EditResult<AppliedChanges> {
    let mut running = base.clone();
    let mut out = AppliedChanges {
        file_edits: vec![],
        opened: vec![],
        deferred: vec![],
        snapshot: base.clone(),
    };

    for (index, op) in operations.iter().enumerate() {
        cancel.check()?;
        debug!(index, kind = op.kind(), "applying operation");

        match op {
            CodeOperation::ApplyChanges(candidate) => {
                let bundles = diff_snapshots(
                    &running,
                    candidate,
                    document_directory,
                    opts.wants_text_changes,
                )?;
                out.file_edits.extend(bundles);
                running = candidate.clone();
            }
            CodeOperation::OpenDocument(id) => {
                if opts.wants_all_operations {
                    let doc = running
                        .document(*id)
                        .ok_or(EditError::UnknownDocument(*id))?;
                    out.opened.push(doc.resolve_path(document_directory)?);
                }
                if let Some(live) = live {
                    live.open_document(*id)
                        .await
                        .map_err(|source| EditError::SideEffect {
                            title: format!("open document {id}"),
                            source,
                        })?;
                }
            }
            CodeOperation::SideEffect(effect) => match live {
                Some(live) => {
                    effect
                        .apply(live)
                        .await
                        .map_err(|source| EditError::SideEffect {
                            title: effect.title().to_string(),
                            source,
                        })?;
                }
                None => {
                    debug!(title = effect.title(), "side effect deferred in preview");
                    out.deferred.push(effect.title().to_string());
                }
            },
        }
    }

    out.snapshot = running;
    Ok(out)
}

/// Per-file edits that turn `base` into `candidate`.
///
/// Files come out in document-id order: changed and added documents first, then removed ones.
pub fn diff_snapshots(
    base: &ProjectSnapshot,
    candidate: &ProjectSnapshot,
    document_directory: Option<&Utf8Path>,
    wants_text_changes: bool,
) -> EditResult<Vec<FileEditBundle>> {
    let mut bundles = Vec::new();

    for doc in candidate.documents() {
        let edits = match base.document(doc.id) {
            Some(old) if old.text == doc.text => continue,
            Some(old) if wants_text_changes => text_edits(&old.text, &doc.text),
            Some(old) => vec![TextEdit::replace_all(&old.text, &*doc.text)],
            None => vec![TextEdit::new(&*doc.text, Position::START, Position::START)],
        };
        if edits.is_empty() {
            continue;
        }
        bundles.push(FileEditBundle {
            file_name: doc.resolve_path(document_directory)?,
            edits,
        });
    }

    for old in base.documents() {
        if candidate.document(old.id).is_some() {
            continue;
        }
        let file_name = old.resolve_path(document_directory)?;
        if old.text.is_empty() {
            warn!(file = %file_name, "removed document was empty, no edit produced");
            continue;
        }
        bundles.push(FileEditBundle {
            file_name,
            edits: vec![TextEdit::replace_all(&old.text, "")],
        });
    }

    Ok(bundles)
}
