//! Default in-memory and filesystem-backed port implementations.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use codefix_edit::{Document, DocumentId, LiveProject, OpFut, ProjectSnapshot, SnapshotVersion};
use codefix_types::diagnostic::{DocumentDiagnostics, normalize_path};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::ports::{DiagnosticSource, ProjectModel};

fn wants_file(files: Option<&[Utf8PathBuf]>, file_name: &Utf8Path) -> bool {
    match files {
        None => true,
        Some(files) => {
            let name = normalize_path(file_name.as_str());
            files.iter().any(|f| normalize_path(f.as_str()) == name)
        }
    }
}

/// Diagnostics held in memory, for embedding and testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDiagnosticSource {
    documents: Vec<DocumentDiagnostics>,
}

impl InMemoryDiagnosticSource {
    pub fn new(documents: Vec<DocumentDiagnostics>) -> Self {
        Self { documents }
    }
}

impl DiagnosticSource for InMemoryDiagnosticSource {
    fn get_diagnostics<'a>(
        &'a self,
        files: Option<&'a [Utf8PathBuf]>,
    ) -> OpFut<'a, Vec<DocumentDiagnostics>> {
        Box::pin(async move {
            Ok(self
                .documents
                .iter()
                .filter(|d| wants_file(files, &d.file_name))
                .cloned()
                .collect())
        })
    }
}

/// Reads rule engine reports from `<reports_dir>/*/diagnostics.json`.
///
/// Unreadable reports are logged and skipped; the rest of the batch is still served.
#[derive(Debug, Clone)]
pub struct FsDiagnosticSource {
    pub reports_dir: Utf8PathBuf,
}

impl FsDiagnosticSource {
    pub fn new(reports_dir: Utf8PathBuf) -> Self {
        Self { reports_dir }
    }
}

impl DiagnosticSource for FsDiagnosticSource {
    fn get_diagnostics<'a>(
        &'a self,
        files: Option<&'a [Utf8PathBuf]>,
    ) -> OpFut<'a, Vec<DocumentDiagnostics>> {
        Box::pin(async move {
            let reports = codefix_diagnostics::load_reports(&self.reports_dir)
                .with_context(|| format!("load diagnostic reports from {}", self.reports_dir))?;

            let mut out = Vec::new();
            for report in reports {
                match report.documents {
                    Ok(documents) => {
                        debug!(
                            path = %report.path,
                            source = %report.source_id,
                            files = documents.len(),
                            "loaded diagnostic report"
                        );
                        out.extend(
                            documents
                                .into_iter()
                                .filter(|d| wants_file(files, &d.file_name)),
                        );
                    }
                    Err(err) => {
                        warn!(path = %report.path, error = %err, "skipping unreadable report");
                    }
                }
            }
            Ok(out)
        })
    }
}

/// A project model over an in-memory snapshot.
///
/// Every document is treated as fully loaded. Publishing is compare-and-swap on the snapshot
/// version.
#[derive(Debug, Default)]
pub struct InMemoryProject {
    live: RwLock<ProjectSnapshot>,
    opened: Mutex<Vec<DocumentId>>,
}

impl InMemoryProject {
    pub fn new(snapshot: ProjectSnapshot) -> Self {
        Self {
            live: RwLock::new(snapshot),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Documents the editor was asked to open, in request order.
    pub fn opened_documents(&self) -> Vec<DocumentId> {
        self.opened.lock().clone()
    }

    /// Replace the live snapshot unconditionally, as an outside editor would.
    pub fn replace(&self, snapshot: ProjectSnapshot) {
        *self.live.write() = snapshot;
    }
}

impl LiveProject for InMemoryProject {
    fn current_snapshot(&self) -> ProjectSnapshot {
        self.live.read().clone()
    }

    fn open_document(&self, id: DocumentId) -> OpFut<'_, ()> {
        Box::pin(async move {
            anyhow::ensure!(
                self.live.read().document(id).is_some(),
                "cannot open unknown document {id}"
            );
            self.opened.lock().push(id);
            Ok(())
        })
    }
}

impl ProjectModel for InMemoryProject {
    fn wait_for_fully_loaded<'a>(&'a self, file: &'a Utf8Path) -> OpFut<'a, Option<Document>> {
        Box::pin(async move { Ok(self.live.read().find_by_path(file).cloned()) })
    }

    fn publish(&self, base: SnapshotVersion, snapshot: ProjectSnapshot) -> bool {
        let mut live = self.live.write();
        if live.version() != base {
            warn!(
                base = base.get(),
                live = live.version().get(),
                "live snapshot changed since the fix was computed"
            );
            return false;
        }
        *live = snapshot;
        true
    }
}
