use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use camino::{Utf8Path, Utf8PathBuf};
use codefix_types::diagnostic::normalize_path;
use im::OrdMap;

use crate::error::{EditError, EditResult};

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

/// Identity of one snapshot value. Every transform yields a new version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotVersion(u64);

impl SnapshotVersion {
    fn next() -> Self {
        Self(NEXT_VERSION.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    /// File name without directory, e.g. "A.cs".
    pub name: String,
    pub path: Option<Utf8PathBuf>,
    pub project: Option<String>,
    pub text: Arc<str>,
}

impl Document {
    pub fn new(id: DocumentId, path: impl Into<Utf8PathBuf>, text: impl Into<Arc<str>>) -> Self {
        let path = path.into();
        let name = path.file_name().unwrap_or(path.as_str()).to_string();
        Self {
            id,
            name,
            path: Some(path),
            project: None,
            text: text.into(),
        }
    }

    /// A document that exists only in memory and has no path yet.
    pub fn unsaved(id: DocumentId, name: impl Into<String>, text: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            name: name.into(),
            path: None,
            project: None,
            text: text.into(),
        }
    }

    pub fn in_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Path for edits: the document path, else `directory/name`.
    pub fn resolve_path(&self, directory: Option<&Utf8Path>) -> EditResult<Utf8PathBuf> {
        match (&self.path, directory) {
            (Some(path), _) => Ok(path.clone()),
            (None, Some(dir)) => Ok(dir.join(&self.name)),
            (None, None) => Err(EditError::MissingPath {
                name: self.name.clone(),
            }),
        }
    }
}

/// An immutable, versioned view of all tracked documents.
///
/// Transforms return a new snapshot; documents that were not touched are shared with the source.
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    version: SnapshotVersion,
    documents: OrdMap<DocumentId, Document>,
}

impl Default for ProjectSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectSnapshot {
    pub fn new() -> Self {
        Self {
            version: SnapshotVersion::next(),
            documents: OrdMap::new(),
        }
    }

    pub fn from_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        Self {
            version: SnapshotVersion::next(),
            documents: documents.into_iter().map(|d| (d.id, d)).collect(),
        }
    }

    pub fn version(&self) -> SnapshotVersion {
        self.version
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(&id)
    }

    /// Look a document up by path, ignoring separator style.
    pub fn find_by_path(&self, path: &Utf8Path) -> Option<&Document> {
        let wanted = normalize_path(path.as_str());
        self.documents().find(|d| {
            d.path
                .as_ref()
                .is_some_and(|p| normalize_path(p.as_str()) == wanted)
        })
    }

    /// An id not used by any document in this snapshot.
    pub fn next_document_id(&self) -> DocumentId {
        self.documents
            .get_max()
            .map(|(id, _)| DocumentId(id.0 + 1))
            .unwrap_or(DocumentId(1))
    }

    pub fn with_text(&self, id: DocumentId, text: impl Into<Arc<str>>) -> EditResult<Self> {
        let mut doc = self
            .document(id)
            .cloned()
            .ok_or(EditError::UnknownDocument(id))?;
        doc.text = text.into();
        Ok(self.with_document(doc))
    }

    /// Insert or replace a document.
    pub fn with_document(&self, document: Document) -> Self {
        Self {
            version: SnapshotVersion::next(),
            documents: self.documents.update(document.id, document),
        }
    }

    pub fn without_document(&self, id: DocumentId) -> EditResult<Self> {
        if !self.documents.contains_key(&id) {
            return Err(EditError::UnknownDocument(id));
        }
        Ok(Self {
            version: SnapshotVersion::next(),
            documents: self.documents.without(&id),
        })
    }
}
