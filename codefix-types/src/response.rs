//! Request and response payloads exposed by the fix service.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::diagnostic::{LogLevel, SourceSpan};
use crate::edit::{FileEditBundle, NamedFix};

/// Index of a diagnostic within one request's flattened batch.
///
/// Only meaningful inside the request that assigned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DiagnosticKey(pub usize);

/// The addressable output unit: a diagnostic position plus its resolved fixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiagnosticLocation {
    pub file_name: Utf8PathBuf,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,

    /// Diagnostic message.
    #[serde(default)]
    pub text: String,

    /// Rule identifier.
    pub id: String,

    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_locations: Vec<SourceSpan>,

    #[serde(skip)]
    pub original: DiagnosticKey,

    #[serde(default)]
    pub fixes: Vec<NamedFix>,
}

impl DiagnosticLocation {
    pub fn span(&self) -> SourceSpan {
        SourceSpan {
            file_name: self.file_name.clone(),
            line: self.line,
            column: self.column,
            end_line: self.end_line,
            end_column: self.end_column,
            text: None,
        }
    }
}

/// Response for the code-check-with-fixes endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeCheckResponse {
    #[serde(default)]
    pub quick_fixes: Vec<DiagnosticLocation>,
}

impl CodeCheckResponse {
    pub fn fix_count(&self) -> usize {
        self.quick_fixes.iter().map(|l| l.fixes.len()).sum()
    }
}

/// A fix that can be run by identifier, without its edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AvailableFix {
    pub identifier: String,
    pub title: String,
    pub diagnostic_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AvailableFixesResponse {
    #[serde(default)]
    pub code_actions: Vec<AvailableFix>,
}

/// Request to materialize (and optionally apply) one fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RunFixRequest {
    pub file_name: Utf8PathBuf,
    pub identifier: String,

    #[serde(default = "default_true")]
    pub wants_text_changes: bool,

    #[serde(default)]
    pub wants_all_operations: bool,

    #[serde(default)]
    pub apply_immediately: bool,
}

fn default_true() -> bool {
    true
}

impl RunFixRequest {
    pub fn new(file_name: impl Into<Utf8PathBuf>, identifier: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            identifier: identifier.into(),
            wants_text_changes: true,
            wants_all_operations: false,
            apply_immediately: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RunFixResponse {
    #[serde(default)]
    pub file_edits: Vec<FileEditBundle>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub opened: Vec<Utf8PathBuf>,
}
