use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::edit::Position;

/// Severity as reported by the rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum LogLevel {
    Hidden,
    Info,
    #[default]
    Warning,
    Error,
}

/// A source range in 1-based, end-exclusive coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SourceSpan {
    pub file_name: Utf8PathBuf,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,

    /// Text covered by the span, when the rule engine reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl SourceSpan {
    pub fn start(&self) -> Position {
        Position::new(self.line, self.column)
    }

    pub fn end(&self) -> Position {
        Position::new(self.end_line, self.end_column)
    }

    /// True when the coordinates can address text at all.
    pub fn is_well_formed(&self) -> bool {
        self.line > 0
            && self.column > 0
            && self.end_line > 0
            && self.end_column > 0
            && self.start() <= self.end()
    }

    /// Whether the two ranges share a position. Empty ranges intersect at their point.
    pub fn intersects(&self, start: Position, end: Position) -> bool {
        self.start() <= end && start <= self.end()
    }
}

/// A diagnostic produced by the external rule engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Diagnostic {
    /// Rule identifier, e.g. "S1116".
    pub id: String,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub severity: LogLevel,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceSpan>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_locations: Vec<SourceSpan>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<String>,
}

impl Diagnostic {
    pub fn new(id: impl Into<String>, location: SourceSpan) -> Self {
        Self {
            id: id.into(),
            message: String::new(),
            severity: LogLevel::default(),
            location: Some(location),
            additional_locations: vec![],
            tags: vec![],
            projects: vec![],
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// Diagnostics for one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DocumentDiagnostics {
    pub file_name: Utf8PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

/// Normalize a path for comparison: forward slashes only.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}
