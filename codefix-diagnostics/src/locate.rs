use camino::Utf8Path;
use codefix_types::diagnostic::{DocumentDiagnostics, normalize_path};
use codefix_types::response::{DiagnosticKey, DiagnosticLocation};
use tracing::{debug, warn};

/// Output of [`locate`].
#[derive(Debug, Clone, Default)]
pub struct Located {
    pub locations: Vec<DiagnosticLocation>,
    /// Diagnostics dropped because they carried no usable location.
    pub skipped: usize,
}

/// Convert grouped diagnostics into locations, in input order.
///
/// Each location's key is the diagnostic's index in the flattened input, so it stays stable
/// whether or not earlier diagnostics were skipped. When `target` is given only diagnostics whose
/// span names that file are kept.
pub fn locate(documents: &[DocumentDiagnostics], target: Option<&Utf8Path>) -> Located {
    let target = target.map(|t| normalize_path(t.as_str()));
    let mut out = Located::default();

    let diagnostics = documents.iter().flat_map(|doc| doc.diagnostics.iter());
    for (index, diag) in diagnostics.enumerate() {
        let span = match &diag.location {
            Some(span) if span.is_well_formed() => span,
            Some(span) => {
                warn!(
                    diagnostic = %diag.id,
                    file = %span.file_name,
                    line = span.line,
                    column = span.column,
                    "skipping diagnostic with malformed span"
                );
                out.skipped += 1;
                continue;
            }
            None => {
                warn!(diagnostic = %diag.id, "skipping diagnostic without location");
                out.skipped += 1;
                continue;
            }
        };

        if let Some(target) = &target
            && normalize_path(span.file_name.as_str()) != *target
        {
            continue;
        }

        out.locations.push(DiagnosticLocation {
            file_name: span.file_name.clone(),
            line: span.line,
            column: span.column,
            end_line: span.end_line,
            end_column: span.end_column,
            text: diag.message.clone(),
            id: diag.id.clone(),
            log_level: diag.severity,
            tags: diag.tags.clone(),
            projects: diag.projects.clone(),
            additional_locations: diag.additional_locations.clone(),
            original: DiagnosticKey(index),
            fixes: Vec::new(),
        });
    }

    debug!(
        located = out.locations.len(),
        skipped = out.skipped,
        "located diagnostics"
    );
    out
}
