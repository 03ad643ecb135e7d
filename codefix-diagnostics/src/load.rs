use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use codefix_types::diagnostic::DocumentDiagnostics;
use fs_err as fs;
use glob::glob;
use thiserror::Error;
use tracing::debug;

pub const REPORT_FILE_NAME: &str = "diagnostics.json";

#[derive(Debug, Clone)]
pub struct LoadedReport {
    pub path: Utf8PathBuf,
    /// Directory name under the reports dir (best effort).
    pub source_id: String,
    pub documents: Result<Vec<DocumentDiagnostics>, ReportLoadError>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportLoadError {
    #[error("io error: {message}")]
    Io { message: String },

    #[error("json parse error: {message}")]
    Json { message: String },
}

/// Read every `<dir>/*/diagnostics.json`.
///
/// Per-file failures are kept in the result instead of failing the batch. A missing directory
/// yields an empty list.
pub fn load_reports(reports_dir: &Utf8Path) -> anyhow::Result<Vec<LoadedReport>> {
    let pattern = reports_dir.join("*").join(REPORT_FILE_NAME);
    let pattern_str = pattern.as_str();

    debug!(pattern = %pattern_str, "scanning for diagnostic reports");

    let mut out = Vec::new();
    for entry in glob(pattern_str).context("glob */diagnostics.json")? {
        let path = entry.context("glob entry")?;
        let path = Utf8PathBuf::from_path_buf(path)
            .map_err(|p| anyhow::anyhow!("non-utf8 report path: {}", p.display()))?;

        let source_id = path
            .parent()
            .and_then(|p| p.file_name())
            .unwrap_or("unknown")
            .to_string();

        let documents = match fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str::<Vec<DocumentDiagnostics>>(&s).map_err(|e| {
                ReportLoadError::Json {
                    message: e.to_string(),
                }
            }),
            Err(e) => Err(ReportLoadError::Io {
                message: e.to_string(),
            }),
        };

        out.push(LoadedReport {
            path,
            source_id,
            documents,
        });
    }

    out.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(out)
}
