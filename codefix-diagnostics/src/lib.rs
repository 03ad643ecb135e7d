//! Diagnostic ingestion.
//!
//! codefix consumes diagnostics produced by an external rule engine. This crate turns them into
//! addressable locations, applies the rule enable table, and reads on-disk reports tolerantly so one
//! broken report does not hide the others.

mod load;
mod locate;
mod rules;

pub use load::{LoadedReport, REPORT_FILE_NAME, ReportLoadError, load_reports};
pub use locate::{Located, locate};
pub use rules::{ReportLevel, RuleDefinition, RuleLevels};
