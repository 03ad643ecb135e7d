//! Transport-free settings for the fix service.

use camino::Utf8PathBuf;
use codefix_diagnostics::RuleLevels;

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub project_root: Utf8PathBuf,

    // Concurrency
    pub max_concurrent_diagnostics: usize,
    pub max_concurrent_files: usize,

    // Rules
    pub rules: RuleLevels,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            project_root: Utf8PathBuf::from("."),
            max_concurrent_diagnostics: 4,
            max_concurrent_files: 4,
            rules: RuleLevels::default(),
        }
    }
}
