use camino::Utf8PathBuf;
use codefix_domain::RegistryError;
use codefix_edit::Cancelled;

/// Request-level failures.
///
/// Provider and fix failures never show up here; they degrade inside the engine.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("diagnostic source failed: {0:#}")]
    DiagnosticSource(#[source] anyhow::Error),

    #[error("no fix `{identifier}` for {file_name}")]
    UnknownFix {
        file_name: Utf8PathBuf,
        identifier: String,
    },

    #[error("cannot merge a {left} response with a {right} response")]
    IncompatibleMerge {
        left: &'static str,
        right: &'static str,
    },

    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl CoreError {
    /// Contract violations are programming errors on the caller's side.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            CoreError::UnknownFix { .. } | CoreError::IncompatibleMerge { .. }
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Cancelled(_))
    }
}
