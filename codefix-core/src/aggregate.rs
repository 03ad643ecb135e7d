//! Folding fixes into locations and merging partial responses.

use std::collections::HashMap;

use codefix_types::edit::NamedFix;
use codefix_types::response::{
    AvailableFixesResponse, CodeCheckResponse, DiagnosticKey, DiagnosticLocation, RunFixResponse,
};

use crate::error::CoreError;

/// A response that can be computed in independent shards and combined.
///
/// `merge` is associative with `empty()` as identity. Order is kept within each side; callers must
/// not rely on any order between shards.
pub trait AggregateResponse: Sized {
    fn empty() -> Self;

    fn merge(self, other: Self) -> Self;
}

impl AggregateResponse for CodeCheckResponse {
    fn empty() -> Self {
        Self::default()
    }

    fn merge(mut self, other: Self) -> Self {
        self.quick_fixes.extend(other.quick_fixes);
        self
    }
}

impl AggregateResponse for AvailableFixesResponse {
    fn empty() -> Self {
        Self::default()
    }

    fn merge(mut self, other: Self) -> Self {
        self.code_actions.extend(other.code_actions);
        self
    }
}

impl AggregateResponse for RunFixResponse {
    fn empty() -> Self {
        Self::default()
    }

    fn merge(mut self, other: Self) -> Self {
        self.file_edits.extend(other.file_edits);
        self.opened.extend(other.opened);
        self
    }
}

pub fn merge_all<R: AggregateResponse>(responses: impl IntoIterator<Item = R>) -> R {
    responses.into_iter().fold(R::empty(), R::merge)
}

/// Append each diagnostic's fixes to its location, keeping the given fix order.
pub fn attach_fixes(
    mut locations: Vec<DiagnosticLocation>,
    mut fixes_by_diagnostic: HashMap<DiagnosticKey, Vec<NamedFix>>,
) -> Vec<DiagnosticLocation> {
    for location in &mut locations {
        if let Some(fixes) = fixes_by_diagnostic.remove(&location.original) {
            location.fixes.extend(fixes);
        }
    }
    locations
}

/// Any response a router may hold when it does not know the endpoint statically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyResponse {
    CodeCheck(CodeCheckResponse),
    AvailableFixes(AvailableFixesResponse),
    RunFix(RunFixResponse),
}

impl AnyResponse {
    pub fn kind(&self) -> &'static str {
        match self {
            AnyResponse::CodeCheck(_) => "code check",
            AnyResponse::AvailableFixes(_) => "available fixes",
            AnyResponse::RunFix(_) => "run fix",
        }
    }

    /// Merge two responses of the same kind.
    ///
    /// Mixing kinds is a contract violation and is reported, never coerced.
    pub fn merge(self, other: Self) -> Result<Self, CoreError> {
        match (self, other) {
            (AnyResponse::CodeCheck(a), AnyResponse::CodeCheck(b)) => {
                Ok(AnyResponse::CodeCheck(a.merge(b)))
            }
            (AnyResponse::AvailableFixes(a), AnyResponse::AvailableFixes(b)) => {
                Ok(AnyResponse::AvailableFixes(a.merge(b)))
            }
            (AnyResponse::RunFix(a), AnyResponse::RunFix(b)) => Ok(AnyResponse::RunFix(a.merge(b))),
            (left, right) => Err(CoreError::IncompatibleMerge {
                left: left.kind(),
                right: right.kind(),
            }),
        }
    }
}

impl From<CodeCheckResponse> for AnyResponse {
    fn from(value: CodeCheckResponse) -> Self {
        AnyResponse::CodeCheck(value)
    }
}

impl From<AvailableFixesResponse> for AnyResponse {
    fn from(value: AvailableFixesResponse) -> Self {
        AnyResponse::AvailableFixes(value)
    }
}

impl From<RunFixResponse> for AnyResponse {
    fn from(value: RunFixResponse) -> Self {
        AnyResponse::RunFix(value)
    }
}
