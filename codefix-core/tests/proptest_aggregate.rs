//! Property tests for response merging.

use codefix_core::aggregate::{AggregateResponse, merge_all};
use codefix_types::diagnostic::LogLevel;
use codefix_types::edit::NamedFix;
use codefix_types::response::{CodeCheckResponse, DiagnosticKey, DiagnosticLocation};
use proptest::prelude::*;

fn arb_location() -> impl Strategy<Value = DiagnosticLocation> {
    ("[A-C]\\.cs", "R[0-9]", 1u32..50, 1u32..80, 0usize..3).prop_map(
        |(file, id, line, column, fixes)| DiagnosticLocation {
            file_name: file.into(),
            line,
            column,
            end_line: line,
            end_column: column + 1,
            text: String::new(),
            id,
            log_level: LogLevel::Warning,
            tags: vec![],
            projects: vec![],
            additional_locations: vec![],
            original: DiagnosticKey::default(),
            fixes: (0..fixes)
                .map(|i| NamedFix::title_only(format!("fix {i}")))
                .collect(),
        },
    )
}

fn arb_response() -> impl Strategy<Value = CodeCheckResponse> {
    prop::collection::vec(arb_location(), 0..5).prop_map(|quick_fixes| CodeCheckResponse {
        quick_fixes,
    })
}

proptest! {
    #[test]
    fn merge_is_associative(a in arb_response(), b in arb_response(), c in arb_response()) {
        let left = a.clone().merge(b.clone()).merge(c.clone());
        let right = a.merge(b.merge(c));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn empty_is_identity(a in arb_response()) {
        prop_assert_eq!(CodeCheckResponse::empty().merge(a.clone()), a.clone());
        prop_assert_eq!(a.clone().merge(CodeCheckResponse::empty()), a);
    }

    #[test]
    fn counts_add_up(shards in prop::collection::vec(arb_response(), 0..6)) {
        let locations: usize = shards.iter().map(|s| s.quick_fixes.len()).sum();
        let fixes: usize = shards.iter().map(CodeCheckResponse::fix_count).sum();

        let merged = merge_all(shards);
        prop_assert_eq!(merged.quick_fixes.len(), locations);
        prop_assert_eq!(merged.fix_count(), fixes);
    }
}
