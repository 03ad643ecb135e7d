use std::sync::Arc;

use crate::provider::FixProvider;

mod empty_statement;
mod trailing_whitespace;

pub use empty_statement::EmptyStatementProvider;
pub use trailing_whitespace::TrailingWhitespaceProvider;

pub fn builtin_providers() -> Vec<Arc<dyn FixProvider>> {
    vec![
        Arc::new(TrailingWhitespaceProvider),
        Arc::new(EmptyStatementProvider),
    ]
}
