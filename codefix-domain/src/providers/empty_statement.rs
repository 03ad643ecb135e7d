use std::collections::BTreeSet;

use anyhow::Context;
use codefix_edit::{CancelSignal, CodeOperation, DocumentId, OpFut, ProjectSnapshot};
use codefix_types::edit::{Position, TextEdit, apply_text_edits, text_between};
use tracing::debug;

use crate::provider::{CandidateFix, FixContext, FixProvider};

/// Removes a stray `;` reported as an empty statement.
pub struct EmptyStatementProvider;

impl EmptyStatementProvider {
    const ID: &'static str = "empty-statement";
    const RULE: &'static str = "S1116";
}

impl FixProvider for EmptyStatementProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    fn fixable_diagnostic_ids(&self) -> BTreeSet<String> {
        BTreeSet::from([Self::RULE.to_string()])
    }

    fn register_fixes<'a>(&'a self, ctx: &'a mut FixContext) -> OpFut<'a, ()> {
        Box::pin(async move {
            let (start, end) = (ctx.span().start(), ctx.span().end());
            let covered = text_between(&ctx.document().text, start, end)
                .context("diagnostic span does not fit the document")?;

            if covered.trim() != ";" {
                debug!(covered = %covered, "span is not an empty statement, no fix");
                return Ok(());
            }

            let document = ctx.document().id;
            ctx.register(RemoveEmptyStatement {
                document,
                start,
                end,
            });
            Ok(())
        })
    }
}

struct RemoveEmptyStatement {
    document: DocumentId,
    start: Position,
    end: Position,
}

impl CandidateFix for RemoveEmptyStatement {
    fn title(&self) -> &str {
        "Remove this empty statement"
    }

    fn equivalence_key(&self) -> Option<&str> {
        Some("S1116.remove")
    }

    fn operations<'a>(
        &'a self,
        snapshot: &'a ProjectSnapshot,
        _cancel: &'a CancelSignal,
    ) -> OpFut<'a, Vec<CodeOperation>> {
        Box::pin(async move {
            let doc = snapshot
                .document(self.document)
                .with_context(|| format!("document {} is gone", self.document))?;
            let removed = apply_text_edits(&doc.text, &[TextEdit::new("", self.start, self.end)])?;
            let changed = snapshot.with_text(self.document, removed)?;
            Ok(vec![CodeOperation::ApplyChanges(changed)])
        })
    }
}
