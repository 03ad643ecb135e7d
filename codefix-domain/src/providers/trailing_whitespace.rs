use std::collections::BTreeSet;

use anyhow::Context;
use codefix_edit::{CancelSignal, CodeOperation, DocumentId, OpFut, ProjectSnapshot};

use crate::provider::{CandidateFix, FixContext, FixProvider};

pub struct TrailingWhitespaceProvider;

impl TrailingWhitespaceProvider {
    const ID: &'static str = "trailing-whitespace";
    const RULE: &'static str = "S1131";
}

impl FixProvider for TrailingWhitespaceProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    fn fixable_diagnostic_ids(&self) -> BTreeSet<String> {
        BTreeSet::from([Self::RULE.to_string()])
    }

    fn register_fixes<'a>(&'a self, ctx: &'a mut FixContext) -> OpFut<'a, ()> {
        Box::pin(async move {
            let span = ctx.span();
            let (start_line, end_line) = (span.line, span.end_line);

            let text = &ctx.document().text;
            if trim_lines(text, start_line, end_line) == **text {
                return Ok(());
            }

            let document = ctx.document().id;
            ctx.register(TrimTrailingWhitespace {
                document,
                start_line,
                end_line,
            });
            Ok(())
        })
    }
}

struct TrimTrailingWhitespace {
    document: DocumentId,
    start_line: u32,
    end_line: u32,
}

impl CandidateFix for TrimTrailingWhitespace {
    fn title(&self) -> &str {
        "Remove trailing whitespace"
    }

    fn equivalence_key(&self) -> Option<&str> {
        Some("S1131.trim")
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
            let trimmed = trim_lines(&doc.text, self.start_line, self.end_line);
            let changed = snapshot.with_text(self.document, trimmed)?;
            Ok(vec![CodeOperation::ApplyChanges(changed)])
        })
    }
}

/// Strip spaces and tabs at the end of lines `start..=end`, keeping line terminators.
fn trim_lines(text: &str, start: u32, end: u32) -> String {
    let mut out = String::with_capacity(text.len());
    for (idx, line) in text.split_inclusive('\n').enumerate() {
        let number = idx as u32 + 1;
        if number < start || number > end {
            out.push_str(line);
            continue;
        }

        let (content, terminator) = match line.strip_suffix('\n') {
            Some(rest) => match rest.strip_suffix('\r') {
                Some(content) => (content, "\r\n"),
                None => (rest, "\n"),
            },
            None => (line, ""),
        };
        out.push_str(content.trim_end_matches([' ', '\t']));
        out.push_str(terminator);
    }
    out
}
