use codefix_types::edit::{Position, TextEdit};
use diffy::Line;

/// Line-based edits that turn `old` into `new`.
///
/// Every run of adjacent deleted/inserted lines becomes one edit, expressed in `old`'s
/// coordinates. When both sides of a run end with the same line terminator it is left out, so a
/// single changed line yields just the new line content.
pub fn text_edits(old: &str, new: &str) -> Vec<TextEdit> {
    if old == new {
        return vec![];
    }
    if old.is_empty() {
        return vec![TextEdit::new(new, Position::START, Position::START)];
    }
    if new.is_empty() {
        return vec![TextEdit::replace_all(old, "")];
    }

    let patch = diffy::create_patch(old, new);
    let mut edits = Vec::new();

    for hunk in patch.hunks() {
        let mut old_line = hunk.old_range().start() as u32;
        let mut run = Run::default();

        for line in hunk.lines() {
            match line {
                Line::Context(_) => {
                    run.flush(&mut edits);
                    old_line += 1;
                }
                Line::Delete(text) => {
                    run.start.get_or_insert(old_line);
                    run.deleted.push_str(text);
                    old_line += 1;
                }
                Line::Insert(text) => {
                    run.start.get_or_insert(old_line);
                    run.inserted.push_str(text);
                }
            }
        }
        run.flush(&mut edits);
    }

    edits
}

#[derive(Default)]
struct Run {
    start: Option<u32>,
    deleted: String,
    inserted: String,
}

impl Run {
    fn flush(&mut self, out: &mut Vec<TextEdit>) {
        let Some(line) = self.start.take() else {
            return;
        };
        let mut deleted = std::mem::take(&mut self.deleted);
        let mut inserted = std::mem::take(&mut self.inserted);

        for terminator in ["\r\n", "\n"] {
            if deleted.ends_with(terminator) && inserted.ends_with(terminator) {
                deleted.truncate(deleted.len() - terminator.len());
                inserted.truncate(inserted.len() - terminator.len());
                break;
            }
        }

        let start = Position::new(line, 1);
        out.push(TextEdit::new(inserted, start, start.advance(&deleted)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codefix_types::edit::apply_text_edits;
    use pretty_assertions::assert_eq;

    #[test]
    fn identical_texts_need_no_edits() {
        assert!(text_edits("a\nb\n", "a\nb\n").is_empty());
    }

    #[test]
    fn single_line_change_drops_the_newline() {
        let old = "using System;\n\nvar x = 1;\nreturn;\n";
        let new = "using System;\n\nvar x = 1; // fixed\nreturn;\n";
        let edits = text_edits(old, new);
        assert_eq!(
            edits,
            vec![TextEdit::new(
                "var x = 1; // fixed",
                Position::new(3, 1),
                Position::new(3, 11)
            )]
        );
    }

    #[test]
    fn separate_runs_become_separate_edits() {
        let old = "1\n2\n3\n4\n5\n6\n7\n8\n9\n10\n";
        let new = "1\nTWO\n3\n4\n5\n6\n7\n8\nNINE\n10\n";
        let edits = text_edits(old, new);
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].start(), Position::new(2, 1));
        assert_eq!(edits[1].start(), Position::new(9, 1));
        assert_eq!(apply_text_edits(old, &edits).expect("apply"), new);
    }

    #[test]
    fn pure_insertion_keeps_its_newline() {
        let old = "a\nc\n";
        let new = "a\nb\nc\n";
        let edits = text_edits(old, new);
        assert_eq!(
            edits,
            vec![TextEdit::new("b\n", Position::new(2, 1), Position::new(2, 1))]
        );
    }

    #[test]
    fn pure_deletion_spans_to_next_line() {
        let edits = text_edits("a\nb\nc\n", "a\nc\n");
        assert_eq!(
            edits,
            vec![TextEdit::new("", Position::new(2, 1), Position::new(3, 1))]
        );
    }

    #[test]
    fn missing_final_newline_round_trips() {
        let old = "a\nb";
        let new = "a\nb\nc";
        let edits = text_edits(old, new);
        assert_eq!(apply_text_edits(old, &edits).expect("apply"), new);
    }

    #[test]
    fn crlf_lines_round_trip() {
        let old = "a\r\nb\r\nc\r\n";
        let new = "a\r\nB\r\nc\r\n";
        let edits = text_edits(old, new);
        assert_eq!(
            edits,
            vec![TextEdit::new("B", Position::new(2, 1), Position::new(2, 2))]
        );
        assert_eq!(apply_text_edits(old, &edits).expect("apply"), new);
    }

    #[test]
    fn empty_sides_use_whole_text_edits() {
        assert_eq!(
            text_edits("", "x\n"),
            vec![TextEdit::new("x\n", Position::START, Position::START)]
        );
        assert_eq!(
            text_edits("x\ny", ""),
            vec![TextEdit::new("", Position::START, Position::new(2, 2))]
        );
    }
}
