//! Edit model: text edits, per-file bundles, and named fixes.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A 1-based line/column position. Columns count `char`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const START: Position = Position { line: 1, column: 1 };

    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Position reached after walking `text` from `self`.
    pub fn advance(self, text: &str) -> Position {
        let mut pos = self;
        for ch in text.chars() {
            if ch == '\n' {
                pos.line += 1;
                pos.column = 1;
            } else {
                pos.column += 1;
            }
        }
        pos
    }
}

/// A single replacement region in a document.
///
/// The range is `[start, end)` in the coordinates of the text the edit was computed against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TextEdit {
    text: String,
    start_line: u32,
    end_line: u32,
    start_column: u32,
    end_column: u32,
}

impl TextEdit {
    pub fn new(text: impl Into<String>, start: Position, end: Position) -> Self {
        Self {
            text: text.into(),
            start_line: start.line,
            end_line: end.line,
            start_column: start.column,
            end_column: end.column,
        }
    }

    /// Edit that replaces the whole of `old` with `new`.
    pub fn replace_all(old: &str, new: impl Into<String>) -> Self {
        Self::new(new, Position::START, Position::START.advance(old))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn start(&self) -> Position {
        Position::new(self.start_line, self.start_column)
    }

    pub fn end(&self) -> Position {
        Position::new(self.end_line, self.end_column)
    }

    pub fn start_line(&self) -> u32 {
        self.start_line
    }

    pub fn end_line(&self) -> u32 {
        self.end_line
    }

    pub fn start_column(&self) -> u32 {
        self.start_column
    }

    pub fn end_column(&self) -> u32 {
        self.end_column
    }
}

/// Edits for one file, in the order the applier produced them.
///
/// Callers must not assume the edits are sorted by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileEditBundle {
    pub file_name: Utf8PathBuf,
    #[serde(default)]
    pub edits: Vec<TextEdit>,
}

/// One candidate remedy for one diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NamedFix {
    pub message: String,
    #[serde(default)]
    pub file_edits: Vec<FileEditBundle>,
}

impl NamedFix {
    /// A fix that exists but whose edits could not be computed.
    pub fn title_only(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file_edits: vec![],
        }
    }

    pub fn edit_count(&self) -> usize {
        self.file_edits.iter().map(|b| b.edits.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextEditError {
    #[error("invalid position {line}:{column} (lines and columns are 1-based)")]
    InvalidPosition { line: u32, column: u32 },

    #[error("position {line}:{column} is outside the document")]
    OutOfRange { line: u32, column: u32 },

    #[error("edit ends before it starts at {line}:{column}")]
    Inverted { line: u32, column: u32 },

    #[error("edits overlap at {line}:{column}")]
    Overlap { line: u32, column: u32 },
}

/// Apply edits that were all computed against `text`.
///
/// Edits may be given in any order but must not overlap. Insertions at the same
/// position are applied in the order given.
pub fn apply_text_edits(text: &str, edits: &[TextEdit]) -> Result<String, TextEditError> {
    let index = LineIndex::new(text);

    let mut spans = Vec::with_capacity(edits.len());
    for edit in edits {
        let start = index.offset(edit.start())?;
        let end = index.offset(edit.end())?;
        if end < start {
            return Err(TextEditError::Inverted {
                line: edit.start_line,
                column: edit.start_column,
            });
        }
        spans.push((start, end, edit));
    }
    spans.sort_by_key(|(start, end, _)| (*start, *end));

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for (start, end, edit) in spans {
        if start < cursor {
            return Err(TextEditError::Overlap {
                line: edit.start_line,
                column: edit.start_column,
            });
        }
        out.push_str(&text[cursor..start]);
        out.push_str(&edit.text);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

/// Byte offset of `pos` in `text`.
pub fn position_offset(text: &str, pos: Position) -> Result<usize, TextEditError> {
    LineIndex::new(text).offset(pos)
}

/// The text between two positions, if both address `text`.
pub fn text_between(text: &str, start: Position, end: Position) -> Result<&str, TextEditError> {
    let index = LineIndex::new(text);
    let from = index.offset(start)?;
    let to = index.offset(end)?;
    if to < from {
        return Err(TextEditError::Inverted {
            line: start.line,
            column: start.column,
        });
    }
    Ok(&text[from..to])
}

/// Byte offsets of line starts, used to turn positions into offsets.
struct LineIndex<'a> {
    text: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(text: &'a str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { text, starts }
    }

    fn offset(&self, pos: Position) -> Result<usize, TextEditError> {
        if pos.line == 0 || pos.column == 0 {
            return Err(TextEditError::InvalidPosition {
                line: pos.line,
                column: pos.column,
            });
        }
        let out_of_range = TextEditError::OutOfRange {
            line: pos.line,
            column: pos.column,
        };

        let idx = (pos.line - 1) as usize;
        let Some(&line_start) = self.starts.get(idx) else {
            return Err(out_of_range);
        };
        let line_end = match self.starts.get(idx + 1) {
            Some(next) => next - 1,
            None => self.text.len(),
        };

        let line = &self.text[line_start..line_end];
        let wanted = (pos.column - 1) as usize;
        match line.char_indices().nth(wanted) {
            Some((i, _)) => Ok(line_start + i),
            None if line.chars().count() == wanted => Ok(line_end),
            None => Err(out_of_range),
        }
    }
}
