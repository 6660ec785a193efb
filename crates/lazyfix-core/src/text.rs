//! Position mapping between byte offsets and LSP positions.
//!
//! LSP positions count characters in UTF-16 code units, while documents are
//! stored as UTF-8. [`LineIndex`] precomputes line starts once per snapshot so
//! conversions in either direction are a binary search plus a scan of one line.

use tower_lsp_server::ls_types::{Position, Range, TextEdit};

/// Line start table for a single text snapshot.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            line_starts: compute_line_starts(text),
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset where `line` starts, or `None` past the last line.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Byte offset of the end of `line`, excluding its terminator.
    fn line_content_end(&self, line: usize) -> usize {
        let Some(next) = self.line_starts.get(line + 1).copied() else {
            return self.text.len();
        };
        let bytes = self.text.as_bytes();
        let line_start = self.line_starts[line];
        if next >= line_start + 2 && bytes[next - 1] == b'\n' && bytes[next - 2] == b'\r' {
            next - 2
        } else {
            next - 1
        }
    }

    /// Converts a byte offset to an LSP position.
    ///
    /// Offsets past the end clamp to the end of the text; offsets inside a
    /// multi-byte character snap back to that character's start.
    pub fn position(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }

        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let line_start = self.line_starts[line];
        let character = self.text[line_start..offset].encode_utf16().count();

        Position::new(line as u32, character as u32)
    }

    pub fn range(&self, start: usize, end: usize) -> Range {
        Range::new(self.position(start), self.position(end))
    }

    /// Converts an LSP position to a byte offset.
    ///
    /// Lines past the end clamp to the end of the text and characters past
    /// the end of a line clamp to the line end, matching client behaviour.
    pub fn offset(&self, position: Position) -> usize {
        let line = position.line as usize;
        let Some(line_start) = self.line_start(line) else {
            return self.text.len();
        };
        let line_end = self.line_content_end(line);

        let target = position.character as usize;
        let mut utf16 = 0;
        for (idx, ch) in self.text[line_start..line_end].char_indices() {
            if utf16 >= target {
                return line_start + idx;
            }
            utf16 += ch.len_utf16();
        }
        line_end
    }
}

/// Computes the byte offset of each line start. Always contains at least `0`.
///
/// `\n`, `\r\n` and a lone `\r` all end a line.
pub fn compute_line_starts(text: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut line_starts = vec![0];
    for (idx, byte) in bytes.iter().enumerate() {
        match byte {
            b'\n' => line_starts.push(idx + 1),
            b'\r' if bytes.get(idx + 1) != Some(&b'\n') => line_starts.push(idx + 1),
            _ => {}
        }
    }
    line_starts
}

/// Applies LSP text edits to `text`.
///
/// All ranges are interpreted against the original text, as the protocol
/// requires for the edits of a single `TextDocumentEdit`. Edits starting at
/// the same position are applied in the order given.
pub fn apply_text_edits(text: &str, edits: &[TextEdit]) -> String {
    let index = LineIndex::new(text);
    let mut spans: Vec<(usize, usize, &str)> = edits
        .iter()
        .map(|edit| {
            let start = index.offset(edit.range.start);
            let end = index.offset(edit.range.end).max(start);
            (start, end, edit.new_text.as_str())
        })
        .collect();
    spans.sort_by_key(|(start, _, _)| *start);

    let mut result = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end, new_text) in spans {
        let start = start.max(cursor);
        result.push_str(&text[cursor..start]);
        result.push_str(new_text);
        cursor = end.max(start);
    }
    result.push_str(&text[cursor..]);
    result
}
