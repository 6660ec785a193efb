//! Text synchronization for incremental `didChange` notifications.

use lazyfix_core::LineIndex;
use tower_lsp_server::ls_types::TextDocumentContentChangeEvent;

/// Applies `changes` to `text` in order.
///
/// A change without a range replaces the whole text; ranged changes are
/// interpreted against the text produced by the previous change.
pub fn apply_content_changes(text: &str, changes: Vec<TextDocumentContentChangeEvent>) -> String {
    let mut text = text.to_string();
    for change in changes {
        match change.range {
            Some(range) => {
                let (start, end) = {
                    let index = LineIndex::new(&text);
                    let start = index.offset(range.start);
                    (start, index.offset(range.end).max(start))
                };
                text.replace_range(start..end, &change.text);
            }
            None => text = change.text,
        }
    }
    text
}
