//! Built-in code action providers.
//!
//! Listing only inspects the document; every text transformation happens in
//! the actions' closures, which run on resolve or command execution.

pub mod case;
pub mod extract;
pub mod lines;
pub mod whitespace;
pub mod workspace_whitespace;

pub use case::CaseProvider;
pub use extract::ExtractProvider;
pub use lines::SortLinesProvider;
pub use whitespace::WhitespaceProvider;
pub use workspace_whitespace::WorkspaceWhitespaceProvider;

use lazyfix_core::{LineIndex, ProviderRegistry};
use std::sync::Arc;
use tower_lsp_server::ls_types::Range;

/// Registry with every built-in provider, in listing order.
pub fn default_registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(WhitespaceProvider));
    registry.register(Arc::new(WorkspaceWhitespaceProvider));
    registry.register(Arc::new(CaseProvider));
    registry.register(Arc::new(SortLinesProvider));
    registry.register(Arc::new(ExtractProvider));
    registry
}

/// Byte span of `range` in `text`, with `start <= end`.
pub(crate) fn selection(text: &str, range: Range) -> std::ops::Range<usize> {
    let index = LineIndex::new(text);
    let start = index.offset(range.start);
    start..index.offset(range.end).max(start)
}

/// Splits a line produced by `split_inclusive('\n')` into content and terminator.
pub(crate) fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, "\n")
    } else {
        (line, "")
    }
}

pub(crate) fn has_trailing_whitespace(text: &str) -> bool {
    text.split_inclusive('\n').any(|line| {
        let (content, _) = split_terminator(line);
        content.ends_with(char::is_whitespace)
    })
}

/// Removes whitespace at the end of every line, keeping line terminators.
pub(crate) fn strip_trailing_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let (content, terminator) = split_terminator(line);
        result.push_str(content.trim_end());
        result.push_str(terminator);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp_server::ls_types::Position;

    #[test]
    fn test_default_registry_order() {
        let registry = default_registry();
        assert_eq!(registry.len(), 5);
        assert!(registry.supports_language("plaintext"));
    }

    #[test]
    fn test_strip_trailing_whitespace() {
        assert_eq!(strip_trailing_whitespace("a  \nb\t\r\nc "), "a\nb\r\nc");
        assert_eq!(strip_trailing_whitespace("clean\n"), "clean\n");
        assert_eq!(strip_trailing_whitespace(""), "");
    }

    #[test]
    fn test_has_trailing_whitespace() {
        assert!(has_trailing_whitespace("a \n"));
        assert!(has_trailing_whitespace("a\nb\t"));
        assert!(!has_trailing_whitespace("a\r\nb\n"));
    }

    #[test]
    fn test_selection() {
        let text = "hello\nworld";
        let span = selection(text, Range::new(Position::new(1, 0), Position::new(1, 5)));
        assert_eq!(&text[span], "world");

        let reversed = selection(text, Range::new(Position::new(1, 5), Position::new(0, 0)));
        assert!(reversed.is_empty());
    }
}
