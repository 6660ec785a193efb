//! Property tests for the text differ.
//!
//! Inputs mix LF, CRLF and lone CR line breaks with multibyte and astral
//! characters so that line and character refinement both get exercised.

use lazyfix_core::{apply_text_edits, diff_text};
use proptest::prelude::*;

const PIECES: &[&str] = &["a", "b", "x", " ", "\n", "\r\n", "\r", "é", "😀"];

fn text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(PIECES), 0..40).prop_map(|pieces| pieces.concat())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn edits_reproduce_new_text(old in text(), new in text()) {
        let edits = diff_text(&old, &new);
        prop_assert_eq!(apply_text_edits(&old, &edits), new);
    }

    #[test]
    fn edits_are_ordered_and_disjoint(old in text(), new in text()) {
        let edits = diff_text(&old, &new);
        for edit in &edits {
            let range = edit.range;
            prop_assert!(
                (range.start.line, range.start.character) <= (range.end.line, range.end.character)
            );
        }
        for pair in edits.windows(2) {
            let (a, b) = (pair[0].range, pair[1].range);
            prop_assert!(
                (a.end.line, a.end.character) <= (b.start.line, b.start.character),
                "edits out of order: {:?}",
                edits
            );
        }
    }

    #[test]
    fn identical_text_has_no_edits(text in text()) {
        prop_assert!(diff_text(&text, &text).is_empty());
    }
}
