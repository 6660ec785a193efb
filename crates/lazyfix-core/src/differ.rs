//! Minimal text edits between two snapshots of a document.
//!
//! The diff runs in two passes: a line diff finds the changed hunks, then a
//! character diff inside each hunk narrows them down. Change regions closer
//! than [`MIN_EQUAL_RUN`] bytes are coalesced into one edit so a heavily
//! rewritten region does not turn into one edit per character.

use crate::solution::DocumentChange;
use crate::text::LineIndex;
use similar::{Algorithm, DiffOp, DiffTag, TextDiff};
use std::ops::Range as ByteRange;
use tower_lsp_server::ls_types::TextEdit;

/// Equal runs shorter than this are absorbed into the surrounding edits.
pub const MIN_EQUAL_RUN: usize = 3;

/// Hunks larger than this (old + new bytes) are not refined below line level.
pub const MAX_REFINE_BYTES: usize = 64 * 1024;

/// A replacement of `old` bytes in the old text by `new` bytes of the new text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Span {
    old: ByteRange<usize>,
    new: ByteRange<usize>,
}

/// Computes edits turning `old` into `new`.
///
/// Edits are ordered, non-overlapping and expressed in `old` coordinates.
/// Identical texts produce no edits.
pub fn diff_text(old: &str, new: &str) -> Vec<TextEdit> {
    if old == new {
        return Vec::new();
    }

    let mut spans = coalesce(line_hunks(old, new), old, new);
    if !reproduces(&spans, old, new) {
        tracing::warn!(
            "diff of {} -> {} bytes did not reproduce the new text, using a single edit",
            old.len(),
            new.len()
        );
        spans = coalesce(vec![trimmed_span(old, new)], old, new);
    }
    let index = LineIndex::new(old);

    spans
        .into_iter()
        .map(|span| TextEdit {
            range: index.range(span.old.start, span.old.end),
            new_text: new[span.new].to_string(),
        })
        .collect()
}

/// Computes edits for one changed document.
pub fn diff_document(change: &DocumentChange) -> Vec<TextEdit> {
    diff_text(change.old.text(), change.new.text())
}

fn prefix_offsets(slices: &[&str]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(slices.len() + 1);
    let mut offset = 0;
    offsets.push(0);
    for slice in slices {
        offset += slice.len();
        offsets.push(offset);
    }
    offsets
}

/// Yields every op of `ops` as `(tag, old, new)` slice-index ranges.
///
/// Ranges are rebuilt from running cursors and the op lengths, so they are
/// contiguous and in order on both sides even when an op reports a stale
/// index on the side it does not touch.
fn contiguous_ops(
    ops: &[DiffOp],
) -> impl Iterator<Item = (DiffTag, ByteRange<usize>, ByteRange<usize>)> + '_ {
    let mut old_cursor = 0;
    let mut new_cursor = 0;
    ops.iter().map(move |op| {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        let old = old_cursor..old_cursor + old_range.len();
        let new = new_cursor..new_cursor + new_range.len();
        old_cursor = old.end;
        new_cursor = new.end;
        (tag, old, new)
    })
}

/// Line-level hunks, each refined to character level when small enough.
fn line_hunks(old: &str, new: &str) -> Vec<Span> {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(old, new);
    let old_offsets = prefix_offsets(diff.old_slices());
    let new_offsets = prefix_offsets(diff.new_slices());

    let mut spans = Vec::new();
    let mut pending: Option<Span> = None;

    for (tag, old_lines, new_lines) in contiguous_ops(diff.ops()) {
        let (Some(&old_start), Some(&old_end), Some(&new_start), Some(&new_end)) = (
            old_offsets.get(old_lines.start),
            old_offsets.get(old_lines.end),
            new_offsets.get(new_lines.start),
            new_offsets.get(new_lines.end),
        ) else {
            break;
        };

        if tag == DiffTag::Equal {
            if let Some(hunk) = pending.take() {
                refine(&hunk, old, new, &mut spans);
            }
            continue;
        }

        pending = Some(match pending.take() {
            Some(hunk) => Span {
                old: hunk.old.start..old_end,
                new: hunk.new.start..new_end,
            },
            None => Span {
                old: old_start..old_end,
                new: new_start..new_end,
            },
        });
    }

    if let Some(hunk) = pending {
        refine(&hunk, old, new, &mut spans);
    }

    spans
}

/// Character-level spans inside a line hunk.
fn refine(hunk: &Span, old: &str, new: &str, out: &mut Vec<Span>) {
    let old_part = &old[hunk.old.clone()];
    let new_part = &new[hunk.new.clone()];

    if old_part.len() + new_part.len() > MAX_REFINE_BYTES
        || old_part.is_empty()
        || new_part.is_empty()
    {
        out.push(hunk.clone());
        return;
    }

    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_chars(old_part, new_part);
    let old_offsets = prefix_offsets(diff.old_slices());
    let new_offsets = prefix_offsets(diff.new_slices());

    let mut refined = Vec::new();
    for (tag, old_chars, new_chars) in contiguous_ops(diff.ops()) {
        if tag == DiffTag::Equal {
            continue;
        }
        let (Some(&old_start), Some(&old_end), Some(&new_start), Some(&new_end)) = (
            old_offsets.get(old_chars.start),
            old_offsets.get(old_chars.end),
            new_offsets.get(new_chars.start),
            new_offsets.get(new_chars.end),
        ) else {
            out.push(hunk.clone());
            return;
        };
        refined.push(Span {
            old: hunk.old.start + old_start..hunk.old.start + old_end,
            new: hunk.new.start + new_start..hunk.new.start + new_end,
        });
    }
    out.extend(refined);
}

/// Merges spans separated by short equal runs and keeps `\r\n` pairs whole.
fn coalesce(spans: Vec<Span>, old: &str, new: &str) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());

    for span in spans {
        if let Some(last) = merged.last_mut()
            && span.old.start.saturating_sub(last.old.end) < MIN_EQUAL_RUN
        {
            last.old.end = last.old.end.max(span.old.end);
            last.new.end = last.new.end.max(span.new.end);
            continue;
        }
        merged.push(span);
    }

    let old_bytes = old.as_bytes();
    let new_bytes = new.as_bytes();
    // Text around a span is equal on both sides, so widening by the
    // neighbouring byte keeps old and new in step.
    for span in &mut merged {
        if (splits_crlf(old_bytes, span.old.start) || splits_crlf(new_bytes, span.new.start))
            && span.old.start > 0
            && span.new.start > 0
        {
            span.old.start -= 1;
            span.new.start -= 1;
        }
        if (splits_crlf(old_bytes, span.old.end) || splits_crlf(new_bytes, span.new.end))
            && span.old.end < old_bytes.len()
            && span.new.end < new_bytes.len()
        {
            span.old.end += 1;
            span.new.end += 1;
        }
    }

    merged
}

/// True if `offset` sits between a `\r` and the `\n` following it.
fn splits_crlf(bytes: &[u8], offset: usize) -> bool {
    offset > 0 && offset < bytes.len() && bytes[offset - 1] == b'\r' && bytes[offset] == b'\n'
}

/// True if splicing `spans` into `old` yields exactly `new`, with every span
/// in order, on char boundaries and clear of `\r\n` pairs.
fn reproduces(spans: &[Span], old: &str, new: &str) -> bool {
    let mut rebuilt = String::with_capacity(new.len());
    let mut cursor = 0;
    for span in spans {
        if span.old.start < cursor
            || splits_crlf(old.as_bytes(), span.old.start)
            || splits_crlf(old.as_bytes(), span.old.end)
        {
            return false;
        }
        let (Some(kept), Some(_), Some(inserted)) = (
            old.get(cursor..span.old.start),
            old.get(span.old.clone()),
            new.get(span.new.clone()),
        ) else {
            return false;
        };
        rebuilt.push_str(kept);
        rebuilt.push_str(inserted);
        cursor = span.old.end;
    }
    match old.get(cursor..) {
        Some(rest) => rebuilt.push_str(rest),
        None => return false,
    }
    rebuilt == new
}

/// One span covering everything between the common prefix and suffix.
fn trimmed_span(old: &str, new: &str) -> Span {
    let mut prefix = old
        .bytes()
        .zip(new.bytes())
        .take_while(|(a, b)| a == b)
        .count();
    while !old.is_char_boundary(prefix) || !new.is_char_boundary(prefix) {
        prefix -= 1;
    }

    let max_suffix = old.len().min(new.len()) - prefix;
    let mut suffix = old
        .bytes()
        .rev()
        .zip(new.bytes().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();
    while !old.is_char_boundary(old.len() - suffix) || !new.is_char_boundary(new.len() - suffix) {
        suffix -= 1;
    }

    Span {
        old: prefix..old.len() - suffix,
        new: prefix..new.len() - suffix,
    }
}
