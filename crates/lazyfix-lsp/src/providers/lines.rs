//! "Sort selected lines".

use super::split_terminator;
use async_trait::async_trait;
use lazyfix_core::{
    ANY_LANGUAGE, ActionProvider, ChangeOperation, CodeAction, Document, LineIndex, Solution,
};
use tower_lsp_server::ls_types::{CodeActionKind, Range};

pub const PROVIDER_ID: &str = "lines";

pub struct SortLinesProvider;

#[async_trait]
impl ActionProvider for SortLinesProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn languages(&self) -> &[&'static str] {
        &[ANY_LANGUAGE]
    }

    async fn provide_actions(
        &self,
        _solution: &Solution,
        document: &Document,
        range: Range,
    ) -> Vec<CodeAction> {
        let Some(span) = selected_lines(document.text(), range) else {
            return vec![];
        };
        let block = &document.text()[span];
        if block.lines().count() < 2 || sort_block(block) == block {
            return vec![];
        }

        vec![CodeAction::leaf_fn(
            PROVIDER_ID,
            "Sort selected lines",
            Some(CodeActionKind::REFACTOR_REWRITE),
            |ctx| {
                let text = ctx.document.text();
                let Some(span) = selected_lines(text, ctx.range) else {
                    return Ok(vec![]);
                };
                let mut changed = String::with_capacity(text.len());
                changed.push_str(&text[..span.start]);
                changed.push_str(&sort_block(&text[span.clone()]));
                changed.push_str(&text[span.end..]);
                Ok(vec![ChangeOperation::apply_changes(
                    ctx.solution.with_document_text(ctx.document.uri(), changed),
                )])
            },
        )]
    }
}

/// Byte span of the whole lines touched by `range`, terminators included.
///
/// A selection ending at the start of a line does not include that line.
fn selected_lines(text: &str, range: Range) -> Option<std::ops::Range<usize>> {
    let index = LineIndex::new(text);
    let first = range.start.line as usize;
    let mut last = range.end.line as usize;
    if range.end.character == 0 && last > first {
        last -= 1;
    }
    if first > last {
        return None;
    }

    let start = index.line_start(first)?;
    let end = index.line_start(last + 1).unwrap_or(text.len());
    Some(start..end)
}

/// Sorts the lines of `block`; terminators stay at their positions so a
/// final line without one keeps lacking it.
fn sort_block(block: &str) -> String {
    let (mut contents, terminators): (Vec<_>, Vec<_>) =
        block.split_inclusive('\n').map(split_terminator).unzip();
    contents.sort_unstable();

    contents
        .into_iter()
        .zip(terminators)
        .flat_map(|(content, terminator)| [content, terminator])
        .collect()
}
