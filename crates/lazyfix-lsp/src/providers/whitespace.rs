//! "Remove trailing whitespace" for the current document.

use super::{has_trailing_whitespace, strip_trailing_whitespace};
use async_trait::async_trait;
use lazyfix_core::{ANY_LANGUAGE, ActionProvider, ChangeOperation, CodeAction, Document, Solution};
use tower_lsp_server::ls_types::{CodeActionKind, Range};

pub const PROVIDER_ID: &str = "whitespace";

pub struct WhitespaceProvider;

#[async_trait]
impl ActionProvider for WhitespaceProvider {
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
        _range: Range,
    ) -> Vec<CodeAction> {
        if !has_trailing_whitespace(document.text()) {
            return vec![];
        }

        vec![CodeAction::leaf_fn(
            PROVIDER_ID,
            "Remove trailing whitespace",
            Some(CodeActionKind::SOURCE_FIX_ALL),
            |ctx| {
                let text = strip_trailing_whitespace(ctx.document.text());
                Ok(vec![ChangeOperation::apply_changes(
                    ctx.solution.with_document_text(ctx.document.uri(), text),
                )])
            },
        )]
    }
}
