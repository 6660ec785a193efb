//! "Remove trailing whitespace in all open documents".
//!
//! Touches every document of the solution, so unless multi-document edits
//! are allowed it resolves to the fallback command.

use super::{has_trailing_whitespace, strip_trailing_whitespace};
use async_trait::async_trait;
use lazyfix_core::{
    ANY_LANGUAGE, ActionContext, ActionProvider, ChangeOperation, CodeAction, Document,
    LazyfixError, Result, Solution,
};
use tower_lsp_server::ls_types::{CodeActionKind, Range};

pub const PROVIDER_ID: &str = "workspace-whitespace";

pub struct WorkspaceWhitespaceProvider;

#[async_trait]
impl ActionProvider for WorkspaceWhitespaceProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn languages(&self) -> &[&'static str] {
        &[ANY_LANGUAGE]
    }

    async fn provide_actions(
        &self,
        solution: &Solution,
        document: &Document,
        _range: Range,
    ) -> Vec<CodeAction> {
        // Single-document cleanups are covered by the whitespace provider.
        let elsewhere = solution
            .documents()
            .filter(|d| d.key() != document.key())
            .any(|d| has_trailing_whitespace(d.text()));
        if !elsewhere {
            return vec![];
        }

        vec![CodeAction::leaf_fn(
            PROVIDER_ID,
            "Remove trailing whitespace in all open documents",
            Some(CodeActionKind::SOURCE),
            strip_all,
        )]
    }
}

fn strip_all(ctx: &ActionContext) -> Result<Vec<ChangeOperation>> {
    let mut changed = ctx.solution.clone();
    for document in ctx.solution.documents() {
        if ctx.cancellation.is_cancelled() {
            return Err(LazyfixError::Cancelled);
        }
        if has_trailing_whitespace(document.text()) {
            changed = changed
                .with_document_text(document.uri(), strip_trailing_whitespace(document.text()));
        }
    }
    Ok(vec![ChangeOperation::apply_changes(changed)])
}
