//! "Change case" group over the selected text.

use super::selection;
use async_trait::async_trait;
use lazyfix_core::{
    ANY_LANGUAGE, ActionContext, ActionProvider, ChangeOperation, CodeAction, Document, Result,
    Solution,
};
use tower_lsp_server::ls_types::{CodeActionKind, Range};

pub const PROVIDER_ID: &str = "case";

pub struct CaseProvider;

#[async_trait]
impl ActionProvider for CaseProvider {
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
        let span = selection(document.text(), range);
        let selected = &document.text()[span];
        if !selected.chars().any(char::is_alphabetic) {
            return vec![];
        }

        let mut children = Vec::new();
        if selected != selected.to_uppercase() {
            children.push(CodeAction::leaf_fn(
                PROVIDER_ID,
                "To upper case",
                Some(CodeActionKind::REFACTOR_REWRITE),
                |ctx| replace_selection(ctx, str::to_uppercase),
            ));
        }
        if selected != selected.to_lowercase() {
            children.push(CodeAction::leaf_fn(
                PROVIDER_ID,
                "To lower case",
                Some(CodeActionKind::REFACTOR_REWRITE),
                |ctx| replace_selection(ctx, str::to_lowercase),
            ));
        }
        if children.is_empty() {
            return vec![];
        }

        vec![CodeAction::group(PROVIDER_ID, "Change case", children)]
    }
}

fn replace_selection(
    ctx: &ActionContext,
    convert: fn(&str) -> String,
) -> Result<Vec<ChangeOperation>> {
    let text = ctx.document.text();
    let span = selection(text, ctx.range);
    let mut changed = String::with_capacity(text.len());
    changed.push_str(&text[..span.start]);
    changed.push_str(&convert(&text[span.clone()]));
    changed.push_str(&text[span.end..]);

    Ok(vec![ChangeOperation::apply_changes(
        ctx.solution.with_document_text(ctx.document.uri(), changed),
    )])
}
