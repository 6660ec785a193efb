//! "Extract selection to new file".
//!
//! Adds a document, so it always resolves to the fallback command.

use super::selection;
use crate::config::file_name;
use async_trait::async_trait;
use lazyfix_core::{
    ANY_LANGUAGE, ActionContext, ActionProvider, ChangeOperation, CodeAction, Document,
    LazyfixError, Result, SideEffect, Solution,
};
use std::str::FromStr;
use thiserror::Error;
use tower_lsp_server::ls_types::{CodeActionKind, Range, Uri};

pub const PROVIDER_ID: &str = "extract";

const TITLE: &str = "Extract selection to new file";

#[derive(Debug, Error)]
#[error("cannot derive a file next to {0}")]
struct TargetUriError(String);

pub struct ExtractProvider;

#[async_trait]
impl ActionProvider for ExtractProvider {
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
        if document.text()[span].trim().is_empty() {
            return vec![];
        }

        vec![CodeAction::leaf_fn(
            PROVIDER_ID,
            TITLE,
            Some(CodeActionKind::REFACTOR_EXTRACT),
            extract_selection,
        )]
    }
}

fn extract_selection(ctx: &ActionContext) -> Result<Vec<ChangeOperation>> {
    let Some(project) = ctx.solution.project_of(ctx.document.uri()) else {
        return Err(LazyfixError::document_not_found(ctx.document.key()));
    };
    let target = target_uri(&ctx.solution, ctx.document.uri())?;

    let text = ctx.document.text();
    let span = selection(text, ctx.range);
    let extracted = Document::new(
        target.clone(),
        ctx.document.language_id(),
        &text[span.clone()],
    )
    .with_kind(ctx.document.kind());
    let remaining = format!("{}{}", &text[..span.start], &text[span.end..]);

    let changed = ctx
        .solution
        .with_document_text(ctx.document.uri(), remaining)
        .with_added_document(project.id(), extracted);

    Ok(vec![
        ChangeOperation::apply_changes(changed),
        ChangeOperation::Other(SideEffect::OpenDocument { uri: target }),
    ])
}

/// First free sibling of `source` named `<stem>.extracted[.<n>].<ext>`.
fn target_uri(solution: &Solution, source: &Uri) -> Result<Uri> {
    let source_str = source.as_str();
    let name = file_name(source);
    let path = source_str.split(['?', '#']).next().unwrap_or(source_str);
    let directory = &path[..path.len() - name.len()];
    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };

    for n in 1.. {
        let suffix = if n == 1 {
            "extracted".to_string()
        } else {
            format!("extracted.{n}")
        };
        let candidate = match extension {
            Some(ext) => format!("{directory}{stem}.{suffix}.{ext}"),
            None => format!("{directory}{stem}.{suffix}"),
        };
        let uri = Uri::from_str(&candidate)
            .map_err(|_| LazyfixError::computation(TITLE, TargetUriError(source_str.into())))?;
        if solution.document(&uri).is_none() {
            return Ok(uri);
        }
    }
    Err(LazyfixError::computation(TITLE, TargetUriError(source_str.into())))
}
