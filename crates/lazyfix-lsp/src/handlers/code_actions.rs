//! `textDocument/codeAction`: the list step.

use crate::document::ServerState;
use lazyfix_core::{LazyfixError, Resolver};
use std::sync::Arc;
use tower_lsp_server::ls_types::{
    CodeAction, CodeActionKind, CodeActionOrCommand, CodeActionParams,
};

/// Lists the code actions for the requested range, without computing edits.
///
/// Gracefully degrades by returning an empty vec when the document is not
/// open or no provider handles its language.
pub async fn handle_code_actions(
    state: Arc<ServerState>,
    resolver: &Resolver,
    params: CodeActionParams,
) -> Vec<CodeActionOrCommand> {
    let uri = &params.text_document.uri;
    let range = params.range;

    tracing::debug!(
        "code_action request: uri={}, range={}:{}-{}:{}",
        uri.as_str(),
        range.start.line,
        range.start.character,
        range.end.line,
        range.end.character
    );

    let actions = match resolver.code_actions(state.as_ref(), uri, range).await {
        Ok(actions) => actions,
        Err(e @ (LazyfixError::DocumentNotFound { .. } | LazyfixError::UnsupportedLanguage { .. })) => {
            tracing::debug!("no code actions: {}", e);
            return vec![];
        }
        Err(e) => {
            tracing::warn!("failed to list code actions for {}: {}", uri.as_str(), e);
            return vec![];
        }
    };

    let only = params.context.only.as_deref();
    actions
        .into_iter()
        .filter(|action| matches_only(action, only))
        .map(CodeActionOrCommand::CodeAction)
        .collect()
}

/// True if `action` belongs to one of the requested kinds.
///
/// A kind matches itself and its dotted sub-kinds. Actions without a kind
/// are dropped once a filter is given.
fn matches_only(action: &CodeAction, only: Option<&[CodeActionKind]>) -> bool {
    let Some(only) = only else {
        return true;
    };
    let Some(kind) = action.kind.as_ref() else {
        return false;
    };
    only.iter().any(|requested| {
        let requested = requested.as_str();
        kind.as_str() == requested
            || kind
                .as_str()
                .strip_prefix(requested)
                .is_some_and(|rest| rest.starts_with('.'))
    })
}
