//! `codeAction/resolve`: computes the edit, or the fallback command, for an
//! action returned by the list step.

use super::to_jsonrpc_error;
use crate::document::ServerState;
use lazyfix_core::Resolver;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::jsonrpc::Result;
use tower_lsp_server::ls_types::CodeAction;

pub async fn handle_code_action_resolve(
    state: Arc<ServerState>,
    resolver: &Resolver,
    action: CodeAction,
    cancellation: &CancellationToken,
) -> Result<CodeAction> {
    tracing::debug!("codeAction/resolve request: {}", action.title);

    resolver
        .resolve_code_action(state.as_ref(), action, cancellation)
        .await
        .map_err(to_jsonrpc_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::default_registry;
    use lazyfix_core::{Document, RUN_CODE_ACTION_COMMAND};
    use std::str::FromStr;
    use tower_lsp_server::jsonrpc::ErrorCode;
    use tower_lsp_server::ls_types::{Position, Range, Uri};

    fn setup() -> (Arc<ServerState>, Resolver, Uri) {
        let uri = Uri::from_str("file:///ws/main.rs").unwrap();
        let state = Arc::new(ServerState::new());
        state.open_document(Document::new(uri.clone(), "rust", "let x = 1;  \n").with_version(3));
        (state, Resolver::new(Arc::new(default_registry())), uri)
    }

    async fn listed(state: &ServerState, resolver: &Resolver, uri: &Uri, title: &str) -> CodeAction {
        let range = Range::new(Position::new(0, 4), Position::new(0, 5));
        resolver
            .code_actions(state, uri, range)
            .await
            .unwrap()
            .into_iter()
            .find(|a| a.title == title)
            .unwrap()
    }

    #[tokio::test]
    async fn test_resolves_edit_with_version() {
        let (state, resolver, uri) = setup();
        let action = listed(&state, &resolver, &uri, "Remove trailing whitespace").await;

        let resolved =
            handle_code_action_resolve(state, &resolver, action, &CancellationToken::new())
                .await
                .unwrap();

        let edit = resolved.edit.expect("resolved edit");
        let json = serde_json::to_value(&edit).unwrap();
        assert_eq!(json["documentChanges"][0]["textDocument"]["version"], 3);
        assert_eq!(json["documentChanges"][0]["edits"][0]["newText"], "");
    }

    #[tokio::test]
    async fn test_resolves_command_for_new_file() {
        let (state, resolver, uri) = setup();
        let action = listed(&state, &resolver, &uri, "Extract selection to new file").await;

        let resolved =
            handle_code_action_resolve(state, &resolver, action, &CancellationToken::new())
                .await
                .unwrap();

        assert!(resolved.edit.is_none());
        assert_eq!(resolved.command.unwrap().command, RUN_CODE_ACTION_COMMAND);
    }

    #[tokio::test]
    async fn test_closed_document_is_invalid_params() {
        let (state, resolver, uri) = setup();
        let action = listed(&state, &resolver, &uri, "Remove trailing whitespace").await;
        state.close_document(&uri);

        let error =
            handle_code_action_resolve(state, &resolver, action, &CancellationToken::new())
                .await
                .unwrap_err();
        assert_eq!(error.code, ErrorCode::InvalidParams);
    }

    #[tokio::test]
    async fn test_missing_data_is_invalid_params() {
        let (state, resolver, _) = setup();
        let action = CodeAction {
            title: "Remove trailing whitespace".into(),
            ..Default::default()
        };

        let error =
            handle_code_action_resolve(state, &resolver, action, &CancellationToken::new())
                .await
                .unwrap_err();
        assert_eq!(error.code, ErrorCode::InvalidParams);
    }

    #[tokio::test]
    async fn test_cancelled_request() {
        let (state, resolver, uri) = setup();
        let action = listed(&state, &resolver, &uri, "Remove trailing whitespace").await;
        let token = CancellationToken::new();
        token.cancel();

        let error = handle_code_action_resolve(state, &resolver, action, &token)
            .await
            .unwrap_err();
        assert_eq!(error.code, ErrorCode::RequestCancelled);
    }
}
