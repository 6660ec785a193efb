//! `workspace/executeCommand`: runs an action server-side and carries out
//! everything it produced.

use super::to_jsonrpc_error;
use crate::document::ServerState;
use lazyfix_core::{ExecutionPlan, Resolver, SideEffect};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::Client;
use tower_lsp_server::jsonrpc::Result;
use tower_lsp_server::ls_types::{ExecuteCommandParams, MessageType, ShowDocumentParams};

/// Computes the execution plan for a fallback command.
pub async fn plan_command(
    state: Arc<ServerState>,
    resolver: &Resolver,
    params: &ExecuteCommandParams,
    cancellation: &CancellationToken,
) -> Result<ExecutionPlan> {
    tracing::debug!("executeCommand request: {}", params.command);

    resolver
        .plan_command(
            state.as_ref(),
            &params.command,
            &params.arguments,
            cancellation,
        )
        .await
        .map_err(to_jsonrpc_error)
}

/// Applies `plan` through the client: the edit first, then side effects in
/// the order the action produced them.
pub async fn carry_out(client: &Client, plan: ExecutionPlan) {
    if let Some(edit) = plan.edit {
        match client.apply_edit(edit).await {
            Ok(response) if response.applied => {}
            Ok(response) => tracing::warn!(
                "client did not apply the edit: {}",
                response.failure_reason.as_deref().unwrap_or("no reason given")
            ),
            Err(e) => tracing::warn!("workspace/applyEdit failed: {}", e),
        }
    }

    for effect in plan.side_effects {
        match effect {
            SideEffect::OpenDocument { uri } => {
                let params = ShowDocumentParams {
                    uri,
                    external: Some(false),
                    take_focus: Some(true),
                    selection: None,
                };
                if let Err(e) = client.show_document(params).await {
                    tracing::warn!("window/showDocument failed: {}", e);
                }
            }
            SideEffect::ShowMessage { message } => {
                client.show_message(MessageType::INFO, message).await;
            }
        }
    }
}
