//! Request handlers.
//!
//! Listing degrades to an empty response when nothing can be offered.
//! Resolve and command execution answer a reference this server issued, so
//! their failures surface as JSON-RPC errors.

pub mod code_action_resolve;
pub mod code_actions;
pub mod execute_command;

use lazyfix_core::LazyfixError;
use tower_lsp_server::jsonrpc::{Error, ErrorCode};

/// Maps a pipeline failure to the JSON-RPC error reported to the client.
pub fn to_jsonrpc_error(error: LazyfixError) -> Error {
    let code = match &error {
        LazyfixError::Cancelled => ErrorCode::RequestCancelled,
        e if e.is_contract_violation() => ErrorCode::InvalidParams,
        _ => ErrorCode::InternalError,
    };
    if code == ErrorCode::InternalError {
        tracing::error!("code action failed: {}", error);
    } else {
        tracing::debug!("rejecting request: {}", error);
    }
    Error {
        code,
        message: error.to_string().into(),
        data: None,
    }
}
