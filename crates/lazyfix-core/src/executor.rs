//! Running a located action to obtain its change operations.

use crate::action::{ActionContext, ChangeOperation, CodeAction};
use crate::error::{LazyfixError, Result};
use crate::locator::LocatedAction;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::Range;

/// Computes the operations of a located action.
///
/// Groups have no computation of their own and yield no operations.
/// Cancellation aborts the computation at its next await point and is
/// reported as [`LazyfixError::Cancelled`]; nothing computed so far escapes.
pub async fn execute_action(
    located: &LocatedAction,
    range: Range,
    cancellation: &CancellationToken,
) -> Result<Vec<ChangeOperation>> {
    let CodeAction::Leaf(leaf) = &located.action else {
        tracing::debug!("'{}' is a group, nothing to compute", located.action.title());
        return Ok(Vec::new());
    };

    if cancellation.is_cancelled() {
        return Err(LazyfixError::Cancelled);
    }

    let context = ActionContext {
        solution: located.solution.clone(),
        document: located.document.clone(),
        range,
        cancellation: cancellation.clone(),
    };

    let operations = tokio::select! {
        biased;
        () = cancellation.cancelled() => return Err(LazyfixError::Cancelled),
        result = leaf.compute_operations(&context) => result?,
    };

    if cancellation.is_cancelled() {
        return Err(LazyfixError::Cancelled);
    }

    tracing::debug!(
        "'{}' produced {} operation(s)",
        leaf.title(),
        operations.len()
    );
    Ok(operations)
}
