//! Re-locating a previously advertised action from its reference.

use crate::action::{ActionReference, CodeAction, LeafAction};
use crate::error::{LazyfixError, Result};
use crate::provider::ProviderRegistry;
use crate::solution::{Document, SnapshotAccessor, Solution};

/// The action a reference points at, together with the snapshot it was
/// found in.
#[derive(Debug, Clone)]
pub struct LocatedAction {
    pub action: CodeAction,
    pub solution: Solution,
    pub document: Document,
}

/// Re-enumerates the candidates for the referenced document and range and
/// returns the one carrying the referenced identifier.
///
/// # Errors
///
/// All failures are contract violations: the reference was issued by this
/// server, so a missing document, an unsupported language or an unknown
/// identifier means the reference is stale or forged.
pub async fn locate_action(
    registry: &ProviderRegistry,
    accessor: &dyn SnapshotAccessor,
    reference: &ActionReference,
) -> Result<LocatedAction> {
    let solution = accessor.current_solution();
    let Some(document) = solution.document(&reference.uri).cloned() else {
        tracing::warn!("code action reference names unknown document {}", reference.uri.as_str());
        return Err(LazyfixError::document_not_found(reference.uri.as_str()));
    };

    let candidates = registry
        .candidates(&solution, &document, reference.range)
        .await?;

    let Some(action) = find_action(&candidates, &reference.unique_identifier) else {
        tracing::warn!(
            "no code action '{}' among {} candidates for {}",
            reference.unique_identifier,
            candidates.len(),
            document.key()
        );
        return Err(LazyfixError::action_not_found(
            document.key(),
            &reference.unique_identifier,
        ));
    };

    Ok(LocatedAction {
        action: action.clone(),
        solution,
        document,
    })
}

/// Depth-first search for `identifier`, visiting actions in declaration order
/// and each group before its children.
pub fn find_action<'a>(actions: &'a [CodeAction], identifier: &str) -> Option<&'a CodeAction> {
    let mut stack: Vec<(&'a [CodeAction], usize)> = vec![(actions, 0)];

    while let Some((level, index)) = stack.pop() {
        let Some(action) = level.get(index) else {
            continue;
        };
        if action.identifier() == identifier {
            return Some(action);
        }
        stack.push((level, index + 1));
        let children = action.children();
        if !children.is_empty() {
            stack.push((children, 0));
        }
    }

    None
}

/// A leaf as advertised by the list step, with the titles of its ancestors
/// folded into the display title.
#[derive(Debug, Clone)]
pub struct FlattenedAction<'a> {
    pub title: String,
    pub leaf: &'a LeafAction,
}

/// Flattens an action tree into its leaves, depth-first in declaration order.
///
/// Nested leaves are titled `"<parent>: <child>"`.
pub fn flatten_actions(actions: &[CodeAction]) -> Vec<FlattenedAction<'_>> {
    let mut leaves = Vec::new();
    let mut stack: Vec<(&[CodeAction], usize, Option<String>)> = vec![(actions, 0, None)];

    while let Some((level, index, prefix)) = stack.pop() {
        let Some(action) = level.get(index) else {
            continue;
        };
        let title = match &prefix {
            Some(prefix) => format!("{prefix}: {}", action.title()),
            None => action.title().to_string(),
        };
        stack.push((level, index + 1, prefix));

        match action {
            CodeAction::Leaf(leaf) => leaves.push(FlattenedAction { title, leaf }),
            CodeAction::Group(group) => stack.push((group.children(), 0, Some(title))),
        }
    }

    leaves
}
