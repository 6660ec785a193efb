//! Code action model: references, action trees and change operations.

use crate::error::Result;
use crate::solution::{Document, Solution};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{CodeActionKind, Range, Uri};

/// Separator between the segments of an action identifier.
pub const IDENTIFIER_SEPARATOR: char = '|';

/// Opaque token carried in `CodeAction.data` between the list and resolve steps.
///
/// Everything needed to re-enumerate the candidate actions and pick the same
/// one again: the document, the requested range and the action identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionReference {
    pub uri: Uri,
    pub range: Range,
    pub unique_identifier: String,
}

impl ActionReference {
    pub fn new(uri: Uri, range: Range, unique_identifier: impl Into<String>) -> Self {
        Self {
            uri,
            range,
            unique_identifier: unique_identifier.into(),
        }
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Side effect an action may request besides changing documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// Open a document in the editor
    OpenDocument { uri: Uri },
    /// Show an informational message to the user
    ShowMessage { message: String },
}

/// One unit of effect produced by running an action.
#[derive(Debug, Clone)]
pub enum ChangeOperation {
    /// Replace the current solution with `changed_solution`
    ApplyChanges { changed_solution: Solution },
    /// Anything that is not a document change
    Other(SideEffect),
}

impl ChangeOperation {
    pub fn apply_changes(changed_solution: Solution) -> Self {
        Self::ApplyChanges { changed_solution }
    }

    pub fn is_apply_changes(&self) -> bool {
        matches!(self, Self::ApplyChanges { .. })
    }
}

/// Everything an action sees when computing its operations.
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub solution: Solution,
    pub document: Document,
    pub range: Range,
    pub cancellation: CancellationToken,
}

/// Lazily computes the operations of a leaf action.
///
/// Only called on resolve and command execution, never while listing.
#[async_trait]
pub trait OperationSource: Send + Sync {
    async fn compute_operations(&self, context: &ActionContext) -> Result<Vec<ChangeOperation>>;
}

/// [`OperationSource`] backed by a synchronous closure.
pub struct FnOperationSource<F>(F);

#[async_trait]
impl<F> OperationSource for FnOperationSource<F>
where
    F: Fn(&ActionContext) -> Result<Vec<ChangeOperation>> + Send + Sync,
{
    async fn compute_operations(&self, context: &ActionContext) -> Result<Vec<ChangeOperation>> {
        (self.0)(context)
    }
}

/// Action with its own change computation.
#[derive(Clone)]
pub struct LeafAction {
    title: String,
    identifier: String,
    kind: Option<CodeActionKind>,
    source: Arc<dyn OperationSource>,
}

impl LeafAction {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn kind(&self) -> Option<&CodeActionKind> {
        self.kind.as_ref()
    }

    pub async fn compute_operations(
        &self,
        context: &ActionContext,
    ) -> Result<Vec<ChangeOperation>> {
        self.source.compute_operations(context).await
    }
}

impl fmt::Debug for LeafAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafAction")
            .field("title", &self.title)
            .field("identifier", &self.identifier)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Action that only groups nested actions.
#[derive(Debug, Clone)]
pub struct ActionGroup {
    title: String,
    identifier: String,
    children: Vec<CodeAction>,
}

impl ActionGroup {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn children(&self) -> &[CodeAction] {
        &self.children
    }
}

/// A candidate code action: either a leaf or a group of nested actions.
///
/// Identifiers are `provider|title` for top-level actions and
/// `parent identifier|title` for nested ones, so they are stable across
/// re-enumeration and unique within one candidate list as long as sibling
/// titles are.
#[derive(Debug, Clone)]
pub enum CodeAction {
    Leaf(LeafAction),
    Group(ActionGroup),
}

impl CodeAction {
    pub fn leaf(
        provider: &str,
        title: impl Into<String>,
        kind: Option<CodeActionKind>,
        source: Arc<dyn OperationSource>,
    ) -> Self {
        let title = title.into();
        Self::Leaf(LeafAction {
            identifier: join_identifier(provider, &title),
            title,
            kind,
            source,
        })
    }

    /// Leaf action whose operations come from a synchronous closure.
    pub fn leaf_fn<F>(
        provider: &str,
        title: impl Into<String>,
        kind: Option<CodeActionKind>,
        compute: F,
    ) -> Self
    where
        F: Fn(&ActionContext) -> Result<Vec<ChangeOperation>> + Send + Sync + 'static,
    {
        Self::leaf(provider, title, kind, Arc::new(FnOperationSource(compute)))
    }

    /// Groups `children` under a new parent, re-deriving their identifiers
    /// from the parent's.
    pub fn group(provider: &str, title: impl Into<String>, children: Vec<Self>) -> Self {
        let title = title.into();
        let identifier = join_identifier(provider, &title);
        let children = children
            .into_iter()
            .map(|child| child.reparented(&identifier))
            .collect();
        Self::Group(ActionGroup {
            title,
            identifier,
            children,
        })
    }

    fn reparented(self, parent: &str) -> Self {
        match self {
            Self::Leaf(mut leaf) => {
                leaf.identifier = join_identifier(parent, &leaf.title);
                Self::Leaf(leaf)
            }
            Self::Group(group) => {
                let identifier = join_identifier(parent, &group.title);
                let children = group
                    .children
                    .into_iter()
                    .map(|child| child.reparented(&identifier))
                    .collect();
                Self::Group(ActionGroup {
                    title: group.title,
                    identifier,
                    children,
                })
            }
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Leaf(leaf) => &leaf.title,
            Self::Group(group) => &group.title,
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            Self::Leaf(leaf) => &leaf.identifier,
            Self::Group(group) => &group.identifier,
        }
    }

    pub fn children(&self) -> &[Self] {
        match self {
            Self::Leaf(_) => &[],
            Self::Group(group) => &group.children,
        }
    }
}

fn join_identifier(parent: &str, title: &str) -> String {
    format!("{parent}{IDENTIFIER_SEPARATOR}{title}")
}
