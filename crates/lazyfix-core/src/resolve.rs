//! The resolve pipeline: locate, execute, classify, diff and aggregate.
//!
//! Also hosts the list step, since advertising and resolving must agree on
//! the candidate enumeration and on the encoding of `data`.

use crate::action::ActionReference;
use crate::classifier::{Classification, ResolveOptions, classify};
use crate::differ::diff_document;
use crate::error::{LazyfixError, Result};
use crate::executor::execute_action;
use crate::locator::{flatten_actions, locate_action};
use crate::provider::ProviderRegistry;
use crate::solution::SnapshotAccessor;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{
    CodeAction as LspCodeAction, Command, DocumentChanges, OneOf,
    OptionalVersionedTextDocumentIdentifier, Range, TextDocumentEdit, TextEdit, Uri,
    WorkspaceEdit,
};

/// Command the client runs when a result cannot be expressed as an edit.
pub const RUN_CODE_ACTION_COMMAND: &str = "lazyfix.runCodeAction";

/// Text edits for one document, against its pre-action content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEdits {
    pub document: OptionalVersionedTextDocumentIdentifier,
    pub edits: Vec<TextEdit>,
}

/// Outcome of resolving one code action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionResult {
    /// The action performed no transformation
    Unchanged,
    /// Per-document edits, ordered by document URI
    Edit(Vec<DocumentEdits>),
    /// Server-side re-run of the action
    Command(Command),
}

impl ResolutionResult {
    /// Augments `action` with the edit or command this result carries.
    pub fn apply_to(self, mut action: LspCodeAction) -> LspCodeAction {
        match self {
            Self::Unchanged => {}
            Self::Edit(documents) => {
                let edits = documents
                    .into_iter()
                    .map(|d| TextDocumentEdit {
                        text_document: d.document,
                        edits: d.edits.into_iter().map(OneOf::Left).collect(),
                    })
                    .collect();
                action.edit = Some(WorkspaceEdit {
                    changes: None,
                    document_changes: Some(DocumentChanges::Edits(edits)),
                    change_annotations: None,
                });
            }
            Self::Command(command) => action.command = Some(command),
        }
        action
    }
}

/// Packages a classification into a result.
///
/// For an edit, every listed document is diffed and documents whose diff is
/// empty are dropped. For a command, `data` is passed through verbatim as
/// the only argument.
pub fn aggregate(classification: Classification, title: &str, data: &Value) -> ResolutionResult {
    match classification {
        Classification::Command(_) => ResolutionResult::Command(Command {
            title: title.to_string(),
            command: RUN_CODE_ACTION_COMMAND.to_string(),
            arguments: Some(vec![data.clone()]),
        }),
        Classification::Edit(changes) => {
            let documents = changes
                .iter()
                .filter_map(|change| {
                    let edits = diff_document(change);
                    if edits.is_empty() {
                        return None;
                    }
                    Some(DocumentEdits {
                        document: OptionalVersionedTextDocumentIdentifier {
                            uri: change.uri().clone(),
                            version: change.old.version(),
                        },
                        edits,
                    })
                })
                .collect();
            ResolutionResult::Edit(documents)
        }
    }
}

/// Lists and resolves code actions against a provider registry.
#[derive(Debug, Clone)]
pub struct Resolver {
    registry: Arc<ProviderRegistry>,
    options: ResolveOptions,
}

impl Resolver {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            options: ResolveOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> ResolveOptions {
        self.options
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// The list step: advertises every leaf candidate for `uri` and `range`
    /// with only a title, a kind and the encoded [`ActionReference`].
    ///
    /// # Errors
    ///
    /// `DocumentNotFound` and `UnsupportedLanguage` as for resolution; the
    /// caller decides whether they are worth reporting while listing.
    pub async fn code_actions(
        &self,
        accessor: &dyn SnapshotAccessor,
        uri: &Uri,
        range: Range,
    ) -> Result<Vec<LspCodeAction>> {
        let solution = accessor.current_solution();
        let document = solution
            .document(uri)
            .ok_or_else(|| LazyfixError::document_not_found(uri.as_str()))?;

        let candidates = self.registry.candidates(&solution, document, range).await?;
        let mut actions = Vec::new();
        for flattened in flatten_actions(&candidates) {
            let reference = ActionReference::new(uri.clone(), range, flattened.leaf.identifier());
            actions.push(LspCodeAction {
                title: flattened.title,
                kind: flattened.leaf.kind().cloned(),
                data: Some(reference.to_value()?),
                ..LspCodeAction::default()
            });
        }

        tracing::debug!("listed {} code action(s) for {}", actions.len(), uri.as_str());
        Ok(actions)
    }

    /// Resolves the action referenced by `data`.
    ///
    /// # Errors
    ///
    /// Contract violations when `data` is malformed or stale, `Cancelled`
    /// when `cancellation` fires first, and whatever the action's computation
    /// fails with.
    pub async fn resolve(
        &self,
        accessor: &dyn SnapshotAccessor,
        title: &str,
        data: &Value,
        cancellation: &CancellationToken,
    ) -> Result<ResolutionResult> {
        let reference = ActionReference::from_value(data.clone())?;
        let located = locate_action(&self.registry, accessor, &reference).await?;
        let operations = execute_action(&located, reference.range, cancellation).await?;

        if operations.is_empty() {
            tracing::debug!("'{}' produced no operations", title);
            return Ok(ResolutionResult::Unchanged);
        }

        let classification = classify(
            &operations,
            &located.solution,
            &reference.uri,
            self.options,
        );
        match &classification {
            Classification::Command(reason) => {
                tracing::debug!("'{}' resolved to a command: {}", title, reason);
            }
            Classification::Edit(changes) => {
                tracing::debug!("'{}' resolved to edits in {} document(s)", title, changes.len());
            }
        }

        Ok(aggregate(classification, title, data))
    }

    /// Resolves a client-supplied code action in place.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the action carries no `data`, otherwise as
    /// [`Resolver::resolve`].
    pub async fn resolve_code_action(
        &self,
        accessor: &dyn SnapshotAccessor,
        action: LspCodeAction,
        cancellation: &CancellationToken,
    ) -> Result<LspCodeAction> {
        let Some(data) = action.data.as_ref() else {
            return Err(LazyfixError::invalid_argument(format!(
                "code action '{}' carries no data",
                action.title
            )));
        };
        let result = self.resolve(accessor, &action.title, data, cancellation).await?;
        Ok(result.apply_to(action))
    }
}
