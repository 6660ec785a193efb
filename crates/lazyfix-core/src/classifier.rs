//! Deciding whether an action's operations fit in a workspace edit.
//!
//! Rules, first match wins:
//!
//! 1. any operation other than `ApplyChanges` → command
//! 2. any added or removed document → command
//! 3. any changed document other than the originating one, or any changed
//!    additional / analyzer-config document → command, unless
//!    [`ResolveOptions::allow_multi_document_edits`] is set
//! 4. two `ApplyChanges` operations changing the same document → command
//! 5. otherwise → edit
//!
//! The command path re-runs the action on the server and can represent
//! everything, so whenever a rule fails the whole result becomes a command.

use crate::action::ChangeOperation;
use crate::solution::{DocumentChange, DocumentKind, Solution};
use std::collections::BTreeMap;
use std::fmt;
use tower_lsp_server::ls_types::Uri;

/// Resolution policy knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Emit edits for documents other than the originating one, including
    /// additional and analyzer-config documents.
    pub allow_multi_document_edits: bool,
}

/// Why a result had to fall back to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandReason {
    NonEditOperation,
    AddedDocuments,
    RemovedDocuments,
    CrossDocumentChanges,
    SecondaryDocumentChanges,
    OverlappingOperations,
}

impl fmt::Display for CommandReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NonEditOperation => "operation is not a document change",
            Self::AddedDocuments => "documents are added",
            Self::RemovedDocuments => "documents are removed",
            Self::CrossDocumentChanges => "other documents are changed",
            Self::SecondaryDocumentChanges => "additional or analyzer-config documents are changed",
            Self::OverlappingOperations => "several operations change the same document",
        };
        f.write_str(text)
    }
}

/// Outcome of classification.
#[derive(Debug, Clone)]
pub enum Classification {
    /// Fall back to the server-side command
    Command(CommandReason),
    /// Representable as edits to these documents, ordered by URI
    Edit(Vec<DocumentChange>),
}

impl Classification {
    pub fn is_command(&self) -> bool {
        matches!(self, Self::Command(_))
    }
}

/// Classifies `operations` produced by an action invoked on `origin`.
pub fn classify(
    operations: &[ChangeOperation],
    original: &Solution,
    origin: &Uri,
    options: ResolveOptions,
) -> Classification {
    let mut changed_solutions = Vec::with_capacity(operations.len());
    for operation in operations {
        match operation {
            ChangeOperation::ApplyChanges { changed_solution } => {
                changed_solutions.push(changed_solution);
            }
            ChangeOperation::Other(_) => {
                return Classification::Command(CommandReason::NonEditOperation);
            }
        }
    }

    let diffs: Vec<_> = changed_solutions
        .iter()
        .map(|changed| changed.changes_since(original))
        .collect();
    let project_changes = || diffs.iter().flat_map(|d| d.projects());

    if project_changes().any(|p| !p.added_documents().is_empty()) {
        return Classification::Command(CommandReason::AddedDocuments);
    }
    if project_changes().any(|p| !p.removed_documents().is_empty()) {
        return Classification::Command(CommandReason::RemovedDocuments);
    }

    if !options.allow_multi_document_edits {
        if project_changes().any(|p| p.changed_documents().any(|c| c.uri() != origin)) {
            return Classification::Command(CommandReason::CrossDocumentChanges);
        }
        if project_changes().any(|p| {
            p.changed_additional_documents().next().is_some()
                || p.changed_analyzer_config_documents().next().is_some()
        }) {
            return Classification::Command(CommandReason::SecondaryDocumentChanges);
        }
    }

    let mut by_document: BTreeMap<String, DocumentChange> = BTreeMap::new();
    for change in project_changes().flat_map(|p| p.all_changed()) {
        if !options.allow_multi_document_edits && change.kind() != DocumentKind::Source {
            continue;
        }
        let key = change.uri().as_str().to_string();
        if let Some(previous) = by_document.get(&key) {
            if !previous.new.same_content(&change.new) {
                return Classification::Command(CommandReason::OverlappingOperations);
            }
            continue;
        }
        by_document.insert(key, change.clone());
    }

    Classification::Edit(by_document.into_values().collect())
}
