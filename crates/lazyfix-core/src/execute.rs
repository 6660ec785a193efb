//! Server-side execution of the fallback command.
//!
//! The command re-runs the action and turns every operation into an effect
//! the client can apply, including the ones a resolved edit cannot carry.

use crate::action::{ActionReference, ChangeOperation, SideEffect};
use crate::differ::diff_document;
use crate::error::{LazyfixError, Result};
use crate::executor::execute_action;
use crate::locator::locate_action;
use crate::resolve::{RUN_CODE_ACTION_COMMAND, Resolver};
use crate::solution::{SnapshotAccessor, Solution};
use serde_json::Value;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{
    CreateFile, DeleteFile, DocumentChangeOperation, DocumentChanges, OneOf,
    OptionalVersionedTextDocumentIdentifier, Range, ResourceOp, TextDocumentEdit, TextEdit, Uri,
    WorkspaceEdit,
};

/// Everything the host has to do to carry out an action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionPlan {
    /// Document changes for `workspace/applyEdit`, if there are any
    pub edit: Option<WorkspaceEdit>,
    /// Effects to perform after the edit, in the order they were produced
    pub side_effects: Vec<SideEffect>,
}

impl ExecutionPlan {
    pub fn is_empty(&self) -> bool {
        self.edit.is_none() && self.side_effects.is_empty()
    }
}

/// Turns `operations` into an execution plan.
///
/// Each `ApplyChanges` is diffed against the snapshot left by the previous
/// one, starting from `original`. Added documents are created and filled,
/// changed documents of every kind are edited, removed documents are
/// deleted. Only the first edit of a document carries its version.
pub fn build_plan(original: &Solution, operations: &[ChangeOperation]) -> ExecutionPlan {
    let mut current = original.clone();
    let mut document_changes = Vec::new();
    let mut versioned = HashSet::new();
    let mut side_effects = Vec::new();

    for operation in operations {
        match operation {
            ChangeOperation::ApplyChanges { changed_solution } => {
                let changes = changed_solution.changes_since(&current);
                for project in changes.projects() {
                    for added in project.added_documents() {
                        document_changes.push(DocumentChangeOperation::Op(ResourceOp::Create(
                            CreateFile {
                                uri: added.uri().clone(),
                                options: None,
                                annotation_id: None,
                            },
                        )));
                        versioned.insert(added.key().to_string());
                        if !added.text().is_empty() {
                            document_changes.push(text_document_edit(
                                added.uri().clone(),
                                None,
                                vec![TextEdit::new(Range::default(), added.text().to_string())],
                            ));
                        }
                    }

                    for change in project.all_changed() {
                        let edits = diff_document(change);
                        if edits.is_empty() {
                            continue;
                        }
                        let version = if versioned.insert(change.new.key().to_string()) {
                            change.old.version()
                        } else {
                            None
                        };
                        document_changes.push(text_document_edit(
                            change.uri().clone(),
                            version,
                            edits,
                        ));
                    }

                    for removed in project.removed_documents() {
                        document_changes.push(DocumentChangeOperation::Op(ResourceOp::Delete(
                            DeleteFile {
                                uri: removed.uri().clone(),
                                options: None,
                                annotation_id: None,
                            },
                        )));
                    }
                }
                current = changed_solution.clone();
            }
            ChangeOperation::Other(effect) => side_effects.push(effect.clone()),
        }
    }

    let edit = (!document_changes.is_empty()).then(|| WorkspaceEdit {
        changes: None,
        document_changes: Some(DocumentChanges::Operations(document_changes)),
        change_annotations: None,
    });

    ExecutionPlan { edit, side_effects }
}

fn text_document_edit(
    uri: Uri,
    version: Option<i32>,
    edits: Vec<TextEdit>,
) -> DocumentChangeOperation {
    DocumentChangeOperation::Edit(TextDocumentEdit {
        text_document: OptionalVersionedTextDocumentIdentifier { uri, version },
        edits: edits.into_iter().map(OneOf::Left).collect(),
    })
}

impl Resolver {
    /// Runs the fallback command: re-locates and re-executes the referenced
    /// action and plans all of its operations.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a foreign command name or an argument list other
    /// than a single reference, otherwise as [`Resolver::resolve`].
    pub async fn plan_command(
        &self,
        accessor: &dyn SnapshotAccessor,
        command: &str,
        arguments: &[Value],
        cancellation: &CancellationToken,
    ) -> Result<ExecutionPlan> {
        if command != RUN_CODE_ACTION_COMMAND {
            return Err(LazyfixError::invalid_argument(format!(
                "unknown command '{command}'"
            )));
        }
        let [argument] = arguments else {
            return Err(LazyfixError::invalid_argument(format!(
                "'{RUN_CODE_ACTION_COMMAND}' takes one argument, got {}",
                arguments.len()
            )));
        };

        let reference = ActionReference::from_value(argument.clone())?;
        let located = locate_action(self.registry(), accessor, &reference).await?;
        let operations = execute_action(&located, reference.range, cancellation).await?;

        let plan = build_plan(&located.solution, &operations);
        tracing::debug!(
            "'{}' planned with {} side effect(s), edit: {}",
            reference.unique_identifier,
            plan.side_effects.len(),
            plan.edit.is_some()
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::CodeAction;
    use crate::provider::{ANY_LANGUAGE, ActionProvider, ProviderRegistry};
    use crate::solution::{Document, DocumentKind, Project, ProjectId};
    use async_trait::async_trait;
    use std::str::FromStr;
    use std::sync::Arc;
    use tower_lsp_server::ls_types::Position;

    fn uri(s: &str) -> Uri {
        Uri::from_str(s).unwrap()
    }

    fn original() -> Solution {
        Solution::new().with_project(
            Project::new(ProjectId::new("app"))
                .with_document(Document::new(uri("file:///a.rs"), "rust", "foo").with_version(2))
                .with_document(Document::new(uri("file:///old.rs"), "rust", "old"))
                .with_document(
                    Document::new(uri("file:///notes.txt"), "plaintext", "notes")
                        .with_kind(DocumentKind::Additional),
                ),
        )
    }

    fn operations(plan: &ExecutionPlan) -> &[DocumentChangeOperation] {
        match plan.edit.as_ref().and_then(|e| e.document_changes.as_ref()) {
            Some(DocumentChanges::Operations(ops)) => ops,
            other => panic!("expected operations, got {other:?}"),
        }
    }

    fn as_edit(op: &DocumentChangeOperation) -> &TextDocumentEdit {
        match op {
            DocumentChangeOperation::Edit(edit) => edit,
            DocumentChangeOperation::Op(op) => panic!("expected edit, got {op:?}"),
        }
    }

    #[test]
    fn test_empty_operations_plan_nothing() {
        let plan = build_plan(&original(), &[]);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_every_kind_of_change() {
        let old = original();
        let new = old
            .with_document_text(&uri("file:///a.rs"), "foobar")
            .with_document_text(&uri("file:///notes.txt"), "more notes")
            .without_document(&uri("file:///old.rs"))
            .with_added_document(
                &ProjectId::new("app"),
                Document::new(uri("file:///new.rs"), "rust", "fn new() {}"),
            );

        let plan = build_plan(&old, &[ChangeOperation::apply_changes(new)]);
        let ops = operations(&plan);
        assert_eq!(ops.len(), 5);

        assert!(matches!(
            &ops[0],
            DocumentChangeOperation::Op(ResourceOp::Create(c)) if c.uri.as_str() == "file:///new.rs"
        ));
        let fill = as_edit(&ops[1]);
        assert_eq!(fill.text_document.version, None);
        assert_eq!(
            fill.edits,
            vec![OneOf::Left(TextEdit::new(Range::default(), "fn new() {}".to_string()))]
        );

        let main = as_edit(&ops[2]);
        assert_eq!(main.text_document.uri.as_str(), "file:///a.rs");
        assert_eq!(main.text_document.version, Some(2));
        assert_eq!(
            main.edits,
            vec![OneOf::Left(TextEdit::new(
                Range::new(Position::new(0, 3), Position::new(0, 3)),
                "bar".to_string()
            ))]
        );

        assert_eq!(as_edit(&ops[3]).text_document.uri.as_str(), "file:///notes.txt");
        assert!(matches!(
            &ops[4],
            DocumentChangeOperation::Op(ResourceOp::Delete(d))
                if d.uri.as_str() == "file:///old.rs" && d.annotation_id.is_none()
        ));
    }

    #[test]
    fn test_successive_operations_are_chained() {
        let old = original();
        let first = old.with_document_text(&uri("file:///a.rs"), "foo bar");
        let second = first.with_document_text(&uri("file:///a.rs"), "foo bar baz");

        let plan = build_plan(
            &old,
            &[
                ChangeOperation::apply_changes(first),
                ChangeOperation::apply_changes(second),
            ],
        );
        let ops = operations(&plan);
        assert_eq!(ops.len(), 2);

        let edit = as_edit(&ops[1]);
        assert_eq!(edit.text_document.version, None);
        assert_eq!(
            edit.edits,
            vec![OneOf::Left(TextEdit::new(
                Range::new(Position::new(0, 7), Position::new(0, 7)),
                " baz".to_string()
            ))]
        );
    }

    #[test]
    fn test_side_effects_keep_order() {
        let target = uri("file:///a.rs");
        let plan = build_plan(
            &original(),
            &[
                ChangeOperation::Other(SideEffect::ShowMessage {
                    message: "first".into(),
                }),
                ChangeOperation::Other(SideEffect::OpenDocument {
                    uri: target.clone(),
                }),
            ],
        );
        assert!(plan.edit.is_none());
        assert_eq!(
            plan.side_effects,
            vec![
                SideEffect::ShowMessage {
                    message: "first".into()
                },
                SideEffect::OpenDocument { uri: target },
            ]
        );
    }

    struct SplitProvider;

    #[async_trait]
    impl ActionProvider for SplitProvider {
        fn id(&self) -> &'static str {
            "split"
        }

        fn languages(&self) -> &[&'static str] {
            &[ANY_LANGUAGE]
        }

        async fn provide_actions(&self, _: &Solution, _: &Document, _: Range) -> Vec<CodeAction> {
            vec![CodeAction::leaf_fn("split", "Move to new file", None, |ctx| {
                let target = uri("file:///moved.rs");
                let moved = Document::new(target.clone(), "rust", ctx.document.text());
                let changed = ctx
                    .solution
                    .with_document_text(ctx.document.uri(), "")
                    .with_added_document(&ProjectId::new("app"), moved);
                Ok(vec![
                    ChangeOperation::apply_changes(changed),
                    ChangeOperation::Other(SideEffect::OpenDocument { uri: target }),
                ])
            })]
        }
    }

    fn resolver() -> Resolver {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(SplitProvider));
        Resolver::new(Arc::new(registry))
    }

    fn argument() -> Value {
        ActionReference::new(uri("file:///a.rs"), Range::default(), "split|Move to new file")
            .to_value()
            .unwrap()
    }

    #[tokio::test]
    async fn test_plan_command_reruns_action() {
        let plan = resolver()
            .plan_command(
                &original(),
                RUN_CODE_ACTION_COMMAND,
                &[argument()],
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let ops = operations(&plan);
        assert!(matches!(&ops[0], DocumentChangeOperation::Op(ResourceOp::Create(_))));
        assert_eq!(plan.side_effects.len(), 1);
        assert!(matches!(&plan.side_effects[0], SideEffect::OpenDocument { .. }));
    }

    #[tokio::test]
    async fn test_plan_command_rejects_foreign_command() {
        let err = resolver()
            .plan_command(&original(), "other.command", &[argument()], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LazyfixError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_plan_command_rejects_argument_count() {
        let err = resolver()
            .plan_command(
                &original(),
                RUN_CODE_ACTION_COMMAND,
                &[argument(), argument()],
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(err.is_contract_violation());

        let err = resolver()
            .plan_command(&original(), RUN_CODE_ACTION_COMMAND, &[], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LazyfixError::InvalidArgument { .. }));
    }
}
