//! Integration tests for the resolve pipeline.
//!
//! Drives the public API the way a language server does: list the actions for
//! a range, hand one back to resolve, and apply whatever comes out.

use async_trait::async_trait;
use lazyfix_core::{
    ANY_LANGUAGE, ActionProvider, ChangeOperation, CodeAction, Document, DocumentKind,
    LazyfixError, Project, ProjectId, ProviderRegistry, RUN_CODE_ACTION_COMMAND, ResolveOptions,
    Resolver, SideEffect, Solution, apply_text_edits,
};
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::{
    CodeAction as LspCodeAction, DocumentChangeOperation, DocumentChanges, OneOf, Position, Range,
    ResourceOp, TextEdit, Uri,
};

const SOURCE: &str = "zeta\nalpha  \nmid\r\nbeta\n";

fn uri(s: &str) -> Uri {
    Uri::from_str(s).expect("valid test URI")
}

/// Sorts the selected lines and offers a few edge-case actions.
struct LinesProvider;

#[async_trait]
impl ActionProvider for LinesProvider {
    fn id(&self) -> &'static str {
        "lines"
    }

    fn languages(&self) -> &[&'static str] {
        &[ANY_LANGUAGE]
    }

    async fn provide_actions(&self, _: &Solution, _: &Document, _: Range) -> Vec<CodeAction> {
        vec![
            CodeAction::leaf_fn("lines", "Sort lines", None, |ctx| {
                let mut lines: Vec<_> = ctx.document.text().lines().map(str::trim_end).collect();
                lines.sort_unstable();
                let text = lines.join("\n") + "\n";
                Ok(vec![ChangeOperation::apply_changes(
                    ctx.solution.with_document_text(ctx.document.uri(), text),
                )])
            }),
            CodeAction::leaf_fn("lines", "Copy to notes", None, |ctx| {
                Ok(vec![ChangeOperation::apply_changes(ctx.solution.with_document_text(
                    &uri("file:///ws/notes.txt"),
                    ctx.document.text(),
                ))])
            }),
            CodeAction::leaf_fn("lines", "Delete notes", None, |ctx| {
                Ok(vec![ChangeOperation::apply_changes(
                    ctx.solution.without_document(&uri("file:///ws/notes.txt")),
                )])
            }),
            CodeAction::leaf_fn("lines", "Open notes", None, |_| {
                Ok(vec![ChangeOperation::Other(SideEffect::OpenDocument {
                    uri: uri("file:///ws/notes.txt"),
                })])
            }),
        ]
    }
}

fn solution() -> Solution {
    Solution::new().with_project(
        Project::new(ProjectId::new("ws"))
            .with_document(
                Document::new(uri("file:///ws/main.txt"), "plaintext", SOURCE).with_version(7),
            )
            .with_document(
                Document::new(uri("file:///ws/notes.txt"), "plaintext", "")
                    .with_kind(DocumentKind::Additional),
            ),
    )
}

fn resolver(options: ResolveOptions) -> Resolver {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(LinesProvider));
    Resolver::new(Arc::new(registry)).with_options(options)
}

async fn listed(resolver: &Resolver, title: &str) -> LspCodeAction {
    let range = Range::new(Position::new(0, 0), Position::new(4, 0));
    resolver
        .code_actions(&solution(), &uri("file:///ws/main.txt"), range)
        .await
        .expect("listing succeeds")
        .into_iter()
        .find(|a| a.title == title)
        .expect("action is listed")
}

fn text_edits(action: &LspCodeAction) -> Vec<(String, Vec<TextEdit>)> {
    let Some(DocumentChanges::Edits(edits)) = action
        .edit
        .as_ref()
        .and_then(|e| e.document_changes.clone())
    else {
        panic!("expected document edits on {}", action.title);
    };
    edits
        .into_iter()
        .map(|e| {
            let edits = e
                .edits
                .into_iter()
                .map(|edit| match edit {
                    OneOf::Left(edit) => edit,
                    OneOf::Right(annotated) => annotated.text_edit,
                })
                .collect();
            (e.text_document.uri.as_str().to_string(), edits)
        })
        .collect()
}

#[tokio::test]
async fn test_resolved_edit_reproduces_new_text() {
    let resolver = resolver(ResolveOptions::default());
    let action = listed(&resolver, "Sort lines").await;

    let resolved = resolver
        .resolve_code_action(&solution(), action, &CancellationToken::new())
        .await
        .unwrap();

    let documents = text_edits(&resolved);
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].0, "file:///ws/main.txt");
    assert_eq!(
        apply_text_edits(SOURCE, &documents[0].1),
        "alpha\nbeta\nmid\nzeta\n"
    );
}

#[tokio::test]
async fn test_additional_document_needs_command() {
    let resolver = resolver(ResolveOptions::default());
    let action = listed(&resolver, "Copy to notes").await;
    let data = action.data.clone();

    let resolved = resolver
        .resolve_code_action(&solution(), action, &CancellationToken::new())
        .await
        .unwrap();

    assert!(resolved.edit.is_none());
    let command = resolved.command.expect("command fallback");
    assert_eq!(command.command, RUN_CODE_ACTION_COMMAND);
    assert_eq!(command.arguments, data.map(|d| vec![d]));
}

#[tokio::test]
async fn test_additional_document_edit_when_allowed() {
    let resolver = resolver(ResolveOptions {
        allow_multi_document_edits: true,
    });
    let action = listed(&resolver, "Copy to notes").await;

    let resolved = resolver
        .resolve_code_action(&solution(), action, &CancellationToken::new())
        .await
        .unwrap();

    let documents = text_edits(&resolved);
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].0, "file:///ws/notes.txt");
    assert_eq!(apply_text_edits("", &documents[0].1), SOURCE);
}

#[tokio::test]
async fn test_command_round_trip_deletes_document() {
    let resolver = resolver(ResolveOptions::default());
    let action = listed(&resolver, "Delete notes").await;

    let resolved = resolver
        .resolve_code_action(&solution(), action, &CancellationToken::new())
        .await
        .unwrap();
    let command = resolved.command.expect("removal needs a command");

    let plan = resolver
        .plan_command(
            &solution(),
            &command.command,
            &command.arguments.unwrap_or_default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let Some(DocumentChanges::Operations(ops)) = plan.edit.and_then(|e| e.document_changes) else {
        panic!("expected resource operations");
    };
    assert!(matches!(
        ops.as_slice(),
        [DocumentChangeOperation::Op(ResourceOp::Delete(delete))]
            if delete.uri.as_str() == "file:///ws/notes.txt"
    ));
    assert!(plan.side_effects.is_empty());
}

#[tokio::test]
async fn test_command_round_trip_side_effect() {
    let resolver = resolver(ResolveOptions::default());
    let action = listed(&resolver, "Open notes").await;
    let data = action.data.clone().unwrap();

    let plan = resolver
        .plan_command(
            &solution(),
            RUN_CODE_ACTION_COMMAND,
            &[data],
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(plan.edit.is_none());
    assert_eq!(
        plan.side_effects,
        vec![SideEffect::OpenDocument {
            uri: uri("file:///ws/notes.txt")
        }]
    );
}

#[tokio::test]
async fn test_document_closed_between_list_and_resolve() {
    let resolver = resolver(ResolveOptions::default());
    let action = listed(&resolver, "Sort lines").await;

    let after_close = solution().without_document(&uri("file:///ws/main.txt"));
    let err = resolver
        .resolve_code_action(&after_close, action, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, LazyfixError::DocumentNotFound { .. }));
    assert!(err.is_contract_violation());
}
