//! Lazy code action resolution.
//!
//! Code actions are listed cheaply, with only a title and an opaque
//! reference. When a client resolves one, the action is located again,
//! executed, and its result is expressed either as minimal per-document text
//! edits or, when that is not possible, as a command that re-runs the action
//! on the server.
//!
//! # Pipeline
//!
//! - [`locator`] re-enumerates candidates and finds the referenced action
//! - [`executor`] computes the action's change operations
//! - [`classifier`] decides between edit and command
//! - [`differ`] turns old and new document text into text edits
//! - [`resolve`] aggregates the outcome and applies it to an LSP code action
//! - [`execute`] plans the fallback command

pub mod action;
pub mod classifier;
pub mod differ;
pub mod error;
pub mod execute;
pub mod executor;
pub mod locator;
pub mod provider;
pub mod resolve;
pub mod solution;
pub mod text;

// Re-export commonly used types
pub use action::{
    ActionContext, ActionReference, ChangeOperation, CodeAction, LeafAction, OperationSource,
    SideEffect,
};
pub use classifier::{Classification, CommandReason, ResolveOptions, classify};
pub use differ::{diff_document, diff_text};
pub use error::{LazyfixError, Result};
pub use execute::{ExecutionPlan, build_plan};
pub use provider::{ANY_LANGUAGE, ActionProvider, ProviderRegistry};
pub use resolve::{RUN_CODE_ACTION_COMMAND, ResolutionResult, Resolver};
pub use solution::{
    Document, DocumentKind, Project, ProjectId, SnapshotAccessor, Solution, SolutionChanges,
};
pub use text::{LineIndex, apply_text_edits};
