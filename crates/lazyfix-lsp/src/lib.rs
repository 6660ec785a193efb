//! Language server for lazily resolved code actions.
//!
//! `textDocument/codeAction` only lists titles and kinds. The edit, or a
//! `lazyfix.runCodeAction` command when an edit cannot express the change,
//! is computed on `codeAction/resolve`.

pub mod config;
pub mod document;
pub mod handlers;
pub mod providers;
pub mod server;

// Re-export from lazyfix-core
pub use lazyfix_core::{LazyfixError, Result};

// Re-export server
pub use server::Backend;
