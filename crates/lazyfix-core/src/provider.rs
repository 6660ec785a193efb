//! Action providers and their registry.
//!
//! The registry is the single enumeration used by both the list step and
//! the resolve step, so re-running it over the same snapshot and range
//! yields the same candidates in the same order.

use crate::action::CodeAction;
use crate::error::{LazyfixError, Result};
use crate::solution::{Document, Solution};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tower_lsp_server::ls_types::Range;

/// Language id matching every document.
pub const ANY_LANGUAGE: &str = "*";

/// Produces candidate code actions for a document range.
///
/// Implementations must be pure functions of `(solution, document, range)`:
/// the resolve step re-runs them to find the action a client picked.
/// Enumeration must stay cheap; expensive work belongs in the actions'
/// [`OperationSource`](crate::action::OperationSource).
#[async_trait]
pub trait ActionProvider: Send + Sync {
    /// Stable provider id, used as the first identifier segment.
    fn id(&self) -> &'static str;

    /// Language ids this provider handles, or [`ANY_LANGUAGE`].
    fn languages(&self) -> &[&'static str];

    async fn provide_actions(
        &self,
        solution: &Solution,
        document: &Document,
        range: Range,
    ) -> Vec<CodeAction>;

    fn supports_language(&self, language_id: &str) -> bool {
        self.languages()
            .iter()
            .any(|l| *l == ANY_LANGUAGE || *l == language_id)
    }
}

/// Ordered set of action providers.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ActionProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider. Candidates are listed in registration order.
    pub fn register(&mut self, provider: Arc<dyn ActionProvider>) {
        tracing::debug!("registered code action provider '{}'", provider.id());
        self.providers.push(provider);
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn supports_language(&self, language_id: &str) -> bool {
        self.providers
            .iter()
            .any(|p| p.supports_language(language_id))
    }

    /// Enumerates every candidate action for `document` and `range`.
    ///
    /// Providers run concurrently; their results are concatenated in
    /// registration order.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedLanguage` if no provider handles the document's
    /// language.
    pub async fn candidates(
        &self,
        solution: &Solution,
        document: &Document,
        range: Range,
    ) -> Result<Vec<CodeAction>> {
        let language = document.language_id();
        let providers: Vec<_> = self
            .providers
            .iter()
            .filter(|p| p.supports_language(language))
            .collect();

        if providers.is_empty() {
            return Err(LazyfixError::unsupported_language(document.key(), language));
        }

        let results = join_all(
            providers
                .iter()
                .map(|p| p.provide_actions(solution, document, range)),
        )
        .await;

        Ok(results.into_iter().flatten().collect())
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<_> = self.providers.iter().map(|p| p.id()).collect();
        f.debug_struct("ProviderRegistry")
            .field("providers", &ids)
            .finish()
    }
}
