//! Server-wide document state.

use crate::config::DocumentsConfig;
use crate::document::sync::apply_content_changes;
use dashmap::DashMap;
use lazyfix_core::{Document, Project, ProjectId, SnapshotAccessor, Solution};
use tower_lsp_server::ls_types::{TextDocumentContentChangeEvent, Uri};

/// Id of the single project holding every open document.
pub const WORKSPACE_PROJECT: &str = "workspace";

/// Open documents, keyed by URI.
///
/// Every request takes its own [`Solution`] snapshot, so a request never
/// observes a document half-way through an update.
#[derive(Debug, Default)]
pub struct ServerState {
    pub documents: DashMap<Uri, Document>,
}

impl ServerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_document(&self, document: Document) {
        self.documents.insert(document.uri().clone(), document);
    }

    /// Applies a `didChange` to an open document.
    ///
    /// Returns `false` if the document is not open.
    pub fn change_document(
        &self,
        uri: &Uri,
        version: i32,
        changes: Vec<TextDocumentContentChangeEvent>,
    ) -> bool {
        let Some(mut entry) = self.documents.get_mut(uri) else {
            return false;
        };
        let text = apply_content_changes(entry.text(), changes);
        *entry = entry.with_text(text).with_version(version);
        true
    }

    pub fn close_document(&self, uri: &Uri) -> Option<Document> {
        self.documents.remove(uri).map(|(_, document)| document)
    }

    pub fn get_document(&self, uri: &Uri) -> Option<Document> {
        self.documents.get(uri).map(|entry| entry.value().clone())
    }

    /// Re-derives every document's kind, after the configuration changed.
    pub fn reclassify(&self, config: &DocumentsConfig) {
        for mut entry in self.documents.iter_mut() {
            let kind = config.kind_of(entry.key());
            if entry.kind() != kind {
                tracing::debug!("{} is now {:?}", entry.key().as_str(), kind);
                *entry = entry.value().clone().with_kind(kind);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl SnapshotAccessor for ServerState {
    fn current_solution(&self) -> Solution {
        let documents = self.documents.iter().map(|entry| entry.value().clone());
        Solution::new().with_project(Project::from_documents(
            ProjectId::new(WORKSPACE_PROJECT),
            documents,
        ))
    }
}
