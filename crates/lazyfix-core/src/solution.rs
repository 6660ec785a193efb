//! Immutable solution snapshots and the changes between two of them.
//!
//! A [`Solution`] is a set of projects, each owning a set of documents. All
//! three types are persistent values: every `with_*` method returns a new
//! snapshot sharing unchanged data with the original through `Arc`, so an
//! action can freely derive a changed solution without touching the one the
//! server holds.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tower_lsp_server::ls_types::Uri;

/// The kind of a document, which decides how its changes may be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DocumentKind {
    /// Regular source document
    #[default]
    Source,
    /// Non-source file shipped alongside the project (data, templates)
    Additional,
    /// Analyzer configuration such as `.editorconfig`
    AnalyzerConfig,
}

/// Immutable text snapshot of one document.
#[derive(Debug, Clone)]
pub struct Document {
    uri: Uri,
    kind: DocumentKind,
    language_id: String,
    version: Option<i32>,
    text: Arc<str>,
}

impl Document {
    pub fn new(uri: Uri, language_id: impl Into<String>, text: impl Into<Arc<str>>) -> Self {
        Self {
            uri,
            kind: DocumentKind::Source,
            language_id: language_id.into(),
            version: None,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: DocumentKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: i32) -> Self {
        self.version = Some(version);
        self
    }

    /// Returns a copy of this document holding `text`. Identity, kind and
    /// version are kept: the version still names the snapshot the new text
    /// was derived from.
    #[must_use]
    pub fn with_text(&self, text: impl Into<Arc<str>>) -> Self {
        Self {
            text: text.into(),
            ..self.clone()
        }
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn key(&self) -> &str {
        self.uri.as_str()
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    pub fn version(&self) -> Option<i32> {
        self.version
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// True when both snapshots hold the same content and kind.
    pub fn same_content(&self, other: &Self) -> bool {
        self.kind == other.kind && (Arc::ptr_eq(&self.text, &other.text) || self.text == other.text)
    }
}

/// Stable project identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable snapshot of one project and its documents, ordered by URI.
#[derive(Debug, Clone)]
pub struct Project {
    id: ProjectId,
    documents: Arc<BTreeMap<String, Document>>,
}

impl Project {
    pub fn new(id: ProjectId) -> Self {
        Self {
            id,
            documents: Arc::default(),
        }
    }

    /// Builds a project in one go; later documents replace earlier ones with
    /// the same URI.
    pub fn from_documents(id: ProjectId, documents: impl IntoIterator<Item = Document>) -> Self {
        let documents = documents
            .into_iter()
            .map(|d| (d.key().to_string(), d))
            .collect();
        Self {
            id,
            documents: Arc::new(documents),
        }
    }

    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    pub fn document(&self, uri: &Uri) -> Option<&Document> {
        self.documents.get(uri.as_str())
    }

    pub fn contains(&self, uri: &Uri) -> bool {
        self.documents.contains_key(uri.as_str())
    }

    #[must_use]
    pub fn with_document(&self, document: Document) -> Self {
        let mut documents = Arc::clone(&self.documents);
        Arc::make_mut(&mut documents).insert(document.key().to_string(), document);
        Self {
            id: self.id.clone(),
            documents,
        }
    }

    #[must_use]
    pub fn without_document(&self, uri: &Uri) -> Self {
        if !self.contains(uri) {
            return self.clone();
        }
        let mut documents = Arc::clone(&self.documents);
        Arc::make_mut(&mut documents).remove(uri.as_str());
        Self {
            id: self.id.clone(),
            documents,
        }
    }
}

/// Immutable snapshot of every project known to the server.
#[derive(Debug, Clone, Default)]
pub struct Solution {
    projects: Arc<BTreeMap<ProjectId, Project>>,
}

impl Solution {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_project(&self, project: Project) -> Self {
        let mut projects = Arc::clone(&self.projects);
        Arc::make_mut(&mut projects).insert(project.id().clone(), project);
        Self { projects }
    }

    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.get(id)
    }

    /// The project owning `uri`, if any.
    pub fn project_of(&self, uri: &Uri) -> Option<&Project> {
        self.projects.values().find(|p| p.contains(uri))
    }

    pub fn document(&self, uri: &Uri) -> Option<&Document> {
        self.project_of(uri).and_then(|p| p.document(uri))
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.projects().flat_map(Project::documents)
    }

    /// Returns a solution where the document at `uri` holds `text`.
    ///
    /// Unknown URIs leave the solution unchanged.
    #[must_use]
    pub fn with_document_text(&self, uri: &Uri, text: impl Into<Arc<str>>) -> Self {
        let Some(project) = self.project_of(uri) else {
            tracing::debug!("ignoring text change for unknown document {}", uri.as_str());
            return self.clone();
        };
        let Some(document) = project.document(uri) else {
            return self.clone();
        };
        let project = project.with_document(document.with_text(text));
        self.with_project(project)
    }

    /// Returns a solution with `document` added to (or replaced in) the project.
    ///
    /// A missing project is created.
    #[must_use]
    pub fn with_added_document(&self, project_id: &ProjectId, document: Document) -> Self {
        let project = self
            .project(project_id)
            .cloned()
            .unwrap_or_else(|| Project::new(project_id.clone()));
        self.with_project(project.with_document(document))
    }

    #[must_use]
    pub fn without_document(&self, uri: &Uri) -> Self {
        match self.project_of(uri) {
            Some(project) => self.with_project(project.without_document(uri)),
            None => self.clone(),
        }
    }

    /// Computes the per-project changes that turn `old` into `self`.
    pub fn changes_since(&self, old: &Self) -> SolutionChanges {
        SolutionChanges::between(old, self)
    }
}

/// A document present in both snapshots with different content.
#[derive(Debug, Clone)]
pub struct DocumentChange {
    pub old: Document,
    pub new: Document,
}

impl DocumentChange {
    pub fn uri(&self) -> &Uri {
        self.new.uri()
    }

    pub fn kind(&self) -> DocumentKind {
        self.new.kind()
    }
}

/// Changes within one project.
#[derive(Debug, Clone)]
pub struct ProjectChanges {
    pub project_id: ProjectId,
    pub added: Vec<Document>,
    pub removed: Vec<Document>,
    pub changed: Vec<DocumentChange>,
}

impl ProjectChanges {
    fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    fn changed_of_kind(&self, kind: DocumentKind) -> impl Iterator<Item = &DocumentChange> {
        self.changed.iter().filter(move |c| c.kind() == kind)
    }

    pub fn added_documents(&self) -> &[Document] {
        &self.added
    }

    pub fn removed_documents(&self) -> &[Document] {
        &self.removed
    }

    pub fn changed_documents(&self) -> impl Iterator<Item = &DocumentChange> {
        self.changed_of_kind(DocumentKind::Source)
    }

    pub fn changed_additional_documents(&self) -> impl Iterator<Item = &DocumentChange> {
        self.changed_of_kind(DocumentKind::Additional)
    }

    pub fn changed_analyzer_config_documents(&self) -> impl Iterator<Item = &DocumentChange> {
        self.changed_of_kind(DocumentKind::AnalyzerConfig)
    }

    /// Every changed document regardless of kind.
    pub fn all_changed(&self) -> &[DocumentChange] {
        &self.changed
    }
}

/// Per-project changes between two solution snapshots, ordered by project id
/// and, within a project, by document URI.
#[derive(Debug, Clone, Default)]
pub struct SolutionChanges {
    projects: Vec<ProjectChanges>,
}

impl SolutionChanges {
    pub fn between(old: &Solution, new: &Solution) -> Self {
        let empty_old = Project::new(ProjectId::new(""));
        let mut projects = Vec::new();

        for new_project in new.projects() {
            let old_project = old.project(new_project.id()).unwrap_or(&empty_old);
            let changes = diff_projects(new_project.id(), old_project, new_project);
            if !changes.is_empty() {
                projects.push(changes);
            }
        }

        for old_project in old.projects() {
            if new.project(old_project.id()).is_none() {
                projects.push(ProjectChanges {
                    project_id: old_project.id().clone(),
                    added: Vec::new(),
                    removed: old_project.documents().cloned().collect(),
                    changed: Vec::new(),
                });
            }
        }

        projects.sort_by(|a, b| a.project_id.cmp(&b.project_id));
        Self { projects }
    }

    pub fn projects(&self) -> &[ProjectChanges] {
        &self.projects
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

fn diff_projects(id: &ProjectId, old: &Project, new: &Project) -> ProjectChanges {
    let mut changes = ProjectChanges {
        project_id: id.clone(),
        added: Vec::new(),
        removed: Vec::new(),
        changed: Vec::new(),
    };

    for document in new.documents() {
        match old.document(document.uri()) {
            None => changes.added.push(document.clone()),
            Some(previous) if !previous.same_content(document) => {
                changes.changed.push(DocumentChange {
                    old: previous.clone(),
                    new: document.clone(),
                });
            }
            Some(_) => {}
        }
    }

    changes.removed = old
        .documents()
        .filter(|d| !new.contains(d.uri()))
        .cloned()
        .collect();

    changes
}

/// Access to the server's current snapshot.
///
/// Implemented by the host; the core only ever reads through it.
pub trait SnapshotAccessor: Send + Sync {
    fn current_solution(&self) -> Solution;
}

impl SnapshotAccessor for Solution {
    fn current_solution(&self) -> Solution {
        self.clone()
    }
}
