//! Server configuration.
//!
//! Read from `initializationOptions` and replaced wholesale on
//! `workspace/didChangeConfiguration`. Every field has a default, so a
//! partial or missing configuration is always valid.

use lazyfix_core::{DocumentKind, ResolveOptions};
use serde::{Deserialize, Serialize};
use tower_lsp_server::ls_types::Uri;

/// Section name clients may nest the settings under.
pub const CONFIG_SECTION: &str = "lazyfix";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LazyfixConfig {
    pub resolve: ResolveConfig,
    pub documents: DocumentsConfig,
}

impl LazyfixConfig {
    /// Parses settings either at the top level or under the `lazyfix` section.
    ///
    /// Returns `None` when the value does not describe a configuration.
    pub fn from_settings(settings: serde_json::Value) -> Option<Self> {
        let settings = match settings {
            serde_json::Value::Object(mut map) if map.contains_key(CONFIG_SECTION) => {
                map.remove(CONFIG_SECTION)?
            }
            other => other,
        };
        match serde_json::from_value(settings) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("ignoring invalid configuration: {}", e);
                None
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolveConfig {
    /// Resolve changes spanning several documents, or touching additional and
    /// analyzer-config documents, to edits instead of commands
    pub allow_multi_document_edits: bool,
}

impl ResolveConfig {
    pub fn options(&self) -> ResolveOptions {
        ResolveOptions {
            allow_multi_document_edits: self.allow_multi_document_edits,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentsConfig {
    /// File extensions, without the dot, of additional documents
    pub additional_extensions: Vec<String>,
    /// File names of analyzer-config documents
    pub analyzer_config_file_names: Vec<String>,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            additional_extensions: vec!["txt".into(), "json".into()],
            analyzer_config_file_names: vec![".editorconfig".into(), ".globalconfig".into()],
        }
    }
}

impl DocumentsConfig {
    /// Decides the kind of the document at `uri` from its file name.
    pub fn kind_of(&self, uri: &Uri) -> DocumentKind {
        let name = file_name(uri);
        if self.analyzer_config_file_names.iter().any(|n| n == name) {
            return DocumentKind::AnalyzerConfig;
        }
        let extension = name.rsplit_once('.').map(|(_, ext)| ext);
        match extension {
            Some(ext) if self.additional_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) => {
                DocumentKind::Additional
            }
            _ => DocumentKind::Source,
        }
    }
}

/// Last path segment of `uri`, without query or fragment.
pub(crate) fn file_name(uri: &Uri) -> &str {
    let s = uri.as_str();
    let path = s.split(['?', '#']).next().unwrap_or(s);
    path.rsplit('/').next().unwrap_or(path)
}
