use thiserror::Error;

/// Errors raised while listing, resolving or executing code actions.
///
/// Most variants are contract violations: the client echoed back a reference
/// this server issued earlier, so failing to honour it is never downgraded to
/// an empty result.
#[derive(Error, Debug)]
pub enum LazyfixError {
    /// The referenced document is not part of the current solution snapshot
    #[error("Document not found: {uri}")]
    DocumentNotFound { uri: String },

    /// No candidate action for the document and range carries the identifier
    #[error("Code action '{identifier}' not found in {uri}")]
    ActionNotFound { uri: String, identifier: String },

    /// No provider is registered for the document's language
    #[error("No code action support for language '{language}' ({uri})")]
    UnsupportedLanguage { uri: String, language: String },

    /// The opaque `data` payload does not decode to an action reference
    #[error("Invalid code action reference: {source}")]
    InvalidReference {
        #[source]
        source: serde_json::Error,
    },

    /// A command was invoked with a name or argument list this server does not issue
    #[error("Invalid command argument: {message}")]
    InvalidArgument { message: String },

    /// The request was cancelled while the action was computing its changes
    #[error("Code action computation was cancelled")]
    Cancelled,

    /// The action itself failed while computing its changes
    #[error("Code action '{title}' failed: {source}")]
    Computation {
        title: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type alias for lazyfix operations.
pub type Result<T> = std::result::Result<T, LazyfixError>;

impl LazyfixError {
    pub fn document_not_found(uri: impl Into<String>) -> Self {
        Self::DocumentNotFound { uri: uri.into() }
    }

    pub fn action_not_found(uri: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::ActionNotFound {
            uri: uri.into(),
            identifier: identifier.into(),
        }
    }

    pub fn unsupported_language(uri: impl Into<String>, language: impl Into<String>) -> Self {
        Self::UnsupportedLanguage {
            uri: uri.into(),
            language: language.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Wrap a failure reported by an action's change computation.
    pub fn computation(
        title: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Computation {
            title: title.into(),
            source: Box::new(error),
        }
    }

    /// True for errors caused by a reference or argument the client should not have sent.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::DocumentNotFound { .. }
                | Self::ActionNotFound { .. }
                | Self::UnsupportedLanguage { .. }
                | Self::InvalidReference { .. }
                | Self::InvalidArgument { .. }
        )
    }
}

impl From<serde_json::Error> for LazyfixError {
    fn from(source: serde_json::Error) -> Self {
        Self::InvalidReference { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LazyfixError::document_not_found("file:///a.rs");
        assert_eq!(err.to_string(), "Document not found: file:///a.rs");

        let err = LazyfixError::action_not_found("file:///a.rs", "case|To upper case");
        assert_eq!(
            err.to_string(),
            "Code action 'case|To upper case' not found in file:///a.rs"
        );

        let err = LazyfixError::unsupported_language("file:///a.bin", "binary");
        assert_eq!(
            err.to_string(),
            "No code action support for language 'binary' (file:///a.bin)"
        );
    }

    #[test]
    fn test_contract_violation_classification() {
        assert!(LazyfixError::document_not_found("x").is_contract_violation());
        assert!(LazyfixError::action_not_found("x", "y").is_contract_violation());
        assert!(LazyfixError::invalid_argument("missing").is_contract_violation());
        assert!(!LazyfixError::Cancelled.is_contract_violation());

        let err = LazyfixError::computation(
            "Sort lines",
            std::io::Error::from(std::io::ErrorKind::Other),
        );
        assert!(!err.is_contract_violation());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: LazyfixError = json_err.into();
        assert!(matches!(err, LazyfixError::InvalidReference { .. }));
        assert!(err.is_contract_violation());
    }
}
