//! Error types for the Claude Code node.

pub mod translate;
pub mod unified;

pub use translate::{translate, Failure, FailureKind};
pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

/// Primary error type for the per-item pipeline.
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid parameter `{name}`: {message}")]
    Parameter { name: String, message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] crate::config::ConfigError),

    /// The per-item cancellation token fired before the stream finished.
    #[error("Operation aborted")]
    Cancelled,

    #[error("Process error: {message}")]
    Process {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Permission error: {0}")]
    Permission(String),

    /// Anything the SDK reported without a recognisable structure.
    #[error("{0}")]
    Execution(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NodeError {
    /// Create a process error without an underlying IO source.
    pub fn process(message: impl Into<String>) -> Self {
        Self::Process {
            message: message.into(),
            source: None,
        }
    }

    pub fn parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Whether the error came from the cancellation signal.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Classify this error into a category using its structure only.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) | Self::Parameter { .. } => ErrorCategory::Validation,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Cancelled => ErrorCategory::Timeout,
            Self::Process { .. } => ErrorCategory::Process,
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::Permission(_) => ErrorCategory::Permission,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Io(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
                ErrorCategory::Permission
            }
            Self::Io(err) if err.kind() == std::io::ErrorKind::NotFound => ErrorCategory::Process,
            Self::Execution(_) | Self::Stream(_) | Self::Io(_) => ErrorCategory::Unknown,
        }
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        self.category().recovery_suggestion()
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, NodeError>;
