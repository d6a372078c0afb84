//! Error types for manifest lookups and document ingestion

use std::path::PathBuf;
use thiserror::Error;

use super::properties::ValueKind;

/// Errors produced while loading a manifest or looking something up in it
///
/// Lookups distinguish ordinary absence (recoverable) from failures that mean
/// the caller's assumption about the manifest shape is wrong (fatal). Use
/// [`ManifestError::is_fatal`] rather than matching on variants when only the
/// distinction matters.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// No value exists at the requested lens
    #[error("value not found at '{lens}'")]
    PropertyNotFound { lens: String },

    /// A value exists but is not of the requested scalar type
    #[error("value at '{lens}' is not {expected} (found {actual})")]
    WrongType {
        lens: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    /// An intermediate lens segment resolved to something other than a tree
    #[error("cannot descend into '{segment}' while resolving '{lens}': expected a mapping, found {actual}")]
    TypeMismatch {
        lens: String,
        segment: String,
        actual: ValueKind,
    },

    /// No job or instance group matched a logical name
    #[error("unable to find job named '{name}'")]
    JobNotFound { name: String },

    /// No instance group has the given name
    #[error("unable to find instance group named '{name}'")]
    InstanceGroupNotFound { name: String },

    /// The document does not have the structure of a manifest
    #[error("invalid manifest document: {message}")]
    InvalidDocument { message: String },

    /// The document is not valid YAML (or JSON)
    #[error("failed to parse manifest document")]
    Yaml(#[from] serde_yaml::Error),

    /// A manifest file could not be read
    #[error("failed to read manifest file '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ManifestError>;

/// Whether the caller can reasonably continue after an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Ordinary absence or a type check that did not hold
    Recoverable,
    /// The manifest does not look the way the caller assumed
    Fatal,
}

impl ManifestError {
    pub fn invalid_document<S: Into<String>>(message: S) -> Self {
        ManifestError::InvalidDocument {
            message: message.into(),
        }
    }

    pub fn io_error<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        ManifestError::Io {
            path: path.into(),
            source,
        }
    }

    /// Severity of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ManifestError::PropertyNotFound { .. } => ErrorSeverity::Recoverable,
            ManifestError::WrongType { .. } => ErrorSeverity::Recoverable,
            ManifestError::TypeMismatch { .. } => ErrorSeverity::Fatal,
            ManifestError::JobNotFound { .. } => ErrorSeverity::Fatal,
            ManifestError::InstanceGroupNotFound { .. } => ErrorSeverity::Fatal,
            ManifestError::InvalidDocument { .. } => ErrorSeverity::Fatal,
            ManifestError::Yaml(_) => ErrorSeverity::Fatal,
            ManifestError::Io { .. } => ErrorSeverity::Fatal,
        }
    }

    /// True when the caller must not continue past this error
    pub fn is_fatal(&self) -> bool {
        self.severity() == ErrorSeverity::Fatal
    }

    /// True for every kind of "nothing by that name" failure
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ManifestError::PropertyNotFound { .. }
                | ManifestError::JobNotFound { .. }
                | ManifestError::InstanceGroupNotFound { .. }
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ManifestError::PropertyNotFound { .. } => "property_not_found",
            ManifestError::WrongType { .. } => "wrong_type",
            ManifestError::TypeMismatch { .. } => "type_mismatch",
            ManifestError::JobNotFound { .. } => "job_not_found",
            ManifestError::InstanceGroupNotFound { .. } => "instance_group_not_found",
            ManifestError::InvalidDocument { .. } => "invalid_document",
            ManifestError::Yaml(_) => "yaml",
            ManifestError::Io { .. } => "io",
        }
    }
}
