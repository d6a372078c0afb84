//! Manifest model and lookups
//!
//! This module contains the in-memory manifest model, the lens resolver for
//! property trees, and ingestion of YAML/JSON documents.

pub mod document;
pub mod error;
pub mod model;
pub mod properties;

// Re-export main types for convenience
pub use document::{unwrap_envelope, MANIFEST_KEY};
pub use error::{ErrorSeverity, ManifestError, Result};
pub use model::{InstanceGroup, Job, JobRef, Manifest, OmJob};
pub use properties::{Properties, Value, ValueKind};
