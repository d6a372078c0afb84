//! Building a [`Manifest`] from YAML or JSON documents
//!
//! Ops Manager wraps staged manifests as `{ manifest: { ... } }`, while
//! manifests saved to disk are usually bare. Both shapes are accepted, and any
//! of `jobs` / `instance_groups` may be missing.

use serde_yaml::Value as YamlValue;
use std::path::Path;
use tracing::debug;

use super::error::{ManifestError, Result};
use super::model::Manifest;

/// Key under which Ops Manager nests the manifest
pub const MANIFEST_KEY: &str = "manifest";

/// Strip the `{ manifest: ... }` envelope if present
///
/// Returns the document unchanged when it is already bare.
pub fn unwrap_envelope(document: YamlValue) -> Result<YamlValue> {
    match document {
        YamlValue::Tagged(tagged) => unwrap_envelope(tagged.value),
        YamlValue::Mapping(mut mapping) => match mapping.remove(MANIFEST_KEY) {
            None => Ok(YamlValue::Mapping(mapping)),
            Some(inner @ YamlValue::Mapping(_)) => Ok(inner),
            Some(YamlValue::Null) => Ok(YamlValue::Null),
            Some(other) => Err(ManifestError::invalid_document(format!(
                "'{}' must be a mapping, found {:?}",
                MANIFEST_KEY, other
            ))),
        },
        YamlValue::Null => Ok(YamlValue::Null),
        other => Err(ManifestError::invalid_document(format!(
            "expected a mapping at the document root, found {:?}",
            other
        ))),
    }
}

impl Manifest {
    /// Build a manifest from an already-parsed document
    pub fn from_document(document: YamlValue) -> Result<Self> {
        let manifest = match unwrap_envelope(document)? {
            YamlValue::Null => Manifest::default(),
            bare => serde_yaml::from_value::<Manifest>(bare)?,
        };

        debug!(
            "Loaded manifest with {} jobs and {} instance groups",
            manifest.jobs().len(),
            manifest.instance_groups().len()
        );

        Ok(manifest)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::from_slice(yaml.as_bytes())
    }

    /// Parse YAML or JSON bytes; blank input is an empty manifest
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Self::from_document(YamlValue::Null);
        }
        Self::from_document(serde_yaml::from_slice(bytes)?)
    }

    /// Read and parse a manifest file
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ManifestError::io_error(path, e))?;

        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Self::from_slice(&bytes)
    }
}
