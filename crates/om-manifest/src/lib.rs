//! Ops Manager Manifest Library
//!
//! This library loads BOSH deployment manifests staged by Ops Manager and
//! answers property lookups against them. It is meant for test suites and
//! tooling that need to assert on what a tile renders.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use om_manifest::{Manifest, OpsManagerAPI};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Reads OPSMAN_URL, OPSMAN_USERNAME and OPSMAN_PASSWORD (or a .env file)
//! let api = OpsManagerAPI::from_env()?;
//! let manifest = api.get_staged_product_manifest("p-mysql").await?;
//!
//! let mysql = manifest.job_named("mysql")?;
//! let port = mysql.properties().find_int("cf_mysql.mysql.port")?;
//! println!("mysql listens on {}", port);
//!
//! // Manifests on disk work the same way
//! let saved = Manifest::from_path("manifest.yml").await?;
//! println!("{} instance groups", saved.instance_groups().len());
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Dotted lenses**: `a.b.c` walks nested property trees
//! - **Typed lookups**: string, integer, boolean, mapping and sequence accessors
//! - **Job resolution**: partitioned jobs, job name prefixes and instance groups
//! - **Both manifest shapes**: bare documents and `{ manifest: ... }` envelopes
//! - **Ops Manager client**: UAA login and staged manifest download

pub mod fetcher;
pub mod manifest;

// Re-export commonly used types for convenience
pub use fetcher::{
    FetchError, FileSource, ManifestSource, OpsManagerAPI, OpsManagerConfig,
    OpsManagerSource,
};
pub use manifest::{
    ErrorSeverity, InstanceGroup, Job, JobRef, Manifest, ManifestError, OmJob, Properties,
    Result, Value, ValueKind,
};
