//! Fetching manifests from Ops Manager or from disk

pub mod config;
pub mod error;
pub mod oauth;
pub mod ops_manager;
pub mod source;


pub use config::OpsManagerConfig;
pub use error::{FetchError, Result};
pub use oauth::{AccessToken, AuthenticatedClient};
pub use ops_manager::{OpsManagerAPI, Product};
pub use source::{FileSource, ManifestSource, OpsManagerSource};
