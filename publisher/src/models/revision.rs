//! Revision models

use serde::{Deserialize, Serialize};

/// Archive format of an uploaded revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleFormat {
    Zip,
}

/// Address of one uploaded artifact in the object store
///
/// Produced once by the uploader and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionLocator {
    /// Object-store bucket
    pub bucket: String,

    /// Object key within the bucket
    pub key: String,

    /// Content tag returned by the object store, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_tag: Option<String>,

    /// Archive format
    pub bundle_format: BundleFormat,
}

/// Object-store upload result
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PutOutcome {
    /// Content tag assigned by the store
    #[serde(default)]
    pub e_tag: Option<String>,
}
