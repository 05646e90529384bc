//! The storage client contract consumed by upload sessions

use crate::callback::UploadDelegate;
use crate::error::Result;
use crate::upload::types::UploadFile;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Blob attributes returned by a successful create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRecord {
    /// Token identifying the stored blob to downstream systems
    pub signed_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl BlobRecord {
    pub fn new(signed_id: impl Into<String>) -> Self {
        Self {
            signed_id: signed_id.into(),
            key: None,
            filename: None,
            content_type: None,
            byte_size: None,
            checksum: None,
        }
    }

    /// Parse the attributes from an authorization response body
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A client that performs the two-phase direct upload for one file
///
/// `create` runs the blob metadata request followed by the storage request,
/// calling the delegate it was connected with before each one. Failures are
/// reported as the raw error text, e.g. `Error storing "a.txt". Status: 423`.
pub trait StorageClient: Send + Sync {
    /// Identifier assigned to this upload
    fn id(&self) -> &str;

    /// Run one upload attempt
    fn create(&self) -> BoxFuture<'_, std::result::Result<BlobRecord, String>>;
}

/// Builds the storage client for a session
pub trait StorageConnector {
    type Client: StorageClient;

    fn connect(
        &self,
        file: &UploadFile,
        url: &str,
        delegate: Arc<dyn UploadDelegate>,
    ) -> Self::Client;
}

impl<F, C> StorageConnector for F
where
    F: Fn(&UploadFile, &str, Arc<dyn UploadDelegate>) -> C,
    C: StorageClient,
{
    type Client = C;

    fn connect(&self, file: &UploadFile, url: &str, delegate: Arc<dyn UploadDelegate>) -> C {
        self(file, url, delegate)
    }
}
