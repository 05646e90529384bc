//! Upload configuration structures

use crate::callback::{ChangeFileCallback, RequestEvent, RequestHook};
use crate::error::{DirectUploadError, Result};
use crate::upload::types::FileUpload;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Conventional Active Storage endpoint for direct upload authorization
pub const DEFAULT_DIRECT_UPLOADS_PATH: &str = "/rails/active_storage/direct_uploads";

/// Where the authorization endpoint lives
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl Origin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    fn merge_defaults(self, defaults: &Origin) -> Self {
        Self {
            protocol: self.protocol.or_else(|| defaults.protocol.clone()),
            host: self.host.or_else(|| defaults.host.clone()),
            port: self.port.or(defaults.port),
        }
    }
}

/// Configuration for an upload session
///
/// Only `origin`, `directUploadsPath` and `headers` take part in
/// (de)serialization; callbacks are attached with the builder methods.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectUploadOptions {
    /// Origin of the authorization endpoint (default: none, protocol-relative)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,

    /// Path of the authorization endpoint
    /// (default: `/rails/active_storage/direct_uploads`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_uploads_path: Option<String>,

    /// Extra headers for the blob metadata request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,

    #[serde(skip)]
    pub on_before_blob_request: Option<RequestHook>,

    #[serde(skip)]
    pub on_before_storage_request: Option<RequestHook>,

    #[serde(skip)]
    pub on_change_file: Option<ChangeFileCallback>,
}

impl std::fmt::Debug for DirectUploadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectUploadOptions")
            .field("origin", &self.origin)
            .field("direct_uploads_path", &self.direct_uploads_path)
            .field("headers", &self.headers)
            .field(
                "on_before_blob_request",
                &self.on_before_blob_request.is_some(),
            )
            .field(
                "on_before_storage_request",
                &self.on_before_storage_request.is_some(),
            )
            .field("on_change_file", &self.on_change_file.is_some())
            .finish()
    }
}

impl DirectUploadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The values used for every field the caller leaves unset
    pub fn defaults() -> Self {
        Self {
            origin: Some(Origin::default()),
            direct_uploads_path: Some(DEFAULT_DIRECT_UPLOADS_PATH.to_string()),
            headers: Some(BTreeMap::new()),
            on_before_blob_request: None,
            on_before_storage_request: None,
            on_change_file: None,
        }
    }

    /// Parse the serializable part of the options from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn direct_uploads_path(mut self, path: impl Into<String>) -> Self {
        self.direct_uploads_path = Some(path.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn on_before_blob_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(RequestEvent<'_>) + Send + Sync + 'static,
    {
        self.on_before_blob_request = Some(Arc::new(hook));
        self
    }

    pub fn on_before_storage_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(RequestEvent<'_>) + Send + Sync + 'static,
    {
        self.on_before_storage_request = Some(Arc::new(hook));
        self
    }

    pub fn on_change_file<F>(mut self, callback: F) -> Self
    where
        F: Fn(HashMap<String, FileUpload>) + Send + Sync + 'static,
    {
        self.on_change_file = Some(Arc::new(callback));
        self
    }

    /// Fill every absent field from `defaults`
    ///
    /// Present values are kept as-is, including empty strings and maps.
    pub fn merge_defaults(self, defaults: &DirectUploadOptions) -> Self {
        let origin = match (self.origin, &defaults.origin) {
            (Some(origin), Some(fallback)) => Some(origin.merge_defaults(fallback)),
            (origin, fallback) => origin.or_else(|| fallback.clone()),
        };

        Self {
            origin,
            direct_uploads_path: self
                .direct_uploads_path
                .or_else(|| defaults.direct_uploads_path.clone()),
            headers: self.headers.or_else(|| defaults.headers.clone()),
            on_before_blob_request: self
                .on_before_blob_request
                .or_else(|| defaults.on_before_blob_request.clone()),
            on_before_storage_request: self
                .on_before_storage_request
                .or_else(|| defaults.on_before_storage_request.clone()),
            on_change_file: self
                .on_change_file
                .or_else(|| defaults.on_change_file.clone()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.on_change_file.is_none() {
            return Err(DirectUploadError::invalid_parameter(
                "on_change_file",
                "A change notification callback is required",
            ));
        }

        Ok(())
    }
}
