use crate::error::{DirectUploadError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The file being uploaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFile {
    pub name: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            content_type: None,
            path: None,
        }
    }

    /// Describe a file on disk from its metadata
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;

        if !metadata.is_file() {
            return Err(DirectUploadError::invalid_parameter(
                "path",
                format!("Not a regular file: {}", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                DirectUploadError::invalid_parameter(
                    "path",
                    format!("Path has no file name: {}", path.display()),
                )
            })?;

        Ok(Self {
            name,
            size: metadata.len(),
            content_type: None,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Size rounded to whole mebibytes
    pub fn size_in_megabytes(&self) -> u64 {
        let mib = bytesize::ByteSize::mib(1).as_u64();
        (self.size as f64 / mib as f64).round() as u64
    }

    /// Get a human-readable size string
    pub fn size_string(&self) -> String {
        bytesize::ByteSize::b(self.size).to_string()
    }
}

/// Where an upload is in its lifecycle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum UploadState {
    Waiting,
    Uploading { progress: f64 },
    Finished,
    Error { error: String },
}

impl UploadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Finished | UploadState::Error { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            UploadState::Waiting => "waiting",
            UploadState::Uploading { .. } => "uploading",
            UploadState::Finished => "finished",
            UploadState::Error { .. } => "error",
        }
    }

    pub fn progress(&self) -> Option<f64> {
        match self {
            UploadState::Uploading { progress } => Some(*progress),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            UploadState::Error { error } => Some(error),
            _ => None,
        }
    }
}

impl std::fmt::Display for UploadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadState::Uploading { progress } => write!(f, "uploading ({:.1}%)", progress),
            UploadState::Error { error } => write!(f, "error: {}", error),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// The full record delivered to `on_change_file`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileUpload {
    pub id: String,
    pub file: UploadFile,
    #[serde(flatten)]
    pub state: UploadState,
}

impl FileUpload {
    pub fn new(id: impl Into<String>, file: UploadFile, state: UploadState) -> Self {
        Self {
            id: id.into(),
            file,
            state,
        }
    }
}

/// Compute a percentage from a byte count, 0 when the total is unknown
pub fn progress_percentage(loaded: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (loaded as f64 / total as f64 * 100.0).min(100.0)
}
