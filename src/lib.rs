pub mod callback;
pub mod config;
pub mod error;
pub mod storage;
pub mod upload;

pub use callback::{
    ChangeFileCallback, ProgressEvent, ProgressListener, RequestEvent, RequestHook,
    UploadDelegate, UploadRequest,
};

pub use config::{authorization_url, DirectUploadOptions, Origin, DEFAULT_DIRECT_UPLOADS_PATH};

pub use error::{DirectUploadError, Result};

pub use storage::{BlobRecord, StorageClient, StorageConnector};

pub use upload::{
    BackoffPolicy, BatchFailure, BatchOutcome, DefaultBackoff, FailureKind, FileUpload,
    FixedBackoff, TransientFailure, UploadBatch, UploadFile, UploadSession, UploadState,
};
