//! Direct upload sessions
//!
//! This module provides the per-file upload state machine, the retry policy
//! it uses for transient storage failures, and batch helpers.

pub mod batch;
pub mod retry;
pub mod session;
pub mod types;

pub use batch::{BatchFailure, BatchOutcome, UploadBatch};
pub use retry::{
    classify_failure, normalize_phase, BackoffPolicy, DefaultBackoff, FailureKind, FixedBackoff,
    TransientFailure,
};
pub use session::UploadSession;
pub use types::{FileUpload, UploadFile, UploadState};
