//! Upload session lifecycle
//!
//! An [`UploadSession`] owns one file and one storage client. Construction
//! connects the client and announces the `waiting` state; [`UploadSession::start`]
//! then drives the client until the upload finishes or fails for good, retrying
//! locked and rate-limited attempts without telling the caller.

use crate::callback::{
    ChangeFileCallback, ProgressEvent, RequestEvent, UploadDelegate, UploadRequest,
};
use crate::config::{authorization_url, DirectUploadOptions, DEFAULT_DIRECT_UPLOADS_PATH};
use crate::error::{DirectUploadError, Result};
use crate::storage::{StorageClient, StorageConnector};
use crate::upload::retry::{
    classify_failure, normalize_phase, quota_message, BackoffPolicy, DefaultBackoff, FailureKind,
};
use crate::upload::types::{progress_percentage, FileUpload, UploadFile, UploadState};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// State shared between the session and the hooks it hands to the storage client
struct SessionCore {
    id: OnceLock<String>,
    file: UploadFile,
    options: DirectUploadOptions,
    on_change_file: ChangeFileCallback,
    state: Mutex<UploadState>,
    /// Bumped before every `create` call; listeners from older attempts go quiet
    attempt: AtomicU64,
}

impl SessionCore {
    fn id(&self) -> &str {
        self.id.get().map(String::as_str).unwrap_or_default()
    }

    fn state(&self) -> UploadState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Record the new state and notify the caller exactly once
    fn transition(&self, state: UploadState) {
        log::debug!("Upload {} ({}): {}", self.id(), self.file.name, state);

        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state.clone();
        self.notify(state);
    }

    /// Move to `uploading` unless the report is stale or the session has settled
    fn report_progress(&self, attempt: u64, event: ProgressEvent) {
        let state = {
            let mut current = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if current.is_terminal() || self.attempt.load(Ordering::SeqCst) != attempt {
                log::trace!(
                    "Upload {}: dropped progress {}/{}",
                    self.id(),
                    event.loaded,
                    event.total
                );
                return;
            }

            let state = UploadState::Uploading {
                progress: progress_percentage(event.loaded, event.total),
            };
            *current = state.clone();
            state
        };

        log::debug!("Upload {} ({}): {}", self.id(), self.file.name, state);
        self.notify(state);
    }

    fn begin_attempt(&self) {
        self.attempt.fetch_add(1, Ordering::SeqCst);
    }

    fn notify(&self, state: UploadState) {
        let record = FileUpload::new(self.id(), self.file.clone(), state);
        (self.on_change_file)(HashMap::from([(self.id().to_string(), record)]));
    }
}

/// The delegate given to the storage client
struct SessionHooks {
    core: Arc<SessionCore>,
}

impl UploadDelegate for SessionHooks {
    fn before_blob_request(&self, request: &mut dyn UploadRequest) {
        if let Some(headers) = &self.core.options.headers {
            for (name, value) in headers {
                request.set_request_header(name, value);
            }
        }

        if let Some(hook) = &self.core.options.on_before_blob_request {
            hook(RequestEvent {
                id: self.core.id(),
                file: &self.core.file,
                request: &mut *request,
            });
        }
    }

    fn before_storage_request(&self, request: &mut dyn UploadRequest) {
        if let Some(hook) = &self.core.options.on_before_storage_request {
            hook(RequestEvent {
                id: self.core.id(),
                file: &self.core.file,
                request: &mut *request,
            });
        }

        let attempt = self.core.attempt.load(Ordering::SeqCst);
        let core = self.core.clone();
        request.on_upload_progress(Box::new(move |event: ProgressEvent| {
            core.report_progress(attempt, event);
        }));
    }
}

/// A single file's direct upload
pub struct UploadSession<C: StorageClient> {
    core: Arc<SessionCore>,
    client: C,
    backoff: Arc<dyn BackoffPolicy>,
    url: String,
}

impl<C: StorageClient> std::fmt::Debug for UploadSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadSession")
            .field("id", &self.core.id())
            .field("file", &self.core.file)
            .field("state", &self.core.state())
            .field("url", &self.url)
            .finish()
    }
}

impl<C: StorageClient> UploadSession<C> {
    /// Create a session and connect its storage client
    ///
    /// Unset options fall back to [`DirectUploadOptions::defaults`]. The
    /// caller's `on_change_file` receives the `waiting` state before this
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns [`DirectUploadError::InvalidParameter`] if `on_change_file` is
    /// missing.
    pub fn new<S>(file: UploadFile, options: DirectUploadOptions, connector: S) -> Result<Self>
    where
        S: StorageConnector<Client = C>,
    {
        let options = options.merge_defaults(&DirectUploadOptions::defaults());
        options.validate()?;

        let on_change_file = options.on_change_file.clone().ok_or_else(|| {
            DirectUploadError::invalid_parameter(
                "on_change_file",
                "A change notification callback is required",
            )
        })?;

        let url = authorization_url(
            &options.origin.clone().unwrap_or_default(),
            options
                .direct_uploads_path
                .as_deref()
                .unwrap_or(DEFAULT_DIRECT_UPLOADS_PATH),
        );

        let core = Arc::new(SessionCore {
            id: OnceLock::new(),
            file,
            options,
            on_change_file,
            state: Mutex::new(UploadState::Waiting),
            attempt: AtomicU64::new(0),
        });

        let delegate: Arc<dyn UploadDelegate> = Arc::new(SessionHooks { core: core.clone() });
        let client = connector.connect(&core.file, &url, delegate);
        let _ = core.id.set(client.id().to_string());

        log::debug!(
            "Connected upload {} for {} ({}) to {}",
            core.id(),
            core.file.name,
            core.file.size_string(),
            url
        );
        core.transition(UploadState::Waiting);

        Ok(Self {
            core,
            client,
            backoff: Arc::new(DefaultBackoff::default()),
            url,
        })
    }

    /// Replace the backoff policy used for locked and rate-limited attempts
    pub fn with_backoff<B>(mut self, backoff: B) -> Self
    where
        B: BackoffPolicy + 'static,
    {
        self.backoff = Arc::new(backoff);
        self
    }

    pub fn id(&self) -> &str {
        self.core.id()
    }

    pub fn file(&self) -> &UploadFile {
        &self.core.file
    }

    /// The authorization URL the client was connected with
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> UploadState {
        self.core.state()
    }

    /// The record most recently sent to `on_change_file`
    pub fn snapshot(&self) -> FileUpload {
        FileUpload::new(self.core.id(), self.core.file.clone(), self.core.state())
    }

    /// Run the upload to completion
    ///
    /// Resolves with the blob's signed id. Locked (423) and rate-limited (429)
    /// attempts are retried after the backoff policy's delay; a quota failure
    /// (413) or any other error moves the session to `error` and is returned.
    pub async fn start(&self) -> Result<String> {
        let mut retries: u32 = 0;

        loop {
            self.core.begin_attempt();
            let failure = match self.client.create().await {
                Ok(blob) => {
                    self.core.transition(UploadState::Finished);
                    return Ok(blob.signed_id);
                }
                Err(failure) => normalize_phase(&failure),
            };

            match classify_failure(&failure) {
                FailureKind::QuotaExceeded => {
                    let message = quota_message(&failure, self.core.file.size_in_megabytes());
                    return Err(self.fail(DirectUploadError::quota_exceeded(message)));
                }
                FailureKind::Transient(kind) => {
                    retries = next_retry(retries);
                    if !self.backoff.should_retry(kind, retries) {
                        return Err(
                            self.fail(DirectUploadError::retries_exhausted(failure, retries - 1))
                        );
                    }

                    let delay = self.backoff.delay(kind, retries);
                    log::warn!(
                        "Upload {} {}, retry {} in {}ms",
                        self.id(),
                        kind,
                        retries,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                FailureKind::Other => {
                    return Err(self.fail(DirectUploadError::upload_failed(failure)));
                }
            }
        }
    }

    fn fail(&self, error: DirectUploadError) -> DirectUploadError {
        log::error!("Upload {} failed: {}", self.id(), error);
        self.core.transition(UploadState::Error {
            error: error.to_string(),
        });
        error
    }
}

/// Retries are unbounded by default, so the count stops at `u32::MAX`
fn next_retry(retries: u32) -> u32 {
    retries.saturating_add(1)
}
