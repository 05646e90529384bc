//! Callback contracts shared between sessions, callers and storage clients
//!
//! The storage client owns the actual HTTP requests. It hands each in-flight
//! request to an [`UploadDelegate`] right before sending it, which lets the
//! session attach headers and progress listeners without knowing anything
//! about the transport.

use crate::upload::types::{FileUpload, UploadFile};
use std::collections::HashMap;
use std::sync::Arc;

/// A single transport progress report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Bytes sent so far
    pub loaded: u64,
    /// Total bytes to send
    pub total: u64,
}

impl ProgressEvent {
    pub fn new(loaded: u64, total: u64) -> Self {
        Self { loaded, total }
    }
}

/// Listener attached to a request's upload-progress event
pub type ProgressListener = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// An outgoing request exposed by the storage client to the delegate hooks
pub trait UploadRequest: Send {
    /// Set a header on the outgoing request
    fn set_request_header(&mut self, name: &str, value: &str);

    /// Subscribe to the request's upload-progress event
    fn on_upload_progress(&mut self, listener: ProgressListener);
}

/// Hooks a storage client calls at each of its two request phases
pub trait UploadDelegate: Send + Sync {
    /// Called before the blob metadata request is sent
    fn before_blob_request(&self, request: &mut dyn UploadRequest);

    /// Called before the binary storage request is sent
    fn before_storage_request(&self, request: &mut dyn UploadRequest);
}

/// What a request hook receives
pub struct RequestEvent<'a> {
    pub id: &'a str,
    pub file: &'a UploadFile,
    pub request: &'a mut dyn UploadRequest,
}

impl std::fmt::Debug for RequestEvent<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestEvent")
            .field("id", &self.id)
            .field("file", &self.file)
            .finish_non_exhaustive()
    }
}

/// Caller hook invoked before one of the storage client's requests
pub type RequestHook = Arc<dyn Fn(RequestEvent<'_>) + Send + Sync>;

/// Caller hook invoked on every state transition, with a single-entry map
/// from upload id to the full upload record
pub type ChangeFileCallback = Arc<dyn Fn(HashMap<String, FileUpload>) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct RecordingRequest {
        headers: Vec<(String, String)>,
        listeners: Vec<ProgressListener>,
    }

    impl UploadRequest for RecordingRequest {
        fn set_request_header(&mut self, name: &str, value: &str) {
            self.headers.push((name.to_string(), value.to_string()));
        }

        fn on_upload_progress(&mut self, listener: ProgressListener) {
            self.listeners.push(listener);
        }
    }

    #[test]
    fn test_request_hook_can_mutate_request() {
        let hook: RequestHook = Arc::new(|event: RequestEvent<'_>| {
            event.request.set_request_header("X-Upload-Id", event.id);
        });

        let file = UploadFile::new("notes.txt", 12);
        let mut request = RecordingRequest::default();
        hook(RequestEvent {
            id: "abc",
            file: &file,
            request: &mut request,
        });

        assert_eq!(
            request.headers,
            vec![("X-Upload-Id".to_string(), "abc".to_string())]
        );
    }

    #[test]
    fn test_progress_listener_receives_events() {
        let seen = Arc::new(AtomicU64::new(0));
        let seen_clone = seen.clone();

        let mut request = RecordingRequest::default();
        request.on_upload_progress(Box::new(move |event: ProgressEvent| {
            seen_clone.store(event.loaded, Ordering::SeqCst);
        }));

        for listener in &request.listeners {
            listener(ProgressEvent::new(42, 100));
        }

        assert_eq!(seen.load(Ordering::SeqCst), 42);
    }
}
