//! Scripted storage client shared by the integration tests

#![allow(dead_code)]

use direct_upload::{
    BlobRecord, DirectUploadOptions, FileUpload, ProgressEvent, ProgressListener,
    StorageClient, StorageConnector, UploadDelegate, UploadFile, UploadRequest,
};
use futures::future::BoxFuture;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted outcome of `create`
#[derive(Debug, Clone)]
pub enum Step {
    /// Blob request fails with this text
    Fail(String),
    /// Blob request succeeds, storage request fails with this text
    FailStorage(String),
    /// Both phases succeed; progress reports are emitted during storage
    Succeed {
        signed_id: String,
        progress: Vec<(u64, u64)>,
    },
}

impl Step {
    pub fn fail(message: impl Into<String>) -> Self {
        Step::Fail(message.into())
    }

    pub fn fail_storage(message: impl Into<String>) -> Self {
        Step::FailStorage(message.into())
    }

    pub fn succeed(signed_id: impl Into<String>) -> Self {
        Step::Succeed {
            signed_id: signed_id.into(),
            progress: Vec::new(),
        }
    }

    pub fn succeed_with_progress(signed_id: impl Into<String>, progress: &[(u64, u64)]) -> Self {
        Step::Succeed {
            signed_id: signed_id.into(),
            progress: progress.to_vec(),
        }
    }
}

/// What the tests can observe about the client
#[derive(Clone, Default)]
pub struct Tracker {
    pub create_calls: Arc<AtomicUsize>,
    pub urls: Arc<Mutex<Vec<String>>>,
    pub blob_headers: Arc<Mutex<Vec<(String, String)>>>,
    pub storage_headers: Arc<Mutex<Vec<(String, String)>>>,
    pub listeners_per_attempt: Arc<Mutex<Vec<usize>>>,
    /// Listeners kept after their request completed
    pub finished_listeners: Arc<Mutex<Vec<ProgressListener>>>,
}

impl Tracker {
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    pub fn blob_headers(&self) -> Vec<(String, String)> {
        self.blob_headers.lock().unwrap().clone()
    }

    pub fn storage_headers(&self) -> Vec<(String, String)> {
        self.storage_headers.lock().unwrap().clone()
    }

    pub fn listeners_per_attempt(&self) -> Vec<usize> {
        self.listeners_per_attempt.lock().unwrap().clone()
    }

    /// Deliver a late progress report to every finished request's listeners
    pub fn report_late_progress(&self, loaded: u64, total: u64) {
        for listener in self.finished_listeners.lock().unwrap().iter() {
            listener(ProgressEvent::new(loaded, total));
        }
    }
}

#[derive(Default)]
struct MockRequest {
    headers: Vec<(String, String)>,
    listeners: Vec<ProgressListener>,
}

impl UploadRequest for MockRequest {
    fn set_request_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn on_upload_progress(&mut self, listener: ProgressListener) {
        self.listeners.push(listener);
    }
}

pub struct MockClient {
    id: String,
    delegate: Arc<dyn UploadDelegate>,
    script: Mutex<VecDeque<Step>>,
    tracker: Tracker,
}

impl StorageClient for MockClient {
    fn id(&self) -> &str {
        &self.id
    }

    fn create(&self) -> BoxFuture<'_, Result<BlobRecord, String>> {
        Box::pin(async move {
            self.tracker.create_calls.fetch_add(1, Ordering::SeqCst);

            let mut blob_request = MockRequest::default();
            self.delegate.before_blob_request(&mut blob_request);
            self.tracker
                .blob_headers
                .lock()
                .unwrap()
                .extend(blob_request.headers);

            let step = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Step::fail("Script exhausted"));

            let (signed_id, progress) = match step {
                Step::Fail(message) => return Err(message),
                Step::FailStorage(message) => {
                    let storage_request = self.storage_request();
                    self.keep_listeners(storage_request);
                    return Err(message);
                }
                Step::Succeed {
                    signed_id,
                    progress,
                } => (signed_id, progress),
            };

            let storage_request = self.storage_request();
            for (loaded, total) in progress {
                for listener in &storage_request.listeners {
                    listener(ProgressEvent::new(loaded, total));
                }
            }
            self.keep_listeners(storage_request);

            Ok(BlobRecord::new(signed_id))
        })
    }
}

impl MockClient {
    fn storage_request(&self) -> MockRequest {
        let mut request = MockRequest::default();
        self.delegate.before_storage_request(&mut request);
        self.tracker
            .listeners_per_attempt
            .lock()
            .unwrap()
            .push(request.listeners.len());
        self.tracker
            .storage_headers
            .lock()
            .unwrap()
            .extend(request.headers.iter().cloned());
        request
    }

    fn keep_listeners(&self, request: MockRequest) {
        self.tracker
            .finished_listeners
            .lock()
            .unwrap()
            .extend(request.listeners);
    }
}

pub struct MockConnector {
    pub id: String,
    pub script: Vec<Step>,
    pub tracker: Tracker,
}

impl MockConnector {
    pub fn new(id: impl Into<String>, script: Vec<Step>) -> Self {
        Self {
            id: id.into(),
            script,
            tracker: Tracker::default(),
        }
    }

    pub fn tracker(&self) -> Tracker {
        self.tracker.clone()
    }
}

impl StorageConnector for MockConnector {
    type Client = MockClient;

    fn connect(
        &self,
        _file: &UploadFile,
        url: &str,
        delegate: Arc<dyn UploadDelegate>,
    ) -> MockClient {
        self.tracker.urls.lock().unwrap().push(url.to_string());
        MockClient {
            id: self.id.clone(),
            delegate,
            script: Mutex::new(self.script.iter().cloned().collect()),
            tracker: self.tracker.clone(),
        }
    }
}

/// Collects every `on_change_file` notification
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<HashMap<String, FileUpload>>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(&self) -> DirectUploadOptions {
        let events = self.events.clone();
        DirectUploadOptions::new().on_change_file(move |change| {
            events.lock().unwrap().push(change);
        })
    }

    pub fn events(&self) -> Vec<HashMap<String, FileUpload>> {
        self.events.lock().unwrap().clone()
    }

    /// Every notification flattened to its single record
    pub fn records(&self) -> Vec<FileUpload> {
        self.events()
            .into_iter()
            .map(|change| {
                assert_eq!(change.len(), 1, "notifications carry exactly one entry");
                change.into_values().next().unwrap()
            })
            .collect()
    }

    pub fn states(&self) -> Vec<&'static str> {
        self.records().iter().map(|r| r.state.name()).collect()
    }
}

pub fn sample_file(size: u64) -> UploadFile {
    UploadFile::new("report.pdf", size).content_type("application/pdf")
}
