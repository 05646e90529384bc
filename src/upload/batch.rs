//! Running several upload sessions together
//!
//! Sessions in a batch share nothing. A terminal failure of one file is
//! recorded in the outcome and never stops its siblings.

use crate::error::DirectUploadError;
use crate::storage::StorageClient;
use crate::upload::session::UploadSession;
use crate::upload::types::UploadFile;
use futures::future::join_all;

/// A file that ended in the `error` state
#[derive(Debug)]
pub struct BatchFailure {
    pub id: String,
    pub file: UploadFile,
    pub error: DirectUploadError,
}

/// What a batch produced
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Signed ids of the finished uploads, in the order the sessions were added
    pub signed_ids: Vec<String>,
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A set of upload sessions started together
pub struct UploadBatch<C: StorageClient> {
    sessions: Vec<UploadSession<C>>,
}

impl<C: StorageClient> Default for UploadBatch<C> {
    fn default() -> Self {
        Self {
            sessions: Vec::new(),
        }
    }
}

impl<C: StorageClient> UploadBatch<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, session: UploadSession<C>) {
        self.sessions.push(session);
    }

    pub fn session(mut self, session: UploadSession<C>) -> Self {
        self.push(session);
        self
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn sessions(&self) -> &[UploadSession<C>] {
        &self.sessions
    }

    /// Start every session concurrently and wait for all of them to settle
    pub async fn run(&self) -> BatchOutcome {
        let results = join_all(self.sessions.iter().map(|session| session.start())).await;

        let mut outcome = BatchOutcome::default();
        for (session, result) in self.sessions.iter().zip(results) {
            match result {
                Ok(signed_id) => outcome.signed_ids.push(signed_id),
                Err(error) => outcome.failures.push(BatchFailure {
                    id: session.id().to_string(),
                    file: session.file().clone(),
                    error,
                }),
            }
        }

        log::info!(
            "Upload batch settled: {} finished, {} failed",
            outcome.signed_ids.len(),
            outcome.failures.len()
        );

        outcome
    }
}
