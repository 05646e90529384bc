//! Storage client boundary
//!
//! The crate does not speak the storage wire protocol itself. Sessions drive a
//! [`StorageClient`] built by a [`StorageConnector`] and react to the error
//! text it reports.

pub mod client;

pub use client::{BlobRecord, StorageClient, StorageConnector};
