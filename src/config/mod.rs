//! Session configuration
//!
//! Options are merged functionally over an immutable default value, and the
//! authorization URL is derived from the merged origin and path.

pub mod options;
pub mod url;

pub use options::{DirectUploadOptions, Origin, DEFAULT_DIRECT_UPLOADS_PATH};
pub use url::authorization_url;
