use std::io;

use rusoto_core::RusotoError;
use rusoto_s3::{GetObjectError, ListObjectsV2Error, PutObjectError};
use thiserror::Error;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Represents a submitted field whose normalized length is out of
    /// bounds.
    #[error("{field} must be between {min} and {max} characters long")]
    Validation {
        field: &'static str,
        min: usize,
        max: usize,
    },

    /// Represents a request body that isn't a valid submission.
    #[error("Malformed feedback submission")]
    MalformedSubmission { source: serde_json::Error },

    /// Represents a failure to write to the local backing file.
    #[error("Failed to save feedback")]
    Persistence { source: io::Error },

    /// Represents a failure to serialize the records being saved.
    #[error("Failed to encode feedback")]
    Encoding { source: serde_json::Error },

    /// Represents a failure to upload a record to the remote store.
    #[error("Failed to save feedback")]
    UploadFailed { source: RusotoError<PutObjectError> },

    /// Represents a backend that cannot be used as configured.
    #[error("Feedback is unavailable: {0}")]
    Configuration(String),

    /// Represents a missing static asset.
    #[error("Not found")]
    NotFound,

    /// Represents a static asset path that escapes the site root.
    #[error("Forbidden")]
    Forbidden,

    /// Represents a failure to read a static asset that exists.
    #[error("Failed to read asset")]
    AssetUnreadable { source: io::Error },
}

/// Enumerates errors raised while reading a backing medium. These are
/// logged and never reach clients, since reads degrade to whatever
/// could be recovered.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Represents a failure to read local data.
    #[error("Read error")]
    ReadError { source: io::Error },

    /// Represents data that isn't what the store expects.
    #[error("Content parsing error")]
    ContentParsingError { source: serde_json::Error },

    /// Represents an error returned by the remote server when listing.
    #[error("List error")]
    ListError { source: RusotoError<ListObjectsV2Error> },

    /// Represents an error returned by the remote server when
    /// downloading.
    #[error("Download error")]
    DownloadError { source: RusotoError<GetObjectError> },

    /// Represents a remote object without a body.
    #[error("Empty document")]
    EmptyDocument,
}
