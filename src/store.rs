use std::path::PathBuf;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use log::{info, warn, Logger};

use crate::config::StoreKind;
use crate::errors::BackendError;
use crate::record::FeedbackRecord;

pub mod blocks;
pub mod file;
pub mod memory;
pub mod s3;

pub use self::file::JsonFileStore;
pub use self::memory::MemoryStore;
pub use self::s3::S3Store;

/// Holds every feedback record for one backing medium.
///
/// Reads never fail because of the medium itself: unreadable data is
/// logged and whatever could be recovered is returned, so `list` only
/// errors when the store can't be used at all. Writes must not lose
/// records that were already stored.
pub trait Store: Send + Sync {
    /// Returns all records, newest first.
    fn list(&self) -> BoxFuture<Result<Vec<FeedbackRecord>, BackendError>>;

    /// Durably adds a record.
    fn append(&self, record: FeedbackRecord) -> BoxFuture<Result<(), BackendError>>;
}

/// Where a store keeps its data.
#[derive(Clone, Debug)]
pub struct StoreSettings {
    pub kind: StoreKind,
    pub data_file: PathBuf,
}

/// Opens the configured store. A remote store that lacks settings is
/// replaced by [`Unavailable`] so the site still comes up; local
/// failures to prepare the data file are returned.
pub async fn open(
    logger: Arc<Logger>,
    settings: &StoreSettings,
) -> Result<Arc<dyn Store>, BackendError> {
    match settings.kind {
        StoreKind::Memory => {
            info!(logger, "Keeping feedback in memory...");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreKind::File => {
            info!(logger, "Opening feedback file..."; "path" => %settings.data_file.display());
            let store = JsonFileStore::open(logger.clone(), &settings.data_file).await?;
            Ok(Arc::new(store))
        }
        StoreKind::Remote => match S3Store::from_env(logger.clone()) {
            Ok(store) => {
                info!(logger, "Using remote feedback store..."; "bucket" => store.bucket());
                Ok(Arc::new(store))
            }
            Err(BackendError::Configuration(reason)) => {
                warn!(logger, "Remote feedback store is not configured"; "reason" => &reason);
                Ok(Arc::new(Unavailable::new(reason)))
            }
            Err(e) => Err(e),
        },
    }
}

/// Stands in for a store that couldn't be configured.
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Unavailable {
            reason: reason.into(),
        }
    }
}

impl Store for Unavailable {
    fn list(&self) -> BoxFuture<Result<Vec<FeedbackRecord>, BackendError>> {
        future::ready(Err(BackendError::Configuration(self.reason.clone()))).boxed()
    }

    fn append(&self, _record: FeedbackRecord) -> BoxFuture<Result<(), BackendError>> {
        future::ready(Err(BackendError::Configuration(self.reason.clone()))).boxed()
    }
}

/// Orders records newest first. Records without a creation time sort
/// after the rest; ties fall back to the ID, which also increases with
/// time.
pub fn sort_newest_first(records: &mut [FeedbackRecord]) {
    records.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.id().cmp(a.id()))
    });
}
