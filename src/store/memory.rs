use std::collections::VecDeque;
use std::sync::RwLock;

use futures::future::{self, BoxFuture, FutureExt};

use crate::errors::BackendError;
use crate::record::FeedbackRecord;
use crate::store::Store;

/// A store that keeps records in process memory. Everything is lost on
/// restart.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<VecDeque<FeedbackRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Store for MemoryStore {
    fn list(&self) -> BoxFuture<Result<Vec<FeedbackRecord>, BackendError>> {
        let records = match self.records.read() {
            Ok(records) => records.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        };

        future::ready(Ok(records)).boxed()
    }

    fn append(&self, record: FeedbackRecord) -> BoxFuture<Result<(), BackendError>> {
        match self.records.write() {
            Ok(mut records) => records.push_front(record),
            Err(poisoned) => poisoned.into_inner().push_front(record),
        }

        future::ready(Ok(())).boxed()
    }
}
