use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use futures::future::{BoxFuture, FutureExt};
use log::{debug, error, info, warn, Logger};
use serde_json::Value;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use crate::errors::{BackendError, StoreError};
use crate::record::FeedbackRecord;
use crate::store::{sort_newest_first, Store};

/// A store that keeps its records in a JSON array file, newest first.
///
/// The file is the only copy: every operation re-reads it, so records
/// written by another store on the same path (such as the import tool)
/// are never dropped. Appends rewrite it through a temporary file that
/// is renamed into place and are serialized within the process.
pub struct JsonFileStore {
    logger: Arc<Logger>,
    path: PathBuf,
    lock: Mutex<()>,
}

#[derive(Default)]
struct State {
    /// The records that could be read, newest first.
    records: Vec<FeedbackRecord>,

    /// Array entries that aren't valid records, written back verbatim
    /// after the records.
    unreadable: Vec<Value>,

    /// Set when the existing file couldn't be interpreted at all; it
    /// gets moved aside before the next write.
    set_aside: bool,
}

impl JsonFileStore {
    /// Opens the file at `path`, creating it (and its directory) if it
    /// doesn't exist yet.
    pub async fn open(logger: Arc<Logger>, path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let path = path.as_ref().to_path_buf();
        let logger = Arc::new(logger.new(log::o!("data_file" => path.display().to_string())));

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| BackendError::Persistence { source })?;
        }

        match tokio::fs::metadata(&path).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(logger, "Creating empty feedback file...");
                tokio::fs::write(&path, b"[]")
                    .await
                    .map_err(|source| BackendError::Persistence { source })?;
            }
            _ => {}
        }

        let store = JsonFileStore {
            logger,
            path,
            lock: Mutex::new(()),
        };

        let state = read_state(&store).await;
        debug!(store.logger, "Loaded feedback"; "records" => state.records.len(), "unreadable" => state.unreadable.len());

        Ok(store)
    }
}

impl Store for JsonFileStore {
    fn list(&self) -> BoxFuture<Result<Vec<FeedbackRecord>, BackendError>> {
        list(self).boxed()
    }

    fn append(&self, record: FeedbackRecord) -> BoxFuture<Result<(), BackendError>> {
        append(self, record).boxed()
    }
}

async fn list(store: &JsonFileStore) -> Result<Vec<FeedbackRecord>, BackendError> {
    let _guard = store.lock.lock().await;

    Ok(read_state(store).await.records)
}

async fn append(store: &JsonFileStore, record: FeedbackRecord) -> Result<(), BackendError> {
    let _guard = store.lock.lock().await;

    let State {
        mut records,
        unreadable,
        set_aside,
    } = read_state(store).await;

    records.push(record);
    sort_newest_first(&mut records);

    let mut values = Vec::with_capacity(records.len() + unreadable.len());
    for record in records.iter() {
        values.push(to_value(record)?);
    }
    values.extend(unreadable);

    let raw = serde_json::to_vec_pretty(&values).map_err(|source| BackendError::Encoding { source })?;

    let path = store.path.clone();
    let moved_to = tokio::task::spawn_blocking(move || write_atomically(&path, set_aside, &raw))
        .await
        .map_err(|e| BackendError::Persistence {
            source: io::Error::new(io::ErrorKind::Other, e),
        })??;

    if let Some(moved_to) = moved_to {
        warn!(store.logger, "Moved unreadable feedback file aside"; "moved_to" => %moved_to.display());
    }

    Ok(())
}

/// Reads the current file contents. A missing file holds nothing.
async fn read_state(store: &JsonFileStore) -> State {
    match tokio::fs::read(&store.path).await {
        Ok(raw) => load_state(&store.logger, &raw),
        Err(e) if e.kind() == io::ErrorKind::NotFound => State::default(),
        Err(source) => {
            error!(store.logger, "Could not read feedback file"; "error" => %StoreError::ReadError { source });
            State {
                set_aside: true,
                ..Default::default()
            }
        }
    }
}

fn to_value(record: &FeedbackRecord) -> Result<Value, BackendError> {
    serde_json::to_value(record).map_err(|source| BackendError::Encoding { source })
}

/// Interprets the raw file contents, skipping entries that aren't
/// records.
fn load_state(logger: &Logger, raw: &[u8]) -> State {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return State::default();
    }

    let entries = match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) => {
            error!(logger, "Feedback file does not contain an array");
            return State {
                set_aside: true,
                ..Default::default()
            };
        }
        Err(source) => {
            error!(logger, "Could not parse feedback file"; "error" => %StoreError::ContentParsingError { source });
            return State {
                set_aside: true,
                ..Default::default()
            };
        }
    };

    let mut state = State::default();

    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<FeedbackRecord>(entry.clone()) {
            Ok(record) => state.records.push(record),
            Err(e) => {
                warn!(logger, "Skipping malformed feedback entry"; "index" => index, "error" => %e);
                state.unreadable.push(entry);
            }
        }
    }

    sort_newest_first(&mut state.records);

    state
}

/// Replaces the file at `path` with `raw`. If `set_aside` is true, the
/// current file is first renamed out of the way and its new path is
/// returned.
fn write_atomically(path: &Path, set_aside: bool, raw: &[u8]) -> Result<Option<PathBuf>, BackendError> {
    let to_error = |source: io::Error| BackendError::Persistence { source };

    let moved_to = if set_aside && path.exists() {
        let destination = corrupt_path(path);
        std::fs::rename(path, &destination).map_err(to_error)?;
        Some(destination)
    } else {
        None
    };

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(directory).map_err(to_error)?;
    file.write_all(raw).map_err(to_error)?;
    file.as_file().sync_all().map_err(to_error)?;
    file.persist(path).map_err(|e| to_error(e.error))?;

    Ok(moved_to)
}

fn corrupt_path(path: &Path) -> PathBuf {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "feedbacks.json".to_owned());

    path.with_file_name(format!("{}.corrupt-{}", name, seconds))
}
