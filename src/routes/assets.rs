use std::io;
use std::path::{Path, PathBuf};

use mime::Mime;
use percent_encoding::percent_decode_str;

use crate::errors::BackendError;
use crate::mime_type;

const INDEX: &str = "index.html";

/// Reads the static asset named by `requested` (the undecoded request
/// path, without its leading slash) from under `root`.
pub async fn load(root: &Path, requested: &str) -> Result<(Vec<u8>, Mime), BackendError> {
    let mut path = resolve(root, requested)?;

    let metadata = tokio::fs::metadata(&path).await.map_err(not_found_or_unreadable)?;
    if metadata.is_dir() {
        path.push(INDEX);
    }

    // symlinks may still point outside the root
    let canonical_root = tokio::fs::canonicalize(root).await.map_err(not_found_or_unreadable)?;
    let canonical_path = tokio::fs::canonicalize(&path).await.map_err(not_found_or_unreadable)?;
    if !canonical_path.starts_with(&canonical_root) {
        return Err(BackendError::Forbidden);
    }

    let contents = tokio::fs::read(&canonical_path).await.map_err(not_found_or_unreadable)?;

    Ok((contents, mime_type::for_path(&path)))
}

/// Maps a request path onto the file system without touching it.
/// Anything that could climb out of `root` is forbidden.
pub fn resolve(root: &Path, requested: &str) -> Result<PathBuf, BackendError> {
    let decoded = percent_decode_str(requested)
        .decode_utf8()
        .map_err(|_| BackendError::Forbidden)?;

    if decoded.contains('\\') || decoded.contains('\0') {
        return Err(BackendError::Forbidden);
    }

    let mut path = root.to_path_buf();

    for segment in decoded.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(BackendError::Forbidden),
            s if s.contains(':') => return Err(BackendError::Forbidden),
            s => path.push(s),
        }
    }

    if decoded.is_empty() || decoded.ends_with('/') {
        path.push(INDEX);
    }

    Ok(path)
}

fn not_found_or_unreadable(source: io::Error) -> BackendError {
    match source.kind() {
        io::ErrorKind::NotFound => BackendError::NotFound,
        _ => BackendError::AssetUnreadable { source },
    }
}
