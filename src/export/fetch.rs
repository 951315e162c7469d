use std::collections::HashMap;
use std::path::PathBuf;

use futures::future::{FutureExt, LocalBoxFuture};

use crate::foundation::error::FetchError;

/// Asynchronous source of bundle files, addressed by relative path.
pub trait AssetFetcher {
    /// Fetch the bytes at `path`.
    fn fetch(&self, path: String) -> LocalBoxFuture<'_, Result<Vec<u8>, FetchError>>;
}

/// Normalize a relative asset path: forward slashes, no `.` segments, no `..`, not absolute.
pub fn normalize_rel_path(source: &str) -> Result<String, FetchError> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(FetchError::new(source, "asset paths must be relative"));
    }
    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(FetchError::new(source, "asset paths must not contain '..'"));
        }
        out.push(part);
    }
    if out.is_empty() {
        return Err(FetchError::new(source, "asset path must contain a file name"));
    }
    Ok(out.join("/"))
}

/// Reads assets from a directory on disk.
#[derive(Clone, Debug)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    /// Fetcher rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetFetcher for FsFetcher {
    fn fetch(&self, path: String) -> LocalBoxFuture<'_, Result<Vec<u8>, FetchError>> {
        async move {
            let rel = normalize_rel_path(&path)?;
            let full = self.root.join(rel);
            tracing::debug!(path = %full.display(), "fetch asset");
            std::fs::read(&full).map_err(|e| FetchError::new(path, e.to_string()))
        }
        .boxed_local()
    }
}

/// Serves assets from memory. Missing paths fail like a 404.
#[derive(Clone, Debug, Default)]
pub struct MemoryFetcher {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryFetcher {
    /// Empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file under its normalized path.
    pub fn with_file(mut self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        let key = normalize_rel_path(path).unwrap_or_else(|_| path.to_owned());
        self.files.insert(key, bytes.into());
        self
    }
}

impl AssetFetcher for MemoryFetcher {
    fn fetch(&self, path: String) -> LocalBoxFuture<'_, Result<Vec<u8>, FetchError>> {
        let found = normalize_rel_path(&path).and_then(|rel| {
            self.files
                .get(&rel)
                .cloned()
                .ok_or_else(|| FetchError::new(path.clone(), "not found"))
        });
        futures::future::ready(found).boxed_local()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/fetch.rs"]
mod tests;
