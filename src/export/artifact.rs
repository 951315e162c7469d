use std::cell::RefCell;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{GenSceneError, GenSceneResult};

/// A finished export file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Download file name.
    pub file_name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Summary of an artifact handed to a sink, reported back to the core.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedArtifact {
    /// Download file name.
    pub file_name: String,
    /// Size in bytes.
    pub len: usize,
}

impl From<&Artifact> for SavedArtifact {
    fn from(a: &Artifact) -> Self {
        Self {
            file_name: a.file_name.clone(),
            len: a.bytes.len(),
        }
    }
}

/// Destination of export artifacts (a download prompt, a directory, a test buffer).
pub trait ArtifactSink {
    /// Persist one artifact.
    fn save(&self, artifact: &Artifact) -> GenSceneResult<()>;
}

/// In-memory sink for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySink {
    saved: RefCell<Vec<Artifact>>,
}

impl MemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Artifacts saved so far, in order.
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.saved.borrow().clone()
    }

    /// File names saved so far, in order.
    pub fn file_names(&self) -> Vec<String> {
        self.saved
            .borrow()
            .iter()
            .map(|a| a.file_name.clone())
            .collect()
    }
}

impl ArtifactSink for MemorySink {
    fn save(&self, artifact: &Artifact) -> GenSceneResult<()> {
        self.saved.borrow_mut().push(artifact.clone());
        Ok(())
    }
}

/// Writes artifacts into a directory, creating it on first use.
#[derive(Clone, Debug)]
pub struct DirSink {
    dir: PathBuf,
}

impl DirSink {
    /// Sink writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for DirSink {
    fn save(&self, artifact: &Artifact) -> GenSceneResult<()> {
        let name = Path::new(&artifact.file_name);
        if name.components().count() != 1 || name.file_name().is_none() {
            return Err(GenSceneError::validation(format!(
                "artifact name '{}' must be a plain file name",
                artifact.file_name
            )));
        }
        let path = self.dir.join(name);
        ensure_parent_dir(&path)?;
        std::fs::write(&path, &artifact.bytes)
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        tracing::info!(path = %path.display(), bytes = artifact.bytes.len(), "artifact saved");
        Ok(())
    }
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> GenSceneResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/export/artifact.rs"]
mod tests;
