use crate::scene::classify::LayerKind;

/// Convenience result type used across genscene.
pub type GenSceneResult<T> = Result<T, GenSceneError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum GenSceneError {
    /// Invalid user-provided or application-core data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A scene builder rejected a layer model. Non-fatal: the prior scene is retained.
    #[error("build error: {0}")]
    Build(#[from] BuildError),

    /// An asset required by an export could not be fetched.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Image or archive encoding failed.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Batch capture sequencing was misused.
    #[error("batch error: {0}")]
    Batch(#[from] BatchError),

    /// Errors when serializing or deserializing documents.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GenSceneError {
    /// Build a [`GenSceneError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`GenSceneError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for failures that leave the session state untouched and only need reporting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Build(_) | Self::Batch(_))
    }
}

/// Failure to turn a layer model into a scene.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// The model has the right shape for `kind` but its fields do not decode.
    #[error("{kind:?} model is invalid: {reason}")]
    InvalidModel {
        /// Kind the model was classified as.
        kind: LayerKind,
        /// Human-readable decode failure.
        reason: String,
    },

    /// The model decodes but describes geometry that cannot be built.
    #[error("degenerate {kind:?} configuration: {reason}")]
    Degenerate {
        /// Kind the model was classified as.
        kind: LayerKind,
        /// Which constraint was violated.
        reason: String,
    },

    /// No builder is registered for this kind.
    #[error("no scene builder for {0:?} layers")]
    Unsupported(LayerKind),
}

impl BuildError {
    /// Build a [`BuildError::InvalidModel`] value.
    pub fn invalid(kind: LayerKind, reason: impl Into<String>) -> Self {
        Self::InvalidModel {
            kind,
            reason: reason.into(),
        }
    }

    /// Build a [`BuildError::Degenerate`] value.
    pub fn degenerate(kind: LayerKind, reason: impl Into<String>) -> Self {
        Self::Degenerate {
            kind,
            reason: reason.into(),
        }
    }
}

/// An asset fetch that did not produce bytes.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to fetch '{path}': {reason}")]
pub struct FetchError {
    /// Requested asset path.
    pub path: String,
    /// Underlying failure.
    pub reason: String,
}

impl FetchError {
    /// Construct a fetch error for `path`.
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Image or archive encoding failure.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// PNG (or pixel buffer) encoding failed.
    #[error("image: {0}")]
    Image(String),
    /// Zip assembly failed.
    #[error("archive: {0}")]
    Archive(String),
}

/// Batch sequencer misuse.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchError {
    /// A batch run is already driving the capture surface.
    #[error("a batch run is already in progress (step {step})")]
    AlreadyRunning {
        /// Step the active run is on.
        step: usize,
    },
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
