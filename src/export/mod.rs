//! Still-image, JSON snapshot and bundle exports.

/// Zip archive assembly.
pub mod archive;
/// Exported artifacts and the sinks that persist them.
pub mod artifact;
/// Self-contained player bundle export.
pub mod bundle;
/// Asset fetching for bundle exports.
pub mod fetch;
/// PNG still capture.
pub mod image;
/// Product overlay graphics.
pub mod overlay;
/// JSON snapshot export.
pub mod snapshot;
