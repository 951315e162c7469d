//! Document model: global config, layers, and the wire transcoding exchanged with the core.

/// Document-wide configuration.
pub mod config;
/// The scene document.
pub mod document;
/// Layer descriptors and models.
pub mod layer;
/// Deterministic document randomization.
pub mod randomize;
/// Wire form exchanged with the core.
pub mod wire;
