//! Shared primitives: errors, sizes, colors, deterministic randomness.

/// RGBA colors and hex parsing.
pub mod color;
/// Sizes, indices and geometry re-exports.
pub mod core;
/// Crate error types.
pub mod error;
pub(crate) mod math;
