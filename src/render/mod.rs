//! Pixel buffers and layer painting.

/// CPU layer painter.
pub mod cpu;
/// RGBA8 frame buffers.
pub mod frame;
/// Layer painting and surface capture.
pub mod painter;
