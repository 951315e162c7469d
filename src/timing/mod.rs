//! Virtual-clock scheduling, debouncing and per-layer resize handling.

/// Trailing-edge debouncing.
pub mod debounce;
/// Per-layer resize handling.
pub mod resize;
/// Virtual-clock timer scheduler.
pub mod scheduler;
