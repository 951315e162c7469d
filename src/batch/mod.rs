//! Multi-resolution capture sequencing.

/// Batch capture state machine.
pub mod sequencer;
