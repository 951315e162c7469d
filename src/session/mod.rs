//! The orchestrator reacting to application-core messages.

/// Session options.
pub mod opts;
/// The synchronization session.
pub mod sync_session;
