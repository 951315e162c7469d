//! Typed message channel between the application core and the pipeline.

/// Channel-routed publish/subscribe bus.
pub mod bus;
/// Inbound and outbound message types.
pub mod message;
