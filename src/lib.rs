//! genscene keeps procedural generative-art scenes in sync with a declarative application core
//! and exports them.
//!
//! The core describes layers as JSON models. The pipeline:
//!
//! - classifies each layer and builds its [`SceneState`] (mesh field, metaballs, gradient ramps)
//! - caches scenes per layer with generation-checked rebuilds ([`SceneCache`])
//! - debounces window resizes and sequences batch captures on a virtual clock ([`Scheduler`])
//! - exports PNG stills, JSON snapshots and self-contained player bundles
//!
//! A [`Session`] wires these together behind a typed [`MessageBus`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Batch capture sequencing.
pub mod batch;
/// Typed message channel.
pub mod channel;
/// Image, snapshot and bundle exports.
pub mod export;
/// Errors, sizes, colors and deterministic randomness.
pub mod foundation;
/// Document model and wire transcoding.
pub mod model;
/// Pixel buffers and layer painting.
pub mod render;
/// Layer classification, scene builders and the scene cache.
pub mod scene;
/// Message-driven session.
pub mod session;
/// Virtual clock, debouncing and resize handling.
pub mod timing;

pub use crate::batch::sequencer::{BatchSequencer, BatchState};
pub use crate::channel::bus::{MessageBus, SubscriptionId};
pub use crate::channel::message::{Inbound, LayerParam, Outbound, ParamChange};
pub use crate::export::artifact::{Artifact, ArtifactSink, DirSink, MemorySink};
pub use crate::export::bundle::{BundleLayout, export_bundle};
pub use crate::export::fetch::{AssetFetcher, FsFetcher, MemoryFetcher};
pub use crate::export::image::{CaptureRequest, ImageExporter};
pub use crate::export::snapshot::{ExportSnapshot, FuzzPolicy, export_snapshot};
pub use crate::foundation::color::Color;
pub use crate::foundation::core::{LayerIndex, Millis, Size};
pub use crate::foundation::error::{
    BatchError, BuildError, EncodeError, FetchError, GenSceneError, GenSceneResult,
};
pub use crate::model::document::SceneDocument;
pub use crate::model::wire::{WireDocument, from_wire, to_wire};
pub use crate::render::cpu::CpuPainter;
pub use crate::render::frame::FrameBuffer;
pub use crate::scene::cache::SceneCache;
pub use crate::scene::classify::{LayerKind, classify};
pub use crate::scene::state::SceneState;
pub use crate::session::opts::SessionOpts;
pub use crate::session::sync_session::{Session, SessionDeps};
pub use crate::timing::scheduler::Scheduler;
