//! Layer classification, procedural scene builders and the per-layer scene cache.

/// Scene builder trait and build context.
pub mod builder;
/// Per-layer scene cache with generation tickets.
pub mod cache;
/// Layer classification by model shape.
pub mod classify;
/// Fluid gradient scenes.
pub mod gradient;
/// Mesh field scenes.
pub mod mesh;
/// Metaball field scenes.
pub mod metaballs;
/// Built scene states.
pub mod state;

use crate::{
    foundation::core::LayerIndex,
    foundation::error::BuildError,
    model::document::SceneDocument,
    scene::{
        builder::{BuildCtx, build_layer},
        cache::SceneCache,
        classify::LayerKind,
    },
};

/// Build every buildable layer of `doc` into `cache`.
///
/// Mesh layers reuse their `sceneFuzz`. Failures are collected per layer and leave that layer's
/// prior scene in place.
#[tracing::instrument(skip(doc, cache), fields(layers = doc.layers.len()))]
pub fn build_document(
    doc: &SceneDocument,
    seed: u64,
    cache: &mut SceneCache,
) -> Vec<(LayerIndex, BuildError)> {
    let mut failures = Vec::new();
    for (index, layer) in doc.layers.iter().enumerate() {
        let kind = layer.kind();
        if kind == LayerKind::Other {
            continue;
        }
        let ticket = cache.begin(index);
        let ctx = BuildCtx::for_layer(&doc.config, seed, index, kind);
        match build_layer(&ctx, layer.model.value(), layer.scene_fuzz.as_deref()) {
            Ok(state) => {
                cache.commit(ticket, state);
            }
            Err(err) => {
                tracing::warn!(layer = index, error = %err, "layer build failed");
                failures.push((index, err));
            }
        }
    }
    failures
}
