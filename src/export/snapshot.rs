use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::{GenSceneError, GenSceneResult},
    model::document::SceneDocument,
    scene::{
        builder::{BuildCtx, build_layer},
        cache::SceneCache,
        state::SceneFuzz,
    },
};

/// Where exported mesh fuzz comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FuzzPolicy {
    /// Use the cached scene's fuzz; build fresh only when nothing usable is cached.
    #[default]
    PreferCached,
    /// Always build fresh fuzz from the model.
    AlwaysRebuild,
}

/// Result of an inline export.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportSnapshot {
    /// Pretty-printed snapshot JSON.
    pub json: String,
    /// The document the JSON was written from.
    pub source: SceneDocument,
}

/// Fill every layer's `sceneFuzz` and serialize the snapshot.
///
/// `exported_state` is the core's export in snapshot form. Mesh layers get fuzz according to
/// `policy`; every other layer gets `null`.
#[tracing::instrument(skip(exported_state, cache))]
pub fn export_snapshot(
    exported_state: &str,
    cache: &SceneCache,
    seed: u64,
    policy: FuzzPolicy,
) -> GenSceneResult<ExportSnapshot> {
    let mut doc = SceneDocument::from_json(exported_state)?;
    let config = doc.config.clone();
    for (index, layer) in doc.layers.iter_mut().enumerate() {
        let kind = layer.kind();
        if !kind.has_fuzz() {
            layer.scene_fuzz = None;
            continue;
        }
        let cached = match policy {
            FuzzPolicy::PreferCached => cache.get(index).and_then(|s| s.fuzz()),
            FuzzPolicy::AlwaysRebuild => None,
        };
        let fuzz: SceneFuzz = match cached {
            Some(f) => f,
            None => {
                tracing::debug!(layer = index, "no cached fuzz, building fresh");
                let ctx = BuildCtx::for_layer(&config, seed, index, kind);
                build_layer(&ctx, layer.model.value(), None)?
                    .fuzz()
                    .ok_or_else(|| {
                        GenSceneError::validation(format!("layer {index} produced no fuzz"))
                    })?
            }
        };
        layer.scene_fuzz = Some(fuzz);
    }
    let json = doc.to_json_pretty()?;
    Ok(ExportSnapshot { json, source: doc })
}

#[cfg(test)]
#[path = "../../tests/unit/export/snapshot.rs"]
mod tests;
