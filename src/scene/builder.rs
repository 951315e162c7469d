use serde_json::Value;

use crate::{
    foundation::core::{LayerIndex, Size},
    foundation::error::BuildError,
    foundation::math::layer_seed,
    model::config::GlobalConfig,
    scene::{
        classify::{LayerKind, classify},
        gradient::GradientBuilder,
        mesh::MeshBuilder,
        metaballs::MetaballBuilder,
        state::{FuzzRecord, SceneState},
    },
};

/// Inputs shared by every builder invocation.
#[derive(Clone, Copy, Debug)]
pub struct BuildCtx<'a> {
    /// Read-only global configuration of the document being built.
    pub config: &'a GlobalConfig,
    /// Per-layer seed for every random choice the builder makes.
    pub seed: u64,
}

impl<'a> BuildCtx<'a> {
    /// Context for `layer` of kind `kind`, seeded from the session seed.
    pub fn for_layer(
        config: &'a GlobalConfig,
        session_seed: u64,
        layer: LayerIndex,
        kind: LayerKind,
    ) -> Self {
        Self {
            config,
            seed: layer_seed(session_seed, layer, kind.seed_tag()),
        }
    }

    /// Canvas size scenes are laid out for.
    pub fn canvas(&self) -> Size {
        self.config.size
    }
}

/// A procedural scene builder for one [`LayerKind`].
///
/// Builders are pure: identical `(ctx, model, prior_fuzz)` produce identical scenes.
pub trait SceneBuilder: Sync {
    /// Kind this builder accepts.
    fn kind(&self) -> LayerKind;

    /// Build a fresh scene from `model`.
    fn build(
        &self,
        ctx: &BuildCtx<'_>,
        model: &Value,
        prior_fuzz: Option<&[FuzzRecord]>,
    ) -> Result<SceneState, BuildError>;

    /// Cheap re-layout of an existing scene for a new canvas size.
    ///
    /// `None` means the kind has no resize path and needs a full rebuild.
    fn resize(
        &self,
        _new_size: Size,
        _prior: &SceneState,
    ) -> Option<Result<SceneState, BuildError>> {
        None
    }
}

static MESH: MeshBuilder = MeshBuilder;
static METABALLS: MetaballBuilder = MetaballBuilder;
static GRADIENT: GradientBuilder = GradientBuilder;

/// Builder registered for `kind`, if any.
pub fn builder_for(kind: LayerKind) -> Option<&'static dyn SceneBuilder> {
    match kind {
        LayerKind::MeshField => Some(&MESH),
        LayerKind::MetaballField => Some(&METABALLS),
        LayerKind::FluidGradient => Some(&GRADIENT),
        LayerKind::Other => None,
    }
}

/// Classify `model` and run the matching builder.
pub fn build_layer(
    ctx: &BuildCtx<'_>,
    model: &Value,
    prior_fuzz: Option<&[FuzzRecord]>,
) -> Result<SceneState, BuildError> {
    let kind = classify(model);
    let builder = builder_for(kind).ok_or(BuildError::Unsupported(kind))?;
    builder.build(ctx, model, prior_fuzz)
}

/// Decode a typed builder model, mapping serde failures to [`BuildError::InvalidModel`].
pub(crate) fn decode_model<T: serde::de::DeserializeOwned>(
    kind: LayerKind,
    model: &Value,
) -> Result<T, BuildError> {
    T::deserialize(model).map_err(|e| BuildError::invalid(kind, e.to_string()))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/builder.rs"]
mod tests;
