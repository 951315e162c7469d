use serde::Deserialize;
use serde_json::Value;

use crate::{
    foundation::error::BuildError,
    scene::{
        builder::{BuildCtx, SceneBuilder, decode_model},
        classify::LayerKind,
        state::{FuzzRecord, GradientScene, GradientStop, GradientTexture, SceneState},
    },
};

/// Texels per ramp texture.
pub const TEXTURE_WIDTH: u32 = 256;

/// Builder for fluid-gradient ramp textures.
#[derive(Clone, Copy, Debug, Default)]
pub struct GradientBuilder;

#[derive(Debug, Deserialize)]
struct FluidGradientModel {
    groups: Vec<FluidGroup>,
}

#[derive(Debug, Deserialize)]
struct FluidGroup {
    #[serde(default)]
    gradient: GradientDef,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GradientDef {
    Stops(Vec<GradientStop>),
    Object { stops: Vec<GradientStop> },
}

impl Default for GradientDef {
    fn default() -> Self {
        Self::Stops(Vec::new())
    }
}

impl GradientDef {
    fn into_stops(self) -> Vec<GradientStop> {
        match self {
            Self::Stops(s) | Self::Object { stops: s } => s,
        }
    }
}

fn degenerate(reason: impl Into<String>) -> BuildError {
    BuildError::degenerate(LayerKind::FluidGradient, reason)
}

impl SceneBuilder for GradientBuilder {
    fn kind(&self) -> LayerKind {
        LayerKind::FluidGradient
    }

    #[tracing::instrument(skip_all)]
    fn build(
        &self,
        _ctx: &BuildCtx<'_>,
        model: &Value,
        _prior_fuzz: Option<&[FuzzRecord]>,
    ) -> Result<SceneState, BuildError> {
        let m: FluidGradientModel = decode_model(LayerKind::FluidGradient, model)?;
        let textures = m
            .groups
            .into_iter()
            .enumerate()
            .map(|(i, g)| build_ramp(i, g.gradient.into_stops()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SceneState::Gradients(GradientScene { textures }))
    }
}

fn build_ramp(group: usize, mut stops: Vec<GradientStop>) -> Result<GradientTexture, BuildError> {
    if stops.is_empty() {
        return Err(degenerate(format!("group {group} has no gradient stops")));
    }
    if let Some(bad) = stops
        .iter()
        .find(|s| !s.offset.is_finite() || !(0.0..=1.0).contains(&s.offset))
    {
        return Err(degenerate(format!(
            "group {group} has stop offset {} outside [0, 1]",
            bad.offset
        )));
    }
    stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));

    let mut rgba8 = Vec::with_capacity(TEXTURE_WIDTH as usize * 4);
    for i in 0..TEXTURE_WIDTH {
        let t = f64::from(i) / f64::from(TEXTURE_WIDTH - 1);
        rgba8.extend_from_slice(&sample_stops(&stops, t).to_rgba8());
    }
    Ok(GradientTexture {
        width: TEXTURE_WIDTH,
        stops,
        rgba8,
    })
}

fn sample_stops(stops: &[GradientStop], t: f64) -> crate::foundation::color::Color {
    let first = &stops[0];
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if t <= b.offset {
            let span = b.offset - a.offset;
            if span <= 0.0 {
                return b.color;
            }
            return a.color.lerp(b.color, (t - a.offset) / span);
        }
    }
    stops[stops.len() - 1].color
}

#[cfg(test)]
#[path = "../../tests/unit/scene/gradient.rs"]
mod tests;
