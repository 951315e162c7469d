use serde::Deserialize;
use serde_json::Value;

use crate::{
    foundation::color::Color,
    foundation::core::{Point, Size, Vec2},
    foundation::error::BuildError,
    foundation::math::Rng64,
    scene::{
        builder::{BuildCtx, SceneBuilder, decode_model},
        classify::LayerKind,
        state::{FuzzRecord, Metaball, MetaballGroup, MetaballScene, SceneState},
    },
};

/// Builder for metaball fields.
#[derive(Clone, Copy, Debug, Default)]
pub struct MetaballBuilder;

#[derive(Debug, Deserialize)]
struct MetaballModel {
    colors: Vec<Color>,
    #[serde(default)]
    ranges: MetaballRanges,
}

/// Random ranges of a metaball layer. Group, ball and radius bounds are floored to integers.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetaballRanges {
    /// Minimum group count.
    pub min_groups: f64,
    /// Maximum group count.
    pub max_groups: f64,
    /// Minimum balls per group.
    pub min_balls: f64,
    /// Maximum balls per group.
    pub max_balls: f64,
    /// Minimum radius in pixels.
    pub min_radius: f64,
    /// Maximum radius in pixels.
    pub max_radius: f64,
    /// Minimum orbit speed.
    pub min_speed: f64,
    /// Maximum orbit speed.
    pub max_speed: f64,
    /// Minimum orbit phase.
    pub min_phase: f64,
    /// Maximum orbit phase.
    pub max_phase: f64,
    /// Minimum horizontal orbit amplitude.
    pub min_amplitude_x: f64,
    /// Maximum horizontal orbit amplitude.
    pub max_amplitude_x: f64,
    /// Minimum vertical orbit amplitude.
    pub min_amplitude_y: f64,
    /// Maximum vertical orbit amplitude.
    pub max_amplitude_y: f64,
}

impl Default for MetaballRanges {
    fn default() -> Self {
        Self {
            min_groups: 2.0,
            max_groups: 5.0,
            min_balls: 3.0,
            max_balls: 8.0,
            min_radius: 20.0,
            max_radius: 80.0,
            min_speed: 0.5,
            max_speed: 2.0,
            min_phase: 0.0,
            max_phase: std::f64::consts::TAU,
            min_amplitude_x: 10.0,
            max_amplitude_x: 60.0,
            min_amplitude_y: 10.0,
            max_amplitude_y: 60.0,
        }
    }
}

/// Upper bound on groups per scene.
pub const MAX_GROUPS: u32 = 256;

/// Upper bound on balls per group.
pub const MAX_BALLS: u32 = 256;

/// Upper bound on a ball radius in pixels.
pub const MAX_RADIUS: u32 = 16_384;

#[derive(Clone, Copy, Debug)]
struct IntRange(u32, u32);

#[derive(Clone, Copy, Debug)]
struct FloatRange(f64, f64);

fn degenerate(reason: impl Into<String>) -> BuildError {
    BuildError::degenerate(LayerKind::MetaballField, reason)
}

fn int_range(name: &str, min: f64, max: f64, cap: u32) -> Result<IntRange, BuildError> {
    if !(min.is_finite() && max.is_finite()) || min < 0.0 {
        return Err(degenerate(format!("{name} range must be finite and non-negative")));
    }
    let (lo, hi) = (min.floor(), max.floor());
    if hi < lo {
        return Err(degenerate(format!("{name} range is inverted ({lo} > {hi})")));
    }
    if hi > f64::from(cap) {
        return Err(degenerate(format!("{name} range must stay within 0..={cap} (got {hi})")));
    }
    Ok(IntRange(lo as u32, hi as u32))
}

fn float_range(name: &str, min: f64, max: f64) -> Result<FloatRange, BuildError> {
    if !(min.is_finite() && max.is_finite()) {
        return Err(degenerate(format!("{name} range must be finite")));
    }
    if max < min {
        return Err(degenerate(format!("{name} range is inverted ({min} > {max})")));
    }
    Ok(FloatRange(min, max))
}

impl MetaballRanges {
    fn resolve(&self) -> Result<ResolvedRanges, BuildError> {
        Ok(ResolvedRanges {
            groups: int_range("groups", self.min_groups, self.max_groups, MAX_GROUPS)?,
            balls: int_range("balls", self.min_balls, self.max_balls, MAX_BALLS)?,
            radius: int_range("radius", self.min_radius, self.max_radius, MAX_RADIUS)?,
            speed: float_range("speed", self.min_speed, self.max_speed)?,
            phase: float_range("phase", self.min_phase, self.max_phase)?,
            amplitude_x: float_range("amplitudeX", self.min_amplitude_x, self.max_amplitude_x)?,
            amplitude_y: float_range("amplitudeY", self.min_amplitude_y, self.max_amplitude_y)?,
        })
    }
}

struct ResolvedRanges {
    groups: IntRange,
    balls: IntRange,
    radius: IntRange,
    speed: FloatRange,
    phase: FloatRange,
    amplitude_x: FloatRange,
    amplitude_y: FloatRange,
}

impl SceneBuilder for MetaballBuilder {
    fn kind(&self) -> LayerKind {
        LayerKind::MetaballField
    }

    #[tracing::instrument(skip(self, ctx, model, _prior_fuzz), fields(seed = ctx.seed))]
    fn build(
        &self,
        ctx: &BuildCtx<'_>,
        model: &Value,
        _prior_fuzz: Option<&[FuzzRecord]>,
    ) -> Result<SceneState, BuildError> {
        let m: MetaballModel = decode_model(LayerKind::MetaballField, model)?;
        let canvas = ctx.canvas();
        if canvas.is_empty() {
            return Err(degenerate(format!("canvas size {canvas} is empty")));
        }
        if m.colors.is_empty() {
            return Err(degenerate("colors is empty"));
        }
        let r = m.ranges.resolve()?;

        let mut rng = Rng64::new(ctx.seed);
        let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
        let group_count = rng.range_u32(r.groups.0, r.groups.1);
        let groups = (0..group_count)
            .map(|_| {
                let origin = Point::new(rng.range_f64(0.0, w), rng.range_f64(0.0, h));
                let spread = f64::from(r.radius.1);
                let ball_count = rng.range_u32(r.balls.0, r.balls.1);
                let balls = (0..ball_count)
                    .map(|_| Metaball {
                        offset: Vec2::new(rng.signed_unit() * spread, rng.signed_unit() * spread),
                        radius: f64::from(rng.range_u32(r.radius.0, r.radius.1)),
                        speed: rng.range_f64(r.speed.0, r.speed.1),
                        phase: rng.range_f64(r.phase.0, r.phase.1),
                        amplitude: Vec2::new(
                            rng.range_f64(r.amplitude_x.0, r.amplitude_x.1),
                            rng.range_f64(r.amplitude_y.0, r.amplitude_y.1),
                        ),
                    })
                    .collect();
                MetaballGroup { origin, balls }
            })
            .collect();

        Ok(SceneState::Metaballs(MetaballScene {
            size: canvas,
            colors: m.colors,
            groups,
        }))
    }

    fn resize(&self, new_size: Size, prior: &SceneState) -> Option<Result<SceneState, BuildError>> {
        let SceneState::Metaballs(prior) = prior else {
            return Some(Err(BuildError::invalid(
                LayerKind::MetaballField,
                format!("cannot resize a {:?} scene", prior.kind()),
            )));
        };
        Some(resize_scene(prior, new_size).map(SceneState::Metaballs))
    }
}

/// Scale a metaball scene onto `new_size`, keeping every group and ball.
///
/// Positions scale per axis; radii scale by the smaller ratio so balls stay round.
pub fn resize_scene(prior: &MetaballScene, new_size: Size) -> Result<MetaballScene, BuildError> {
    if new_size.is_empty() {
        return Err(degenerate(format!("cannot resize to {new_size}")));
    }
    let (sx, sy) = prior
        .size
        .ratio_to(new_size)
        .ok_or_else(|| degenerate(format!("prior scene size {} is empty", prior.size)))?;
    let sr = sx.min(sy);

    let groups = prior
        .groups
        .iter()
        .map(|g| MetaballGroup {
            origin: Point::new(g.origin.x * sx, g.origin.y * sy),
            balls: g
                .balls
                .iter()
                .map(|b| Metaball {
                    offset: Vec2::new(b.offset.x * sx, b.offset.y * sy),
                    radius: b.radius * sr,
                    speed: b.speed,
                    phase: b.phase,
                    amplitude: Vec2::new(b.amplitude.x * sx, b.amplitude.y * sy),
                })
                .collect(),
        })
        .collect();

    Ok(MetaballScene {
        size: new_size,
        colors: prior.colors.clone(),
        groups,
    })
}

/// Replace the palette of a metaball scene, keeping geometry.
pub fn recolor(prior: &MetaballScene, colors: Vec<Color>) -> Result<MetaballScene, BuildError> {
    if colors.is_empty() {
        return Err(degenerate("colors is empty"));
    }
    Ok(MetaballScene {
        colors,
        ..prior.clone()
    })
}

#[cfg(test)]
#[path = "../../tests/unit/scene/metaballs.rs"]
mod tests;
