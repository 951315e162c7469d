use serde::Deserialize;
use serde_json::Value;

use crate::{
    foundation::color::Color,
    foundation::core::Size,
    foundation::error::BuildError,
    foundation::math::Rng64,
    scene::{
        builder::{BuildCtx, SceneBuilder, decode_model},
        classify::LayerKind,
        state::{FuzzRecord, MeshMaterial, MeshScene, MeshTriangle, SceneFuzz, SceneState},
    },
};

/// Upper bound on cells per axis.
pub const MAX_FACES: u32 = 1024;

// Fraction of a cell an interior vertex may drift from its grid point.
const JITTER: f64 = 0.35;
// Depth range as a fraction of the smaller cell side.
const DEPTH: f64 = 0.25;

/// Builder for flat-surface mesh fields.
#[derive(Clone, Copy, Debug, Default)]
pub struct MeshBuilder;

#[derive(Debug, Deserialize)]
struct Faces {
    x: f64,
    y: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Amplitude {
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ColorShift {
    hue: f64,
    saturation: f64,
    brightness: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeshFieldModel {
    faces: Faces,
    #[serde(default)]
    amplitude: Amplitude,
    #[serde(default = "default_palette")]
    palette: Vec<Color>,
    #[serde(default)]
    color_shift: ColorShift,
    #[serde(default = "default_opacity")]
    opacity: f64,
    #[serde(default = "default_light_speed")]
    light_speed: f64,
    #[serde(default)]
    vignette: f64,
    #[serde(default)]
    iris: f64,
    #[serde(default = "default_render_mode")]
    render_mode: String,
    #[serde(default)]
    mirror: bool,
}

fn default_palette() -> Vec<Color> {
    vec![
        Color::rgba(0.043, 0.043, 0.071, 1.0),
        Color::rgba(0.165, 0.114, 0.322, 1.0),
        Color::rgba(0.576, 0.251, 0.694, 1.0),
    ]
}

fn default_opacity() -> f64 {
    1.0
}

fn default_light_speed() -> f64 {
    540.0
}

fn default_render_mode() -> String {
    "triangles".to_owned()
}

fn degenerate(reason: impl Into<String>) -> BuildError {
    BuildError::degenerate(LayerKind::MeshField, reason)
}

impl MeshFieldModel {
    fn grid(&self, canvas: Size) -> Result<(u32, u32), BuildError> {
        if canvas.is_empty() {
            return Err(degenerate(format!("canvas size {canvas} is empty")));
        }
        let axis = |v: f64, name: &str| -> Result<u32, BuildError> {
            if !v.is_finite() {
                return Err(degenerate(format!("faces.{name} is not finite")));
            }
            let n = v.round();
            if n < 1.0 || n > f64::from(MAX_FACES) {
                return Err(degenerate(format!(
                    "faces.{name} must be in 1..={MAX_FACES} (got {v})"
                )));
            }
            Ok(n as u32)
        };
        let cols = axis(self.faces.x, "x")?;
        let rows = axis(self.faces.y, "y")?;

        let a = &self.amplitude;
        if !(a.x.is_finite() && a.y.is_finite() && a.z.is_finite()) {
            return Err(degenerate("amplitude must be finite"));
        }
        if self.palette.is_empty() {
            return Err(degenerate("palette is empty"));
        }
        Ok((cols, rows))
    }
}

impl SceneBuilder for MeshBuilder {
    fn kind(&self) -> LayerKind {
        LayerKind::MeshField
    }

    #[tracing::instrument(skip(self, ctx, model, prior_fuzz), fields(seed = ctx.seed))]
    fn build(
        &self,
        ctx: &BuildCtx<'_>,
        model: &Value,
        prior_fuzz: Option<&[FuzzRecord]>,
    ) -> Result<SceneState, BuildError> {
        let m: MeshFieldModel = decode_model(LayerKind::MeshField, model)?;
        let canvas = ctx.canvas();
        let (cols, rows) = m.grid(canvas)?;
        let vertex_count = (cols as usize + 1) * (rows as usize + 1);

        let vertices = match prior_fuzz {
            Some(prior) if prior.len() == vertex_count => prior.to_vec(),
            Some(prior) => {
                tracing::debug!(
                    prior = prior.len(),
                    expected = vertex_count,
                    "scene fuzz does not match the grid, generating fresh fuzz"
                );
                generate_fuzz(ctx.seed, canvas, cols, rows)
            }
            None => generate_fuzz(ctx.seed, canvas, cols, rows),
        };

        let palette: Vec<Color> = m
            .palette
            .iter()
            .map(|c| {
                c.shift_hsl(
                    m.color_shift.hue,
                    m.color_shift.saturation,
                    m.color_shift.brightness,
                )
            })
            .collect();
        let triangles = triangulate(cols, rows, &vertices, &palette);

        let cell_w = f64::from(canvas.width) / f64::from(cols);
        let cell_h = f64::from(canvas.height) / f64::from(rows);
        Ok(SceneState::Mesh(MeshScene {
            size: canvas,
            faces: [cols, rows],
            amplitude_px: [
                m.amplitude.x * cell_w,
                m.amplitude.y * cell_h,
                m.amplitude.z * cell_w.min(cell_h),
            ],
            vertices,
            triangles,
            material: MeshMaterial {
                opacity: m.opacity.clamp(0.0, 1.0),
                light_speed: m.light_speed,
                vignette: m.vignette,
                iris: m.iris,
                render_mode: m.render_mode,
                mirror: m.mirror,
            },
        }))
    }
}

fn generate_fuzz(seed: u64, canvas: Size, cols: u32, rows: u32) -> SceneFuzz {
    let mut rng = Rng64::new(seed);
    let cell_w = f64::from(canvas.width) / f64::from(cols);
    let cell_h = f64::from(canvas.height) / f64::from(rows);
    let depth = cell_w.min(cell_h) * DEPTH;

    let mut out = Vec::with_capacity((cols as usize + 1) * (rows as usize + 1));
    for row in 0..=rows {
        for col in 0..=cols {
            let mut x = f64::from(col) * cell_w;
            let mut y = f64::from(row) * cell_h;
            // Border vertices stay on the canvas edge so the mesh always covers it.
            if col > 0 && col < cols {
                x += rng.signed_unit() * cell_w * JITTER;
            }
            if row > 0 && row < rows {
                y += rng.signed_unit() * cell_h * JITTER;
            }
            let z = rng.signed_unit() * depth;
            out.push(FuzzRecord {
                v0: [x, y, z],
                time: rng.range_f64(0.0, std::f64::consts::TAU),
                anchor: [rng.signed_unit(), rng.signed_unit(), rng.signed_unit()],
                gradient: rng.next_f64_01(),
            });
        }
    }
    out
}

fn triangulate(cols: u32, rows: u32, vertices: &[FuzzRecord], palette: &[Color]) -> Vec<MeshTriangle> {
    let stride = cols + 1;
    let mut out = Vec::with_capacity(cols as usize * rows as usize * 2);
    let tri = |indices: [u32; 3]| {
        let g = indices
            .iter()
            .map(|&i| vertices[i as usize].gradient)
            .sum::<f64>()
            / 3.0;
        MeshTriangle {
            indices,
            color: sample_palette(palette, g),
        }
    };
    for row in 0..rows {
        for col in 0..cols {
            let a = row * stride + col;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            out.push(tri([a, c, b]));
            out.push(tri([b, c, d]));
        }
    }
    out
}

/// Sample evenly spaced palette stops at `t` in `[0, 1]`.
pub fn sample_palette(palette: &[Color], t: f64) -> Color {
    match palette {
        [] => Color::rgba(0.0, 0.0, 0.0, 0.0),
        [only] => *only,
        _ => {
            let pos = t.clamp(0.0, 1.0) * (palette.len() - 1) as f64;
            let i = (pos.floor() as usize).min(palette.len() - 2);
            palette[i].lerp(palette[i + 1], pos - i as f64)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/mesh.rs"]
mod tests;
