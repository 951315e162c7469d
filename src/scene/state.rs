use serde::{Deserialize, Serialize};

use crate::{
    foundation::color::Color,
    foundation::core::{Point, Size, Vec2},
    scene::classify::LayerKind,
};

/// Per-vertex variation of a mesh field, preserved across export/import.
///
/// `v0` is the rest position, `time` the phase offset of the vertex oscillation, `anchor` its unit
/// displacement direction and `gradient` the vertex's position along the layer palette.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FuzzRecord {
    /// Rest position `[x, y, z]` in canvas pixels.
    pub v0: [f64; 3],
    /// Phase offset in radians.
    pub time: f64,
    /// Unit displacement direction, scaled by the layer amplitude when animated.
    pub anchor: [f64; 3],
    /// Palette position in `[0, 1)`.
    pub gradient: f64,
}

/// Ordered per-vertex fuzz of one mesh layer.
pub type SceneFuzz = Vec<FuzzRecord>;

/// One filled triangle of a mesh field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshTriangle {
    /// Vertex indices into [`MeshScene::vertices`].
    pub indices: [u32; 3],
    /// Fill color sampled from the palette.
    pub color: Color,
}

/// Shading parameters carried through to the renderer untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshMaterial {
    /// Layer opacity in `[0, 1]`.
    pub opacity: f64,
    /// Light animation speed.
    pub light_speed: f64,
    /// Vignette strength.
    pub vignette: f64,
    /// Iris strength.
    pub iris: f64,
    /// Renderer-specific render mode name.
    pub render_mode: String,
    /// Mirror the mesh horizontally.
    pub mirror: bool,
}

/// Built flat-surface mesh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshScene {
    /// Canvas size the mesh was laid out for.
    pub size: Size,
    /// Cell counts `[x, y]`.
    pub faces: [u32; 2],
    /// Displacement amplitude in pixels per axis.
    pub amplitude_px: [f64; 3],
    /// One record per grid vertex, row-major.
    pub vertices: SceneFuzz,
    /// Two triangles per cell.
    pub triangles: Vec<MeshTriangle>,
    /// Shading parameters.
    pub material: MeshMaterial,
}

impl MeshScene {
    /// Animated vertex position at `t` seconds.
    pub fn vertex_position(&self, index: usize, t: f64) -> Option<[f64; 3]> {
        let v = self.vertices.get(index)?;
        let s = (v.time + t).sin();
        Some([
            v.v0[0] + v.anchor[0] * self.amplitude_px[0] * s,
            v.v0[1] + v.anchor[1] * self.amplitude_px[1] * s,
            v.v0[2] + v.anchor[2] * self.amplitude_px[2] * s,
        ])
    }
}

/// One ball of a metaball group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metaball {
    /// Offset from the group origin.
    pub offset: Vec2,
    /// Radius in pixels.
    pub radius: f64,
    /// Orbit speed.
    pub speed: f64,
    /// Orbit phase in radians.
    pub phase: f64,
    /// Orbit amplitude per axis in pixels.
    pub amplitude: Vec2,
}

/// A cluster of balls that merge with each other.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetaballGroup {
    /// Group center in canvas pixels.
    pub origin: Point,
    /// Member balls.
    pub balls: Vec<Metaball>,
}

/// Built metaball field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetaballScene {
    /// Canvas size the field was laid out for.
    pub size: Size,
    /// Palette; group `i` uses `colors[i % colors.len()]`.
    pub colors: Vec<Color>,
    /// Ball groups.
    pub groups: Vec<MetaballGroup>,
}

impl MetaballScene {
    /// Color of group `index`.
    pub fn group_color(&self, index: usize) -> Option<Color> {
        if self.colors.is_empty() {
            return None;
        }
        Some(self.colors[index % self.colors.len()])
    }

    /// Total ball count across groups.
    pub fn ball_count(&self) -> usize {
        self.groups.iter().map(|g| g.balls.len()).sum()
    }
}

/// A color stop of a fluid gradient.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Stop color.
    pub color: Color,
    /// Position along the ramp in `[0, 1]`.
    pub offset: f64,
}

/// One 1D gradient ramp texture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientTexture {
    /// Texel count.
    pub width: u32,
    /// Offset-sorted stops the ramp was built from.
    pub stops: Vec<GradientStop>,
    /// Straight-alpha RGBA8 texels, `width * 4` bytes.
    pub rgba8: Vec<u8>,
}

/// Built gradient textures of a fluid layer, one per group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientScene {
    /// Textures in group order.
    pub textures: Vec<GradientTexture>,
}

/// Builder output for one layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "scene")]
pub enum SceneState {
    /// Mesh field scene.
    Mesh(MeshScene),
    /// Metaball field scene.
    Metaballs(MetaballScene),
    /// Fluid gradient textures.
    Gradients(GradientScene),
}

impl SceneState {
    /// Layer kind that produced this scene.
    pub fn kind(&self) -> LayerKind {
        match self {
            Self::Mesh(_) => LayerKind::MeshField,
            Self::Metaballs(_) => LayerKind::MetaballField,
            Self::Gradients(_) => LayerKind::FluidGradient,
        }
    }

    /// Exportable fuzz, present only for mesh scenes.
    pub fn fuzz(&self) -> Option<SceneFuzz> {
        match self {
            Self::Mesh(m) => Some(m.vertices.clone()),
            _ => None,
        }
    }

    /// Borrow as a mesh scene.
    pub fn as_mesh(&self) -> Option<&MeshScene> {
        match self {
            Self::Mesh(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow as a metaball scene.
    pub fn as_metaballs(&self) -> Option<&MetaballScene> {
        match self {
            Self::Metaballs(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow as gradient textures.
    pub fn as_gradients(&self) -> Option<&GradientScene> {
        match self {
            Self::Gradients(g) => Some(g),
            _ => None,
        }
    }
}
