use vello_cpu::kurbo::{BezPath, Point, Rect};

use crate::{
    foundation::{
        color::Color,
        core::{LayerIndex, Size},
        error::{GenSceneError, GenSceneResult},
    },
    render::{frame::FrameBuffer, painter::LayerPainter},
    scene::state::{GradientScene, MeshScene, MetaballScene, SceneState},
};

// Flattening tolerance for circle outlines.
const TOLERANCE: f64 = 0.1;

/// Options for [`CpuPainter`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuPainterOpts {
    /// Animation time in seconds the scenes are posed at.
    pub time_secs: f64,
}

/// Headless [`LayerPainter`] backed by `vello_cpu`.
///
/// Scenes are drawn at their own layout size and stretched onto the target when sizes differ.
pub struct CpuPainter {
    opts: CpuPainterOpts,
    ctx: Option<vello_cpu::RenderContext>,
}

impl std::fmt::Debug for CpuPainter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuPainter")
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl Default for CpuPainter {
    fn default() -> Self {
        Self::new(CpuPainterOpts::default())
    }
}

fn paint_color(c: Color) -> vello_cpu::peniko::Color {
    let [r, g, b, a] = c.to_rgba8();
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

fn dim_u16(v: u32, what: &str) -> GenSceneResult<u16> {
    u16::try_from(v)
        .map_err(|_| GenSceneError::validation(format!("{what} {v} exceeds the CPU painter limit")))
}

impl CpuPainter {
    /// Painter with `opts`.
    pub fn new(opts: CpuPainterOpts) -> Self {
        Self { opts, ctx: None }
    }

    fn with_ctx_mut(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut vello_cpu::RenderContext, f64),
    ) -> vello_cpu::Pixmap {
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        f(&mut ctx, self.opts.time_secs);
        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        ctx.render_to_pixmap(&mut pixmap);
        self.ctx = Some(ctx);
        pixmap
    }
}

fn draw_mesh(ctx: &mut vello_cpu::RenderContext, scene: &MeshScene, t: f64) {
    let opacity = scene.material.opacity as f32;
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity);
    }
    let w = f64::from(scene.size.width);
    for tri in &scene.triangles {
        let mut path = BezPath::new();
        for (n, &i) in tri.indices.iter().enumerate() {
            let Some([x, y, _]) = scene.vertex_position(i as usize, t) else {
                continue;
            };
            let x = if scene.material.mirror { w - x } else { x };
            if n == 0 {
                path.move_to(Point::new(x, y));
            } else {
                path.line_to(Point::new(x, y));
            }
        }
        path.close_path();
        ctx.set_paint(paint_color(tri.color));
        ctx.fill_path(&path);
    }
    if opacity < 1.0 {
        ctx.pop_layer();
    }
}

fn draw_metaballs(ctx: &mut vello_cpu::RenderContext, scene: &MetaballScene, t: f64) {
    for (gi, group) in scene.groups.iter().enumerate() {
        let Some(color) = scene.group_color(gi) else {
            continue;
        };
        ctx.set_paint(paint_color(color));
        for ball in &group.balls {
            let angle = ball.phase + ball.speed * t;
            let center = Point::new(
                group.origin.x + ball.offset.x + ball.amplitude.x * angle.cos(),
                group.origin.y + ball.offset.y + ball.amplitude.y * angle.sin(),
            );
            let circle = vello_cpu::kurbo::Circle::new(center, ball.radius);
            let mut path = BezPath::new();
            for el in vello_cpu::kurbo::Shape::path_elements(&circle, TOLERANCE) {
                path.push(el);
            }
            ctx.fill_path(&path);
        }
    }
}

fn draw_gradients(ctx: &mut vello_cpu::RenderContext, scene: &GradientScene, size: Size) {
    let n = scene.textures.len();
    if n == 0 {
        return;
    }
    let band = f64::from(size.height) / n as f64;
    for (row, tex) in scene.textures.iter().enumerate() {
        if tex.width == 0 {
            continue;
        }
        let texel_w = f64::from(size.width) / f64::from(tex.width);
        let y0 = band * row as f64;
        for (i, px) in tex.rgba8.chunks_exact(4).enumerate() {
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(px[0], px[1], px[2], px[3]));
            let x0 = texel_w * i as f64;
            ctx.fill_rect(&Rect::new(x0, y0, x0 + texel_w, y0 + band));
        }
    }
}

impl LayerPainter for CpuPainter {
    #[tracing::instrument(skip(self, scene, target), fields(kind = ?scene.kind()))]
    fn paint(
        &mut self,
        layer: LayerIndex,
        scene: &SceneState,
        target: &mut FrameBuffer,
    ) -> GenSceneResult<()> {
        let size = target.size();
        let w = dim_u16(size.width, "width")?;
        let h = dim_u16(size.height, "height")?;
        if size.is_empty() {
            return Ok(());
        }

        let layout = match scene {
            SceneState::Mesh(m) => m.size,
            SceneState::Metaballs(m) => m.size,
            SceneState::Gradients(_) => size,
        };
        let stretch = layout.ratio_to(size).unwrap_or((1.0, 1.0));

        let pixmap = self.with_ctx_mut(w, h, |ctx, t| {
            ctx.set_transform(vello_cpu::kurbo::Affine::scale_non_uniform(
                stretch.0, stretch.1,
            ));
            match scene {
                SceneState::Mesh(m) => draw_mesh(ctx, m, t),
                SceneState::Metaballs(m) => draw_metaballs(ctx, m, t),
                SceneState::Gradients(g) => {
                    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                    draw_gradients(ctx, g, size);
                }
            }
        });
        target.over_in_place(pixmap.data_as_u8_slice(), 1.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
