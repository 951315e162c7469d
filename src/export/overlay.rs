use std::sync::Arc;

use crate::{
    export::{bundle::BundleLayout, fetch::AssetFetcher},
    foundation::{
        core::Size,
        error::{FetchError, GenSceneError, GenSceneResult},
    },
    render::frame::FrameBuffer,
};

// Largest overlay raster we are willing to allocate per axis.
const MAX_DIM: u32 = 16_384;

/// Corner an overlay is pinned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayAnchor {
    /// Top-left corner.
    TopLeft,
    /// Bottom-right corner.
    BottomRight,
}

/// Where and how large an overlay is drawn, relative to the capture height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayPlacement {
    /// Pinned corner.
    pub anchor: OverlayAnchor,
    /// Overlay height as a fraction of the capture height.
    pub height_frac: f64,
    /// Margin from the corner as a fraction of the capture height.
    pub margin_frac: f64,
}

impl OverlayPlacement {
    /// Product-name text placement.
    pub const PRODUCT_NAME: Self = Self {
        anchor: OverlayAnchor::TopLeft,
        height_frac: 0.08,
        margin_frac: 0.05,
    };

    /// Logo placement.
    pub const LOGO: Self = Self {
        anchor: OverlayAnchor::BottomRight,
        height_frac: 0.1,
        margin_frac: 0.05,
    };
}

/// A parsed SVG drawn on top of captured images.
#[derive(Clone)]
pub struct Overlay {
    name: String,
    tree: Arc<usvg::Tree>,
    placement: OverlayPlacement,
}

impl std::fmt::Debug for Overlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Overlay")
            .field("name", &self.name)
            .field("placement", &self.placement)
            .finish_non_exhaustive()
    }
}

impl Overlay {
    /// Parse SVG bytes.
    pub fn from_svg_bytes(
        name: impl Into<String>,
        bytes: &[u8],
        placement: OverlayPlacement,
    ) -> GenSceneResult<Self> {
        let name = name.into();
        let tree = usvg::Tree::from_data(bytes, &usvg::Options::default())
            .map_err(|e| GenSceneError::validation(format!("overlay '{name}': {e}")))?;
        Ok(Self {
            name,
            tree: Arc::new(tree),
            placement,
        })
    }

    /// Overlay name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rasterize for a capture of `target` and return the raster with its top-left position.
    pub fn rasterize(&self, target: Size) -> GenSceneResult<(FrameBuffer, i64, i64)> {
        let svg = self.tree.size();
        let (sw, sh) = (f64::from(svg.width()), f64::from(svg.height()));
        if !(sw.is_finite() && sh.is_finite()) || sw <= 0.0 || sh <= 0.0 {
            return Err(GenSceneError::validation(format!(
                "overlay '{}' has invalid width/height",
                self.name
            )));
        }
        let th = f64::from(target.height);
        let h = (th * self.placement.height_frac).round().max(1.0);
        let scale = h / sh;
        let w = (sw * scale).round().max(1.0);
        if w > f64::from(MAX_DIM) || h > f64::from(MAX_DIM) {
            return Err(GenSceneError::validation(format!(
                "overlay '{}' raster too large: {w}x{h}",
                self.name
            )));
        }
        let (w, h) = (w as u32, h as u32);

        let mut pixmap = resvg::tiny_skia::Pixmap::new(w, h)
            .ok_or_else(|| GenSceneError::validation("failed to allocate overlay pixmap"))?;
        let xform = resvg::tiny_skia::Transform::from_scale(
            w as f32 / svg.width(),
            h as f32 / svg.height(),
        );
        resvg::render(&self.tree, xform, &mut pixmap.as_mut());
        let frame = FrameBuffer::from_premul(Size::new(w, h), pixmap.data().to_vec())?;

        let margin = (th * self.placement.margin_frac).round() as i64;
        let (x, y) = match self.placement.anchor {
            OverlayAnchor::TopLeft => (margin, margin),
            OverlayAnchor::BottomRight => (
                i64::from(target.width) - i64::from(w) - margin,
                i64::from(target.height) - i64::from(h) - margin,
            ),
        };
        Ok((frame, x, y))
    }
}

/// Overlays drawn on every captured image, in order.
#[derive(Clone, Debug, Default)]
pub struct OverlaySet {
    /// Product-name text.
    pub product_name: Option<Overlay>,
    /// Logo.
    pub logo: Option<Overlay>,
}

impl OverlaySet {
    /// Overlays present, bottom first.
    pub fn iter(&self) -> impl Iterator<Item = &Overlay> {
        self.product_name.iter().chain(self.logo.iter())
    }

    /// Composite every overlay onto `frame`.
    pub fn draw(&self, frame: &mut FrameBuffer) -> GenSceneResult<()> {
        let size = frame.size();
        for overlay in self.iter() {
            let (raster, x, y) = overlay.rasterize(size)?;
            frame.blit_over(&raster, x, y);
        }
        Ok(())
    }

    /// Fetch and parse the product-name and logo SVGs named by `layout`.
    ///
    /// A missing or unparsable overlay is logged and skipped.
    pub async fn load(fetcher: &dyn AssetFetcher, layout: &BundleLayout, product: &str) -> Self {
        let product_path = layout.asset_source_path(&layout.product_asset_name(product));
        let logo_path = layout.asset_source_path(&layout.secondary_asset_name());
        let (product_bytes, logo_bytes) =
            futures::future::join(fetcher.fetch(product_path), fetcher.fetch(logo_path)).await;

        fn parse(
            name: &str,
            bytes: Result<Vec<u8>, FetchError>,
            placement: OverlayPlacement,
        ) -> Option<Overlay> {
            let parsed = bytes
                .map_err(GenSceneError::from)
                .and_then(|b| Overlay::from_svg_bytes(name, &b, placement));
            match parsed {
                Ok(o) => Some(o),
                Err(err) => {
                    tracing::warn!(overlay = name, error = %err, "skipping overlay");
                    None
                }
            }
        }
        Self {
            product_name: parse("product-name", product_bytes, OverlayPlacement::PRODUCT_NAME),
            logo: parse("logo", logo_bytes, OverlayPlacement::LOGO),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/overlay.rs"]
mod tests;
