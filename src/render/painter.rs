use std::cell::RefCell;
use std::rc::Rc;

use crate::{
    foundation::{
        core::{LayerIndex, Size},
        error::GenSceneResult,
    },
    model::document::SceneDocument,
    render::frame::{FrameBuffer, MAX_FRAME_DIM},
    scene::{cache::SceneCache, state::SceneState},
};

/// Opaque "paint this layer's scene into a buffer" operation.
pub trait LayerPainter {
    /// Composite `scene` over `target`.
    fn paint(
        &mut self,
        layer: LayerIndex,
        scene: &SceneState,
        target: &mut FrameBuffer,
    ) -> GenSceneResult<()>;
}

/// Paint every visible cached layer of `doc` in z-order.
pub fn paint_document(
    painter: &mut dyn LayerPainter,
    doc: &SceneDocument,
    cache: &SceneCache,
    target: &mut FrameBuffer,
) -> GenSceneResult<usize> {
    let mut painted = 0;
    for (index, layer) in doc.layers.iter().enumerate() {
        if !layer.visible {
            continue;
        }
        if let Some(scene) = cache.get(index) {
            painter.paint(index, scene, target)?;
            painted += 1;
        }
    }
    Ok(painted)
}

/// Source of the "current rendered buffer" an image capture composes.
pub trait CaptureSurface {
    /// Render the current frame at `size`.
    fn capture(&mut self, size: Size) -> GenSceneResult<FrameBuffer>;
}

/// [`CaptureSurface`] that paints the session's cached scenes.
pub struct SceneSurface<P: LayerPainter> {
    painter: P,
    cache: Rc<RefCell<SceneCache>>,
    document: Rc<RefCell<Option<SceneDocument>>>,
}

impl<P: LayerPainter> SceneSurface<P> {
    /// Surface over shared session state.
    pub fn new(
        painter: P,
        cache: Rc<RefCell<SceneCache>>,
        document: Rc<RefCell<Option<SceneDocument>>>,
    ) -> Self {
        Self {
            painter,
            cache,
            document,
        }
    }
}

impl<P: LayerPainter> CaptureSurface for SceneSurface<P> {
    fn capture(&mut self, size: Size) -> GenSceneResult<FrameBuffer> {
        let mut frame = FrameBuffer::new(size.validate_within("surface size", MAX_FRAME_DIM)?);
        let document = self.document.borrow();
        if let Some(doc) = document.as_ref() {
            paint_document(&mut self.painter, doc, &self.cache.borrow(), &mut frame)?;
        }
        Ok(frame)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/painter.rs"]
mod tests;
