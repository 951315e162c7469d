use std::cell::RefCell;
use std::rc::Rc;

use image::ImageEncoder as _;
use serde::{Deserialize, Serialize};

use crate::{
    export::{
        artifact::{Artifact, ArtifactSink, SavedArtifact},
        overlay::OverlaySet,
    },
    foundation::{
        color::Color,
        core::Size,
        error::{EncodeError, GenSceneError, GenSceneResult},
    },
    render::{
        frame::{FrameBuffer, MAX_FRAME_DIM},
        painter::CaptureSurface,
    },
    timing::scheduler::Scheduler,
};

/// One still-image capture.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRequest {
    /// Output size.
    pub size: Size,
    /// Product name, used in the file name.
    pub product: String,
    /// Background color as a CSS hex string.
    pub background: String,
}

impl CaptureRequest {
    /// Check the size bounds and parse the background.
    pub fn validate(&self) -> GenSceneResult<Color> {
        self.size.validate_within("capture size", MAX_FRAME_DIM)?;
        Color::from_hex(&self.background).map_err(|e| {
            GenSceneError::validation(format!("background '{}': {e}", self.background))
        })
    }
}

/// `<width>x<height>-<product>.png`.
pub fn image_file_name(size: Size, product: &str) -> String {
    format!("{}x{}-{product}.png", size.width, size.height)
}

/// Background, then `source`, then overlays, on a buffer of the request size.
pub fn compose_capture(
    source: &FrameBuffer,
    overlays: &OverlaySet,
    req: &CaptureRequest,
) -> GenSceneResult<FrameBuffer> {
    let background = req.validate()?;
    let mut frame = FrameBuffer::filled(req.size, background);
    frame.blit_over(source, 0, 0);
    overlays.draw(&mut frame)?;
    Ok(frame)
}

/// Encode a frame as PNG bytes.
pub fn encode_png(frame: &FrameBuffer) -> Result<Vec<u8>, EncodeError> {
    let rgba = frame.to_straight_rgba8();
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(
            &rgba,
            frame.width,
            frame.height,
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| EncodeError::Image(e.to_string()))?;
    Ok(out)
}

/// Captures still images of the current frame and hands them to an [`ArtifactSink`].
#[derive(Clone)]
pub struct ImageExporter {
    scheduler: Scheduler,
    surface: Rc<RefCell<dyn CaptureSurface>>,
    overlays: Rc<RefCell<OverlaySet>>,
    sink: Rc<dyn ArtifactSink>,
}

impl ImageExporter {
    /// Exporter drawing from `surface` into `sink`.
    pub fn new(
        scheduler: Scheduler,
        surface: Rc<RefCell<dyn CaptureSurface>>,
        sink: Rc<dyn ArtifactSink>,
    ) -> Self {
        Self {
            scheduler,
            surface,
            overlays: Rc::new(RefCell::new(OverlaySet::default())),
            sink,
        }
    }

    /// Replace the overlays drawn on every capture.
    pub fn set_overlays(&self, overlays: OverlaySet) {
        *self.overlays.borrow_mut() = overlays;
    }

    /// Wait for the next frame boundary, then read the surface, compose, encode and save.
    ///
    /// `on_done` runs exactly once with the outcome. An invalid request is reported immediately
    /// and schedules nothing.
    #[tracing::instrument(skip(self, on_done), fields(size = %req.size))]
    pub fn capture(
        &self,
        req: CaptureRequest,
        on_done: impl FnOnce(GenSceneResult<SavedArtifact>) + 'static,
    ) {
        if let Err(err) = req.validate() {
            on_done(Err(err));
            return;
        }

        let surface = Rc::clone(&self.surface);
        let overlays = Rc::clone(&self.overlays);
        let sink = Rc::clone(&self.sink);
        self.scheduler.request_frame(move || {
            let saved = surface
                .borrow_mut()
                .capture(req.size)
                .and_then(|source| compose_capture(&source, &overlays.borrow(), &req))
                .and_then(|frame| Ok(encode_png(&frame)?))
                .and_then(|bytes| {
                    let artifact = Artifact {
                        file_name: image_file_name(req.size, &req.product),
                        bytes,
                    };
                    sink.save(&artifact)?;
                    Ok(SavedArtifact::from(&artifact))
                });
            on_done(saved);
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/image.rs"]
mod tests;
