use super::*;
use crate::export::artifact::MemorySink;

struct Solid {
    color: Color,
    calls: usize,
}

impl CaptureSurface for Solid {
    fn capture(&mut self, size: Size) -> GenSceneResult<FrameBuffer> {
        self.calls += 1;
        Ok(FrameBuffer::filled(
            Size::new(size.width / 2, size.height),
            self.color,
        ))
    }
}

/// Records the virtual time of every read.
struct Timed {
    clock: Scheduler,
    reads: Vec<u64>,
}

impl CaptureSurface for Timed {
    fn capture(&mut self, size: Size) -> GenSceneResult<FrameBuffer> {
        self.reads.push(self.clock.now());
        Ok(FrameBuffer::new(size))
    }
}

struct Broken;

impl CaptureSurface for Broken {
    fn capture(&mut self, _size: Size) -> GenSceneResult<FrameBuffer> {
        Err(GenSceneError::validation("no surface"))
    }
}

fn request(w: u32, h: u32) -> CaptureRequest {
    CaptureRequest {
        size: Size::new(w, h),
        product: "clion".to_owned(),
        background: "#0000ff".to_owned(),
    }
}

type Outcome = Rc<RefCell<Option<GenSceneResult<SavedArtifact>>>>;

fn recorder() -> (Outcome, impl FnOnce(GenSceneResult<SavedArtifact>) + 'static) {
    let out: Outcome = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&out);
    (out, move |r| *slot.borrow_mut() = Some(r))
}

#[test]
fn file_name_is_size_and_product() {
    assert_eq!(image_file_name(Size::new(1920, 1080), "rider"), "1920x1080-rider.png");
}

#[test]
fn compose_paints_background_then_source() {
    let red = FrameBuffer::filled(Size::new(2, 2), Color::rgba(1.0, 0.0, 0.0, 1.0));
    let frame = compose_capture(&red, &OverlaySet::default(), &request(4, 2)).unwrap();
    assert_eq!(frame.pixel(0, 0), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(3, 1), Some([0, 0, 255, 255]));
}

#[test]
fn compose_rejects_bad_requests() {
    let src = FrameBuffer::new(Size::new(1, 1));
    assert!(compose_capture(&src, &OverlaySet::default(), &request(0, 4)).is_err());
    assert!(compose_capture(&src, &OverlaySet::default(), &request(MAX_FRAME_DIM + 1, 4)).is_err());
    let mut bad = request(2, 2);
    bad.background = "blue-ish".to_owned();
    assert!(matches!(
        compose_capture(&src, &OverlaySet::default(), &bad),
        Err(GenSceneError::Validation(_))
    ));
}

#[test]
fn png_is_straight_alpha() {
    let mut frame = FrameBuffer::new(Size::new(1, 1));
    frame.data.copy_from_slice(&[128, 0, 0, 128]);
    let png = encode_png(&frame).unwrap();
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (1, 1));
    let px = decoded.get_pixel(0, 0).0;
    assert_eq!(px[3], 128);
    assert!(px[0] >= 254, "{px:?}");
}

#[test]
fn capture_saves_after_next_frame() {
    let scheduler = Scheduler::new(16);
    let sink = Rc::new(MemorySink::new());
    let surface = Rc::new(RefCell::new(Solid {
        color: Color::rgba(0.0, 1.0, 0.0, 1.0),
        calls: 0,
    }));
    let exporter = ImageExporter::new(scheduler.clone(), surface.clone(), sink.clone());
    let (outcome, on_done) = recorder();

    exporter.capture(request(4, 2), on_done);
    assert_eq!(surface.borrow().calls, 0);
    assert!(outcome.borrow().is_none());
    assert!(sink.file_names().is_empty());

    scheduler.advance(16);
    assert_eq!(surface.borrow().calls, 1);
    let saved = outcome.borrow_mut().take().unwrap().unwrap();
    assert_eq!(saved.file_name, "4x2-clion.png");
    assert_eq!(sink.file_names(), vec!["4x2-clion.png"]);

    let png = &sink.artifacts()[0].bytes;
    assert_eq!(saved.len, png.len());
    let decoded = image::load_from_memory(png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (4, 2));
    assert_eq!(decoded.get_pixel(0, 0).0, [0, 255, 0, 255]);
    assert_eq!(decoded.get_pixel(3, 0).0, [0, 0, 255, 255]);
}

#[test]
fn surface_is_read_at_the_frame_boundary() {
    let scheduler = Scheduler::new(16);
    scheduler.advance(5);
    let surface = Rc::new(RefCell::new(Timed {
        clock: scheduler.clone(),
        reads: Vec::new(),
    }));
    let exporter = ImageExporter::new(
        scheduler.clone(),
        surface.clone(),
        Rc::new(MemorySink::new()),
    );
    let (outcome, on_done) = recorder();
    exporter.capture(request(2, 2), on_done);
    assert!(surface.borrow().reads.is_empty());

    scheduler.advance(20);
    assert_eq!(surface.borrow().reads, vec![16]);
    assert!(matches!(*outcome.borrow(), Some(Ok(_))));
}

#[test]
fn invalid_request_reports_immediately() {
    let scheduler = Scheduler::new(16);
    let sink = Rc::new(MemorySink::new());
    let surface = Rc::new(RefCell::new(Solid {
        color: Color::rgba(0.0, 1.0, 0.0, 1.0),
        calls: 0,
    }));
    let exporter = ImageExporter::new(scheduler.clone(), surface.clone(), sink.clone());

    for req in [
        request(u32::MAX, u32::MAX),
        request(MAX_FRAME_DIM + 1, 10),
        request(0, 10),
    ] {
        let (outcome, on_done) = recorder();
        exporter.capture(req, on_done);
        assert!(matches!(*outcome.borrow(), Some(Err(GenSceneError::Validation(_)))));
    }
    assert_eq!(scheduler.pending(), 0);
    assert_eq!(surface.borrow().calls, 0);
    assert!(sink.file_names().is_empty());
}

#[test]
fn surface_failure_reports_once_at_the_boundary() {
    let scheduler = Scheduler::new(16);
    let sink = Rc::new(MemorySink::new());
    let exporter = ImageExporter::new(scheduler.clone(), Rc::new(RefCell::new(Broken)), sink.clone());
    let (outcome, on_done) = recorder();
    exporter.capture(request(4, 2), on_done);
    assert!(outcome.borrow().is_none());
    assert_eq!(scheduler.pending(), 1);

    scheduler.run_until_idle();
    assert!(matches!(*outcome.borrow(), Some(Err(_))));
    assert!(sink.file_names().is_empty());
}
