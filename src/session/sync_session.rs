use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt as _;

use crate::{
    batch::sequencer::{BatchSequencer, BatchState},
    channel::{
        bus::{Message, MessageBus, SubscriptionId},
        message::{INBOUND_CHANNELS, Inbound, LayerUpdate, Outbound, ParamChange},
    },
    export::{
        artifact::{ArtifactSink, SavedArtifact},
        bundle::export_bundle,
        fetch::AssetFetcher,
        image::{CaptureRequest, ImageExporter},
        overlay::OverlaySet,
        snapshot::{ExportSnapshot, export_snapshot},
    },
    foundation::{
        color::Color,
        core::{LayerIndex, Millis, Size},
        error::{GenSceneError, GenSceneResult},
        math::layer_seed,
    },
    model::{
        document::SceneDocument,
        randomize::randomize,
        wire::{WireDocument, from_wire, to_wire},
    },
    render::{
        cpu::CpuPainter,
        painter::{CaptureSurface, SceneSurface},
    },
    scene::{
        build_document,
        builder::{BuildCtx, build_layer, builder_for},
        cache::SceneCache,
        classify::LayerKind,
        metaballs::{recolor, resize_scene},
        state::SceneState,
    },
    session::opts::SessionOpts,
    timing::{
        debounce::{Debouncer, make_debouncer},
        resize::ResizeController,
        scheduler::Scheduler,
    },
};

const SUBSCRIPTION_KEY: &str = "genscene-session";

/// Collaborators a [`Session`] talks to.
pub struct SessionDeps {
    /// Source of bundle files and overlay images.
    pub fetcher: Rc<dyn AssetFetcher>,
    /// Destination of exported files.
    pub sink: Rc<dyn ArtifactSink>,
    /// Surface image captures read from. `None` paints the cached scenes with the CPU painter.
    pub surface: Option<Rc<RefCell<dyn CaptureSurface>>>,
}

/// Layer synchronization and export session.
///
/// Owns the scene cache, the per-layer resize debouncers, the batch sequencer and the exporters.
/// Inbound messages are handled one at a time; every failure becomes a single
/// [`Outbound::Failure`] and the session keeps running.
pub struct Session {
    opts: SessionOpts,
    scheduler: Scheduler,
    cache: Rc<RefCell<SceneCache>>,
    document: Rc<RefCell<Option<SceneDocument>>>,
    resize: RefCell<ResizeController>,
    batch: BatchSequencer,
    images: ImageExporter,
    fetcher: Rc<dyn AssetFetcher>,
    sink: Rc<dyn ArtifactSink>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
    viewport: Cell<Size>,
    randomized: Cell<u64>,
    outbound: MessageBus<Outbound>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("opts", &self.opts)
            .field("scheduler", &self.scheduler)
            .field("cached_layers", &self.cache.borrow().len())
            .field("batch", &self.batch.state())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// New session with an empty cache and no document.
    pub fn new(opts: SessionOpts, deps: SessionDeps) -> Self {
        let scheduler = Scheduler::new(opts.frame_interval_ms);
        let cache = Rc::new(RefCell::new(SceneCache::new()));
        let document = Rc::new(RefCell::new(None));
        let outbound = MessageBus::new();

        let signal = outbound.clone();
        let batch = BatchSequencer::new(&scheduler, opts.batch_pause_ms, move |size| {
            signal.send(Outbound::SetCustomSize(size));
        });

        let surface: Rc<RefCell<dyn CaptureSurface>> = match deps.surface {
            Some(surface) => surface,
            None => Rc::new(RefCell::new(SceneSurface::new(
                CpuPainter::default(),
                Rc::clone(&cache),
                Rc::clone(&document),
            ))),
        };
        let images = ImageExporter::new(scheduler.clone(), surface, Rc::clone(&deps.sink));

        let pool = LocalPool::new();
        let spawner = pool.spawner();
        let viewport = Cell::new(opts.viewport);
        Self {
            opts,
            scheduler,
            cache,
            document,
            resize: RefCell::new(ResizeController::new()),
            batch,
            images,
            fetcher: deps.fetcher,
            sink: deps.sink,
            pool: RefCell::new(pool),
            spawner,
            viewport,
            randomized: Cell::new(0),
            outbound,
        }
    }

    /// Subscribe this session to every inbound channel of `inbound`.
    ///
    /// Registration is keyed, so attaching the same session twice replaces the earlier handlers.
    pub fn attach(self: &Rc<Self>, inbound: &MessageBus<Inbound>) -> Vec<SubscriptionId> {
        INBOUND_CHANNELS
            .iter()
            .map(|channel| {
                let weak: Weak<Self> = Rc::downgrade(self);
                inbound.subscribe_keyed(channel, SUBSCRIPTION_KEY, move |msg| {
                    if let Some(session) = weak.upgrade() {
                        session.handle(msg.clone());
                    }
                })
            })
            .collect()
    }

    /// Messages to the application core.
    pub fn outbound(&self) -> &MessageBus<Outbound> {
        &self.outbound
    }

    /// Virtual clock driving debounces, batch pauses and frame boundaries.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Session options.
    pub fn opts(&self) -> &SessionOpts {
        &self.opts
    }

    /// Cached scenes.
    pub fn cache(&self) -> Ref<'_, SceneCache> {
        self.cache.borrow()
    }

    /// Current document, if the core has started.
    pub fn document(&self) -> Option<SceneDocument> {
        self.document.borrow().clone()
    }

    /// Batch sequencer state.
    pub fn batch_state(&self) -> BatchState {
        self.batch.state()
    }

    /// Last known host window size.
    pub fn viewport(&self) -> Size {
        self.viewport.get()
    }

    /// Layers with a live resize handler.
    pub fn resize_bindings(&self) -> Vec<LayerIndex> {
        self.resize.borrow().bound_layers()
    }

    /// Replace the overlays drawn on captured images.
    pub fn set_overlays(&self, overlays: OverlaySet) {
        self.images.set_overlays(overlays);
    }

    /// Handle one inbound message and deliver whatever it produced.
    #[tracing::instrument(skip_all, fields(channel = msg.channel()))]
    pub fn handle(&self, msg: Inbound) {
        let channel = msg.channel();
        if let Err(err) = self.dispatch(msg) {
            self.report(channel, &err);
        }
        self.flush();
    }

    /// Advance the clock by `ms`, then deliver what the fired timers produced.
    pub fn tick(&self, ms: Millis) -> usize {
        let fired = self.scheduler.advance(ms);
        self.flush();
        fired
    }

    /// Fire every pending timer, then deliver.
    pub fn run_until_idle(&self) -> usize {
        let fired = self.scheduler.run_until_idle();
        self.flush();
        fired
    }

    /// Drive spawned exports as far as they go and deliver queued outbound messages.
    pub fn flush(&self) -> usize {
        match self.pool.try_borrow_mut() {
            Ok(mut pool) => pool.run_until_stalled(),
            Err(_) => tracing::trace!("executor already running"),
        }
        self.outbound.pump()
    }

    /// Forward a control-panel parameter change to the core.
    pub fn notify_param(&self, change: ParamChange) {
        self.outbound.send(Outbound::Param(change));
        self.flush();
    }

    /// Apply a `"W,H"` custom size typed into the size panel, falling back to the viewport.
    pub fn set_custom_size(&self, input: &str) {
        let size = Size::parse_custom_or(input, self.viewport.get());
        self.outbound.send(Outbound::SetCustomSize(size));
        self.flush();
    }

    /// Stop timers and batch runs and drop every cached scene.
    pub fn shutdown(&self) {
        self.batch.cancel();
        self.resize.borrow_mut().clear();
        self.cache.borrow_mut().clear();
        *self.document.borrow_mut() = None;
        tracing::info!("session shut down");
    }

    fn report(&self, context: &str, err: &GenSceneError) {
        if err.is_recoverable() {
            tracing::warn!(context, error = %err, "request failed");
        } else {
            tracing::error!(context, error = %err, "request failed");
        }
        self.outbound
            .send(Outbound::Failure(format!("{context}: {err}")));
    }

    fn dispatch(&self, msg: Inbound) -> GenSceneResult<()> {
        match msg {
            Inbound::StartGui(wire) => self.start_gui(wire),
            Inbound::Import(json) => self.import(&json),
            Inbound::Export(state) => self.export(&state),
            Inbound::ExportZip(state) => self.export_zip(&state),
            Inbound::RequestMeshRebuild { layer, document } => self.rebuild_mesh(layer, document),
            Inbound::BuildGradientTextures { layer, model } => {
                self.build_gradient_textures(layer, &model)
            }
            Inbound::UpdateMetaballColors { layer, colors } => {
                self.update_metaball_colors(layer, colors)
            }
            Inbound::RequestWindowResize(size) => {
                self.viewport.set(size);
                self.resize.borrow().notify(size);
                Ok(())
            }
            Inbound::RequestFitToWindow => {
                self.outbound
                    .send(Outbound::SetCustomSize(self.viewport.get()));
                Ok(())
            }
            Inbound::TriggerSavePng(req) => {
                self.capture(req);
                Ok(())
            }
            Inbound::SaveBatch(sizes) => Ok(self.batch.start(&sizes)?),
            Inbound::CancelBatch => {
                self.batch.cancel();
                Ok(())
            }
            Inbound::NextBatchStep => self.next_batch_step(),
            Inbound::RequestRandomize(wire) => self.randomize(wire),
            Inbound::LayerRemoved(layer) => {
                self.resize.borrow_mut().unbind(layer);
                self.cache.borrow_mut().invalidate(layer);
                Ok(())
            }
        }
    }

    fn start_gui(&self, wire: WireDocument) -> GenSceneResult<()> {
        let doc = from_wire(wire)?;
        doc.config.validate()?;
        self.rebuild_all(&doc, "startGui");

        {
            let mut resize = self.resize.borrow_mut();
            for index in resize.bound_layers() {
                if doc.layers.get(index).map(|l| l.kind()) != Some(LayerKind::MetaballField) {
                    resize.unbind(index);
                }
            }
            for (index, layer) in doc.layers.iter().enumerate() {
                if layer.kind().is_resizable() {
                    resize.bind(index, self.metaball_resizer(index));
                }
            }
        }

        let product = doc.config.product.clone();
        *self.document.borrow_mut() = Some(doc);
        self.load_overlays(product)
    }

    // Rebuild every layer from scratch and announce mesh layers.
    fn rebuild_all(&self, doc: &SceneDocument, context: &str) {
        let failures = {
            let mut cache = self.cache.borrow_mut();
            for index in cache.indices() {
                let kind = doc.layers.get(index).map(|l| l.kind());
                if kind != cache.get(index).map(SceneState::kind) {
                    cache.invalidate(index);
                }
            }
            build_document(doc, self.opts.seed, &mut cache)
        };
        let failed: Vec<LayerIndex> = failures.iter().map(|(index, _)| *index).collect();
        for (index, err) in failures {
            self.report(&format!("{context} layer {index}"), &err.into());
        }
        let cache = self.cache.borrow();
        for index in (0..doc.layers.len()).filter(|i| !failed.contains(i)) {
            if let Some(mesh) = cache.get(index).and_then(SceneState::as_mesh) {
                self.outbound.send(Outbound::RebuildMesh(LayerUpdate {
                    layer: index,
                    value: mesh.clone(),
                }));
            }
        }
    }

    fn metaball_resizer(&self, layer: LayerIndex) -> Debouncer<Size> {
        let cache = Rc::clone(&self.cache);
        let outbound = self.outbound.clone();
        make_debouncer(&self.scheduler, self.opts.debounce_ms, move |size: Size| {
            let mut cache = cache.borrow_mut();
            let Some(prior) = cache.get(layer).and_then(SceneState::as_metaballs) else {
                tracing::debug!(layer, "no metaball scene to resize");
                return;
            };
            match resize_scene(prior, size) {
                Ok(scene) => {
                    tracing::debug!(layer, %size, "metaballs resized");
                    cache.set(layer, SceneState::Metaballs(scene));
                }
                Err(err) => {
                    tracing::warn!(layer, error = %err, "metaball resize failed");
                    outbound.send(Outbound::Failure(format!("resize layer {layer}: {err}")));
                }
            }
        })
    }

    fn load_overlays(&self, product: String) -> GenSceneResult<()> {
        let fetcher = Rc::clone(&self.fetcher);
        let layout = self.opts.bundle.clone();
        let images = self.images.clone();
        self.spawner
            .spawn_local(async move {
                let overlays = OverlaySet::load(&*fetcher, &layout, &product).await;
                images.set_overlays(overlays);
            })
            .map_err(|e| GenSceneError::Other(anyhow::anyhow!("spawn overlay load: {e}")))
    }

    fn import(&self, json: &str) -> GenSceneResult<()> {
        let doc = SceneDocument::from_json(json)?;
        let wire = to_wire(&doc)?;
        self.outbound.send(Outbound::Import(wire.to_json()?));
        self.rebuild_all(&doc, "import_");
        self.outbound.send(Outbound::Pause);
        *self.document.borrow_mut() = Some(doc);
        Ok(())
    }

    fn snapshot(&self, state: &str) -> GenSceneResult<ExportSnapshot> {
        self.outbound.send(Outbound::Pause);
        export_snapshot(
            state,
            &self.cache.borrow(),
            self.opts.seed,
            self.opts.fuzz_policy,
        )
    }

    fn export(&self, state: &str) -> GenSceneResult<()> {
        let snapshot = self.snapshot(state)?;
        self.outbound.send(Outbound::ExportReady(snapshot.json));
        Ok(())
    }

    fn export_zip(&self, state: &str) -> GenSceneResult<()> {
        let snapshot = self.snapshot(state)?;
        let fetcher = Rc::clone(&self.fetcher);
        let sink = Rc::clone(&self.sink);
        let outbound = self.outbound.clone();
        let layout = self.opts.bundle.clone();
        self.spawner
            .spawn_local(async move {
                let saved = export_bundle(&layout, &*fetcher, &snapshot)
                    .await
                    .and_then(|artifact| {
                        sink.save(&artifact)?;
                        Ok(SavedArtifact::from(&artifact))
                    });
                match saved {
                    Ok(saved) => outbound.send(Outbound::ArtifactSaved(saved)),
                    Err(err) => {
                        tracing::error!(error = %err, "bundle export failed");
                        outbound.send(Outbound::Failure(format!("exportZip_: {err}")));
                    }
                }
            })
            .map_err(|e| GenSceneError::Other(anyhow::anyhow!("spawn bundle export: {e}")))
    }

    fn rebuild_mesh(&self, layer: LayerIndex, wire: WireDocument) -> GenSceneResult<()> {
        let doc = from_wire(wire)?;
        let descriptor = doc.layer(layer)?;
        let kind = descriptor.kind();
        if kind != LayerKind::MeshField {
            tracing::debug!(layer, ?kind, "rebuild requested for a non-mesh layer");
            return Ok(());
        }

        let ticket = self.cache.borrow_mut().begin(layer);
        let ctx = BuildCtx::for_layer(&doc.config, self.opts.seed, layer, kind);
        let state = build_layer(&ctx, descriptor.model.value(), None)?;
        let mesh = state.as_mesh().cloned();
        if self.cache.borrow_mut().commit(ticket, state) {
            if let Some(mesh) = mesh {
                self.outbound.send(Outbound::RebuildMesh(LayerUpdate {
                    layer,
                    value: mesh,
                }));
            }
        }
        *self.document.borrow_mut() = Some(doc);
        Ok(())
    }

    fn build_gradient_textures(
        &self,
        layer: LayerIndex,
        model: &serde_json::Value,
    ) -> GenSceneResult<()> {
        let config = self
            .document
            .borrow()
            .as_ref()
            .map(|d| d.config.clone())
            .ok_or_else(|| GenSceneError::validation("no document; the core has not started"))?;
        let builder = builder_for(LayerKind::FluidGradient)
            .ok_or_else(|| GenSceneError::validation("no gradient builder registered"))?;
        let ctx = BuildCtx::for_layer(&config, self.opts.seed, layer, LayerKind::FluidGradient);
        let state = builder.build(&ctx, model, None)?;
        if let Some(textures) = state.as_gradients().cloned() {
            self.cache.borrow_mut().set(layer, state);
            self.outbound.send(Outbound::LoadGradientTextures(LayerUpdate {
                layer,
                value: textures,
            }));
        }
        Ok(())
    }

    fn update_metaball_colors(&self, layer: LayerIndex, colors: Vec<Color>) -> GenSceneResult<()> {
        let mut cache = self.cache.borrow_mut();
        let prior = cache
            .get(layer)
            .and_then(SceneState::as_metaballs)
            .ok_or_else(|| {
                GenSceneError::validation(format!("layer {layer} has no metaball scene"))
            })?;
        let scene = recolor(prior, colors)?;
        cache.set(layer, SceneState::Metaballs(scene));
        Ok(())
    }

    fn capture(&self, req: CaptureRequest) {
        let outbound = self.outbound.clone();
        self.images.capture(req, move |saved| match saved {
            Ok(saved) => outbound.send(Outbound::ArtifactSaved(saved)),
            Err(err) => {
                tracing::error!(error = %err, "image export failed");
                outbound.send(Outbound::Failure(format!("triggerSavePng: {err}")));
            }
        });
    }

    fn next_batch_step(&self) -> GenSceneResult<()> {
        let Some(size) = self.batch.capture_size() else {
            tracing::debug!("no batch capture pending");
            return Ok(());
        };
        let req = {
            let document = self.document.borrow();
            let config = &document
                .as_ref()
                .ok_or_else(|| GenSceneError::validation("no document; the core has not started"))?
                .config;
            CaptureRequest {
                size,
                product: config.product.clone(),
                background: config.background.clone(),
            }
        };
        self.capture(req);
        Ok(())
    }

    fn randomize(&self, wire: WireDocument) -> GenSceneResult<()> {
        let doc = from_wire(wire)?;
        let round = self.randomized.get();
        self.randomized.set(round + 1);
        let seed = layer_seed(self.opts.seed, round as usize, b'R');
        let randomized = randomize(&doc, seed);
        self.outbound
            .send(Outbound::ApplyRandomizer(to_wire(&randomized)?));
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/sync_session.rs"]
mod tests;
