use super::*;
use crate::{
    channel::bus::ANY_CHANNEL,
    export::{artifact::MemorySink, fetch::MemoryFetcher},
};
use serde_json::json;

type Log = Rc<RefCell<Vec<Outbound>>>;

fn document() -> SceneDocument {
    SceneDocument::from_json(
        &json!({
            "product": "clion",
            "size": [64, 48],
            "background": "#000000",
            "layers": [
                {"model": {"faces": {"x": 3, "y": 2}, "amplitude": {"x": 0.2, "y": 0.2, "z": 0.1}}},
                {"model": {"colors": ["#ff0000", "#00ff00"]}},
                {"model": {"groups": [{"gradient": [
                    {"color": "#000000", "offset": 0.0},
                    {"color": "#ffffff", "offset": 1.0}
                ]}]}},
                {"model": {"text": "CLion"}, "blend": "normal"}
            ]
        })
        .to_string(),
    )
    .unwrap()
}

fn wire() -> WireDocument {
    to_wire(&document()).unwrap()
}

fn bundle_files() -> MemoryFetcher {
    MemoryFetcher::new()
        .with_file("./player.bundle.js", "player()")
        .with_file("./index.player.html", "<html></html>")
        .with_file("./index.css", "body{}")
        .with_file("./assets/clion-text.svg", "<svg/>")
        .with_file("./assets/jetbrains.svg", "<svg/>")
}

fn session_with(fetcher: MemoryFetcher, opts: SessionOpts) -> (Session, Rc<MemorySink>, Log) {
    let sink = Rc::new(MemorySink::new());
    let session = Session::new(
        opts,
        SessionDeps {
            fetcher: Rc::new(fetcher),
            sink: sink.clone(),
            surface: None,
        },
    );
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let rec = Rc::clone(&log);
    session
        .outbound()
        .subscribe(ANY_CHANNEL, move |m| rec.borrow_mut().push(m.clone()));
    (session, sink, log)
}

fn session() -> (Session, Rc<MemorySink>, Log) {
    session_with(bundle_files(), SessionOpts::default())
}

fn failures(log: &Log) -> Vec<String> {
    log.borrow()
        .iter()
        .filter_map(|m| match m {
            Outbound::Failure(reason) => Some(reason.clone()),
            _ => None,
        })
        .collect()
}

fn exported_state() -> String {
    document().to_json_pretty().unwrap()
}

#[test]
fn start_gui_builds_layers_and_binds_metaballs() {
    let (session, _, log) = session();
    session.handle(Inbound::StartGui(wire()));

    let cache = session.cache();
    assert_eq!(cache.indices(), vec![0, 1, 2]);
    assert_eq!(cache.get(0).map(SceneState::kind), Some(LayerKind::MeshField));
    assert_eq!(cache.get(1).map(SceneState::kind), Some(LayerKind::MetaballField));
    assert_eq!(cache.get(2).map(SceneState::kind), Some(LayerKind::FluidGradient));
    drop(cache);

    assert_eq!(session.resize_bindings(), vec![1]);
    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert!(matches!(&log[0], Outbound::RebuildMesh(u) if u.layer == 0 && u.value.faces == [3, 2]));
    assert_eq!(session.document().unwrap().layers.len(), 4);
}

#[test]
fn repeated_start_rebinds_instead_of_stacking() {
    let (session, _, _) = session();
    session.handle(Inbound::StartGui(wire()));
    session.handle(Inbound::StartGui(wire()));
    assert_eq!(session.resize_bindings(), vec![1]);

    session.handle(Inbound::RequestWindowResize(Size::new(128, 96)));
    assert_eq!(session.scheduler().pending(), 1);
}

#[test]
fn resize_burst_rebuilds_once_with_last_size() {
    let (session, _, _) = session();
    session.handle(Inbound::StartGui(wire()));
    let before = session.cache().get(1).cloned().unwrap();

    for w in [70, 80, 90] {
        session.handle(Inbound::RequestWindowResize(Size::new(w, 48)));
        session.tick(100);
    }
    assert_eq!(session.cache().get(1), Some(&before));
    session.tick(199);
    assert_eq!(session.cache().get(1), Some(&before));
    session.tick(1);

    let cache = session.cache();
    let after = cache.get(1).and_then(SceneState::as_metaballs).unwrap();
    assert_eq!(after.size, Size::new(90, 48));
    assert_eq!(after.ball_count(), before.as_metaballs().unwrap().ball_count());
    assert_eq!(session.viewport(), Size::new(90, 48));
}

#[test]
fn export_pauses_then_reports_snapshot_with_cached_fuzz() {
    let (session, _, log) = session();
    session.handle(Inbound::StartGui(wire()));
    log.borrow_mut().clear();

    session.handle(Inbound::Export(exported_state()));
    let log = log.borrow();
    assert_eq!(log[0], Outbound::Pause);
    let Outbound::ExportReady(json) = &log[1] else {
        panic!("expected exportReady, got {:?}", log[1]);
    };
    let snap = SceneDocument::from_json(json).unwrap();
    assert_eq!(snap.layers[0].scene_fuzz, session.cache().get(0).unwrap().fuzz());
    assert_eq!(snap.layers[1].scene_fuzz, None);
    assert_eq!(snap.layers[3].extra["blend"], json!("normal"));
}

#[test]
fn export_zip_saves_archive() {
    let (session, sink, log) = session();
    session.handle(Inbound::StartGui(wire()));
    session.handle(Inbound::ExportZip(exported_state()));

    assert_eq!(sink.file_names(), vec!["clion_html5.zip"]);
    assert!(failures(&log).is_empty());
    assert!(log.borrow().iter().any(|m| matches!(
        m,
        Outbound::ArtifactSaved(s) if s.file_name == "clion_html5.zip"
    )));
}

#[test]
fn export_zip_failure_reports_once_and_saves_nothing() {
    let fetcher = MemoryFetcher::new().with_file("./index.css", "body{}");
    let (session, sink, log) = session_with(fetcher, SessionOpts::default());
    session.handle(Inbound::StartGui(wire()));
    session.handle(Inbound::ExportZip(exported_state()));

    assert!(sink.file_names().is_empty());
    let failures = failures(&log);
    assert_eq!(failures.len(), 1, "{failures:?}");
    assert!(failures[0].starts_with("exportZip_:"));
}

#[test]
fn import_sends_wire_rebuilds_meshes_with_fuzz_then_pauses() {
    let (source, _, source_log) = session();
    source.handle(Inbound::StartGui(wire()));
    source.handle(Inbound::Export(exported_state()));
    let json = source_log
        .borrow()
        .iter()
        .find_map(|m| match m {
            Outbound::ExportReady(json) => Some(json.clone()),
            _ => None,
        })
        .unwrap();

    let opts = SessionOpts {
        seed: 12345,
        ..SessionOpts::default()
    };
    let (session, _, log) = session_with(bundle_files(), opts);
    session.handle(Inbound::Import(json));

    let log = log.borrow();
    let channels: Vec<_> = log.iter().map(Message::channel).collect();
    assert_eq!(channels, vec!["import_", "rebuildFss", "pause"]);
    let Outbound::Import(wire_json) = &log[0] else {
        unreachable!()
    };
    let imported = from_wire(WireDocument::from_json(wire_json).unwrap()).unwrap();
    assert_eq!(imported.layers.len(), 4);
    assert_eq!(
        session.cache().get(0).unwrap().fuzz(),
        source.cache().get(0).unwrap().fuzz()
    );
}

#[test]
fn mesh_rebuild_uses_document_model() {
    let (session, _, log) = session();
    session.handle(Inbound::StartGui(wire()));
    log.borrow_mut().clear();

    let mut doc = document();
    doc.layers[0].model.value_mut()["faces"] = json!({"x": 5, "y": 4});
    session.handle(Inbound::RequestMeshRebuild {
        layer: 0,
        document: to_wire(&doc).unwrap(),
    });
    session.handle(Inbound::RequestMeshRebuild {
        layer: 1,
        document: to_wire(&doc).unwrap(),
    });

    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert!(matches!(&log[0], Outbound::RebuildMesh(u) if u.value.faces == [5, 4]));
    let cache = session.cache();
    assert_eq!(cache.get(0).and_then(SceneState::as_mesh).unwrap().faces, [5, 4]);
}

#[test]
fn mesh_rebuild_failure_keeps_prior_scene() {
    let (session, _, log) = session();
    session.handle(Inbound::StartGui(wire()));
    let prior = session.cache().get(0).cloned();

    let mut doc = document();
    doc.layers[0].model.value_mut()["faces"] = json!({"x": 0, "y": 4});
    session.handle(Inbound::RequestMeshRebuild {
        layer: 0,
        document: to_wire(&doc).unwrap(),
    });
    assert_eq!(session.cache().get(0).cloned(), prior);
    assert_eq!(failures(&log).len(), 1);
}

#[test]
fn import_build_failure_keeps_prior_scene() {
    let (session, _, log) = session();
    session.handle(Inbound::StartGui(wire()));
    let prior = session.cache().get(0).cloned();
    log.borrow_mut().clear();

    let mut doc = document();
    doc.layers[0].model.value_mut()["faces"] = json!({"x": 0, "y": 2});
    session.handle(Inbound::Import(doc.to_json_pretty().unwrap()));

    let reasons = failures(&log);
    assert_eq!(reasons.len(), 1);
    assert!(reasons[0].starts_with("import_ layer 0"));
    assert!(prior.is_some());
    assert_eq!(session.cache().get(0).cloned(), prior);
    assert_eq!(session.cache().indices(), vec![0, 1, 2]);
    assert!(
        !log.borrow()
            .iter()
            .any(|m| matches!(m, Outbound::RebuildMesh(u) if u.layer == 0))
    );
}

#[test]
fn restart_drops_layers_that_left_the_document() {
    let (session, _, log) = session();
    session.handle(Inbound::StartGui(wire()));
    let prior = session.cache().get(0).cloned();

    let mut doc = document();
    doc.layers[0].model.value_mut()["faces"] = json!({"x": 0, "y": 2});
    doc.layers.truncate(2);
    session.handle(Inbound::StartGui(to_wire(&doc).unwrap()));

    assert_eq!(failures(&log).len(), 1);
    let cache = session.cache();
    assert_eq!(cache.get(0).cloned(), prior);
    assert_eq!(cache.indices(), vec![0, 1]);
}

#[test]
fn gradient_textures_need_a_document() {
    let (session, _, log) = session();
    let model = json!({"groups": [{"gradient": [{"color": "#ff0000", "offset": 0.5}]}]});
    session.handle(Inbound::BuildGradientTextures {
        layer: 2,
        model: model.clone(),
    });
    assert_eq!(failures(&log).len(), 1);

    session.handle(Inbound::StartGui(wire()));
    log.borrow_mut().clear();
    session.handle(Inbound::BuildGradientTextures { layer: 2, model });
    let log = log.borrow();
    assert!(matches!(
        &log[0],
        Outbound::LoadGradientTextures(u) if u.layer == 2 && u.value.textures.len() == 1
    ));
}

#[test]
fn metaball_recolor_keeps_geometry() {
    let (session, _, log) = session();
    session.handle(Inbound::StartGui(wire()));
    let before = session.cache().get(1).and_then(SceneState::as_metaballs).cloned().unwrap();

    let blue = Color::from_hex("#0000ff").unwrap();
    session.handle(Inbound::UpdateMetaballColors {
        layer: 1,
        colors: vec![blue],
    });
    let after = session.cache().get(1).and_then(SceneState::as_metaballs).cloned().unwrap();
    assert_eq!(after.colors, vec![blue]);
    assert_eq!(after.groups, before.groups);

    session.handle(Inbound::UpdateMetaballColors {
        layer: 3,
        colors: vec![blue],
    });
    assert_eq!(failures(&log).len(), 1);
}

#[test]
fn sizes_follow_the_viewport() {
    let (session, _, log) = session();
    session.handle(Inbound::RequestFitToWindow);
    session.handle(Inbound::RequestWindowResize(Size::new(1024, 768)));
    session.handle(Inbound::RequestFitToWindow);
    session.set_custom_size("800,600");
    session.set_custom_size("800,x");

    let sizes: Vec<_> = log
        .borrow()
        .iter()
        .filter_map(|m| match m {
            Outbound::SetCustomSize(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(
        sizes,
        vec![
            Size::new(1280, 720),
            Size::new(1024, 768),
            Size::new(800, 600),
            Size::new(1024, 768),
        ]
    );
}

#[test]
fn save_png_lands_after_frame_boundary() {
    let (session, sink, log) = session();
    session.handle(Inbound::StartGui(wire()));
    session.handle(Inbound::TriggerSavePng(CaptureRequest {
        size: Size::new(32, 24),
        product: "clion".to_owned(),
        background: "#202020".to_owned(),
    }));
    assert!(sink.file_names().is_empty());
    session.tick(16);
    assert_eq!(sink.file_names(), vec!["32x24-clion.png"]);
    assert!(matches!(
        log.borrow().last(),
        Some(Outbound::ArtifactSaved(s)) if s.file_name == "32x24-clion.png"
    ));
}

#[test]
fn oversized_save_png_fails_without_scheduling() {
    let (session, sink, log) = session();
    session.handle(Inbound::StartGui(wire()));
    session.handle(Inbound::TriggerSavePng(CaptureRequest {
        size: Size::new(u32::MAX, u32::MAX),
        product: "clion".to_owned(),
        background: "#202020".to_owned(),
    }));

    let reasons = failures(&log);
    assert_eq!(reasons.len(), 1);
    assert!(reasons[0].starts_with("triggerSavePng: "));
    assert_eq!(session.scheduler().pending(), 0);

    session.handle(Inbound::TriggerSavePng(CaptureRequest {
        size: Size::new(8, 8),
        product: "clion".to_owned(),
        background: "#202020".to_owned(),
    }));
    session.tick(16);
    assert_eq!(sink.file_names(), vec!["8x8-clion.png"]);
    assert_eq!(failures(&log).len(), 1);
}

#[test]
fn batch_rejects_overlap_and_cancels() {
    let (session, _, log) = session();
    session.handle(Inbound::StartGui(wire()));
    session.handle(Inbound::SaveBatch(vec![Size::new(16, 12)]));
    session.handle(Inbound::SaveBatch(vec![Size::new(8, 6)]));
    let failures = failures(&log);
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("already"), "{failures:?}");

    session.handle(Inbound::CancelBatch);
    assert_eq!(session.batch_state(), BatchState::Idle);
    assert_eq!(session.run_until_idle(), 0);
}

#[test]
fn next_batch_step_without_batch_is_ignored() {
    let (session, sink, log) = session();
    session.handle(Inbound::StartGui(wire()));
    session.handle(Inbound::NextBatchStep);
    session.run_until_idle();
    assert!(sink.file_names().is_empty());
    assert!(failures(&log).is_empty());
}

#[test]
fn randomize_answers_in_wire_form_and_varies() {
    let (session, _, log) = session();
    session.handle(Inbound::RequestRandomize(wire()));
    session.handle(Inbound::RequestRandomize(wire()));
    let docs: Vec<SceneDocument> = log
        .borrow()
        .iter()
        .filter_map(|m| match m {
            Outbound::ApplyRandomizer(w) => Some(from_wire(w.clone()).unwrap()),
            _ => None,
        })
        .collect();
    assert_eq!(docs.len(), 2);
    assert_ne!(docs[0], docs[1]);
    assert_eq!(docs[0].layers[3], document().layers[3]);
}

#[test]
fn layer_removal_drops_handler_and_scene() {
    let (session, _, _) = session();
    session.handle(Inbound::StartGui(wire()));
    let generation = session.cache().generation(1);
    session.handle(Inbound::LayerRemoved(1));
    assert!(session.resize_bindings().is_empty());
    assert!(session.cache().get(1).is_none());
    assert!(session.cache().generation(1) > generation);
}

#[test]
fn attach_is_idempotent() {
    let session = Rc::new(session().0);
    let inbound = MessageBus::new();
    session.attach(&inbound);
    session.attach(&inbound);
    assert_eq!(inbound.subscriber_count("startGui"), 1);

    inbound.send(Inbound::StartGui(wire()));
    inbound.pump();
    assert_eq!(session.cache().len(), 3);
}

#[test]
fn shutdown_clears_state() {
    let (session, _, _) = session();
    session.handle(Inbound::StartGui(wire()));
    session.handle(Inbound::SaveBatch(vec![Size::new(16, 12)]));
    session.shutdown();
    assert!(session.cache().is_empty());
    assert!(session.document().is_none());
    assert!(session.resize_bindings().is_empty());
    assert_eq!(session.batch_state(), BatchState::Idle);
}
