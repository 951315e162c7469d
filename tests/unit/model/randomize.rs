use super::*;
use crate::{
    foundation::core::Size,
    model::{config::GlobalConfig, layer::LayerDescriptor},
};

fn doc() -> SceneDocument {
    let mut mesh = LayerDescriptor::new(json!({"faces": {"x": 2, "y": 2}, "amplitude": {}}));
    mesh.scene_fuzz = Some(vec![]);
    SceneDocument::new(
        GlobalConfig::new("datagrip", Size::new(100, 100)),
        vec![
            mesh,
            LayerDescriptor::new(json!({"colors": ["#111111", "#222222", "#333333", "#444444"]})),
            LayerDescriptor::new(json!({"groups": [], "variety": 0.1})),
            LayerDescriptor::new(json!({"text": "DataGrip"})),
        ],
    )
}

#[test]
fn deterministic_per_seed() {
    assert_eq!(randomize(&doc(), 4), randomize(&doc(), 4));
    assert_ne!(randomize(&doc(), 4), randomize(&doc(), 5));
}

#[test]
fn keeps_layer_kinds_and_other_layers() {
    let src = doc();
    let out = randomize(&src, 99);
    assert_eq!(out.layers.len(), src.layers.len());
    for (a, b) in src.layers.iter().zip(&out.layers) {
        assert_eq!(a.kind(), b.kind());
    }
    assert_eq!(out.layers[3], src.layers[3]);
    assert!(out.layers[0].scene_fuzz.is_none());
}

#[test]
fn metaball_colors_are_permuted_not_replaced() {
    let out = randomize(&doc(), 7);
    let mut colors: Vec<String> = out.layers[1].model.value()["colors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap().to_owned())
        .collect();
    colors.sort();
    assert_eq!(colors, ["#111111", "#222222", "#333333", "#444444"]);
}
