use serde_json::{Value, json};

use crate::{
    foundation::math::Rng64,
    model::{document::SceneDocument, layer::LayerModel},
    scene::classify::LayerKind,
};

/// Randomized variant of `doc`.
///
/// Only the procedural parameters of buildable layers change; `Other` layers keep their models
/// untouched, and mesh layers drop their `sceneFuzz` since the grid may change.
pub fn randomize(doc: &SceneDocument, seed: u64) -> SceneDocument {
    let mut rng = Rng64::new(seed);
    let mut out = doc.clone();
    for layer in &mut out.layers {
        match layer.kind() {
            LayerKind::MeshField => {
                randomize_mesh(&mut layer.model, &mut rng);
                layer.scene_fuzz = None;
            }
            LayerKind::MetaballField => randomize_metaballs(&mut layer.model, &mut rng),
            LayerKind::FluidGradient => randomize_fluid(&mut layer.model, &mut rng),
            LayerKind::Other => {}
        }
    }
    out
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn randomize_mesh(model: &mut LayerModel, rng: &mut Rng64) {
    let Some(obj) = model.value_mut().as_object_mut() else {
        return;
    };
    obj.insert(
        "faces".to_owned(),
        json!({"x": rng.range_u32(4, 40), "y": rng.range_u32(4, 40)}),
    );
    obj.insert(
        "amplitude".to_owned(),
        json!({
            "x": round2(rng.next_f64_01()),
            "y": round2(rng.next_f64_01()),
            "z": round2(rng.next_f64_01()),
        }),
    );
    obj.insert(
        "colorShift".to_owned(),
        json!({"hue": rng.range_f64(-180.0, 180.0).round(), "saturation": 0.0, "brightness": 0.0}),
    );
}

fn randomize_metaballs(model: &mut LayerModel, rng: &mut Rng64) {
    let Some(colors) = model
        .value_mut()
        .get_mut("colors")
        .and_then(Value::as_array_mut)
    else {
        return;
    };
    // Fisher-Yates.
    for i in (1..colors.len()).rev() {
        let j = rng.range_u32(0, i as u32) as usize;
        colors.swap(i, j);
    }
}

fn randomize_fluid(model: &mut LayerModel, rng: &mut Rng64) {
    let Some(obj) = model.value_mut().as_object_mut() else {
        return;
    };
    obj.insert("variety".to_owned(), json!(round2(rng.next_f64_01())));
    obj.insert("orbit".to_owned(), json!(round2(rng.next_f64_01())));
}

#[cfg(test)]
#[path = "../../tests/unit/model/randomize.rs"]
mod tests;
