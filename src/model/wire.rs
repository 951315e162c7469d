use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    foundation::error::{GenSceneError, GenSceneResult},
    model::{
        config::GlobalConfig,
        document::SceneDocument,
        layer::{LayerDescriptor, LayerModel},
    },
    scene::state::SceneFuzz,
};

/// A layer as exchanged with the application core: the model travels as a JSON string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLayer {
    /// JSON-encoded layer model.
    pub model: String,
    /// Whether the layer is drawn.
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Per-vertex fuzz for mesh layers.
    #[serde(default)]
    pub scene_fuzz: Option<SceneFuzz>,
    /// Core-owned fields preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_visible() -> bool {
    true
}

/// Wire form of a [`SceneDocument`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireDocument {
    /// Global configuration, flattened into the top-level object.
    #[serde(flatten)]
    pub config: GlobalConfig,
    /// Layers, bottom first.
    pub layers: Vec<WireLayer>,
}

impl WireDocument {
    /// Parse the wire JSON.
    pub fn from_json(s: &str) -> GenSceneResult<Self> {
        serde_json::from_str(s).map_err(|e| GenSceneError::serde(format!("wire document: {e}")))
    }

    /// Compact wire JSON.
    pub fn to_json(&self) -> GenSceneResult<String> {
        serde_json::to_string(self).map_err(|e| GenSceneError::serde(e.to_string()))
    }
}

/// Encode every layer model as a string.
pub fn to_wire(doc: &SceneDocument) -> GenSceneResult<WireDocument> {
    let layers = doc
        .layers
        .iter()
        .enumerate()
        .map(|(index, layer)| {
            let model = layer.model.to_wire_string().map_err(|e| {
                GenSceneError::serde(format!("layer {index}: cannot encode model: {e}"))
            })?;
            Ok(WireLayer {
                model,
                visible: layer.visible,
                scene_fuzz: layer.scene_fuzz.clone(),
                extra: layer.extra.clone(),
            })
        })
        .collect::<GenSceneResult<Vec<_>>>()?;
    Ok(WireDocument {
        config: doc.config.clone(),
        layers,
    })
}

/// Decode every layer model string. The string `null` yields a null model.
pub fn from_wire(wire: WireDocument) -> GenSceneResult<SceneDocument> {
    let layers = wire
        .layers
        .into_iter()
        .enumerate()
        .map(|(index, layer)| {
            let model = LayerModel::from_wire_str(&layer.model).map_err(|e| {
                GenSceneError::serde(format!("layer {index}: model is not valid JSON: {e}"))
            })?;
            Ok(LayerDescriptor {
                model,
                visible: layer.visible,
                scene_fuzz: layer.scene_fuzz,
                extra: layer.extra,
            })
        })
        .collect::<GenSceneResult<Vec<_>>>()?;
    Ok(SceneDocument {
        config: wire.config,
        layers,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/model/wire.rs"]
mod tests;
