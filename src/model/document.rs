use serde::{Deserialize, Serialize};

use crate::{
    foundation::core::LayerIndex,
    foundation::error::{GenSceneError, GenSceneResult},
    model::{config::GlobalConfig, layer::LayerDescriptor},
};

/// In-memory document: global config plus layers in z-order, with structured models.
///
/// This is also the JSON snapshot schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Global configuration, flattened into the top-level object.
    #[serde(flatten)]
    pub config: GlobalConfig,
    /// Layers, bottom first.
    pub layers: Vec<LayerDescriptor>,
}

impl SceneDocument {
    /// Document with `config` and `layers`.
    pub fn new(config: GlobalConfig, layers: Vec<LayerDescriptor>) -> Self {
        Self { config, layers }
    }

    /// Parse the snapshot form.
    pub fn from_json(s: &str) -> GenSceneResult<Self> {
        serde_json::from_str(s).map_err(|e| GenSceneError::serde(format!("scene document: {e}")))
    }

    /// Pretty JSON with two-space indent.
    pub fn to_json_pretty(&self) -> GenSceneResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| GenSceneError::serde(e.to_string()))
    }

    /// Layer at `index`, or a validation error naming it.
    pub fn layer(&self, index: LayerIndex) -> GenSceneResult<&LayerDescriptor> {
        self.layers.get(index).ok_or_else(|| {
            GenSceneError::validation(format!(
                "layer {index} out of range (document has {} layers)",
                self.layers.len()
            ))
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/document.rs"]
mod tests;
