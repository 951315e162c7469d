use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::scene::{
    classify::{LayerKind, classify},
    state::SceneFuzz,
};

/// Structured model of one layer.
///
/// Remembers the exact wire string it was decoded from until it is mutated, so untouched models
/// are re-encoded byte-for-byte.
#[derive(Clone, Debug)]
pub struct LayerModel {
    value: Value,
    wire: Option<String>,
}

impl LayerModel {
    /// Wrap a structured value.
    pub fn new(value: Value) -> Self {
        Self { value, wire: None }
    }

    /// Decode a wire string, keeping it for re-encoding.
    pub fn from_wire_str(s: &str) -> Result<Self, serde_json::Error> {
        let value = serde_json::from_str(s)?;
        Ok(Self {
            value,
            wire: Some(s.to_owned()),
        })
    }

    /// Structured value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Mutable access. Forgets the original wire string.
    pub fn value_mut(&mut self) -> &mut Value {
        self.wire = None;
        &mut self.value
    }

    /// Replace the whole value.
    pub fn set(&mut self, value: Value) {
        self.wire = None;
        self.value = value;
    }

    /// `true` while the model still matches the wire string it was decoded from.
    pub fn is_untouched(&self) -> bool {
        self.wire.is_some()
    }

    /// Wire string: the original when untouched, a fresh compact encoding otherwise.
    pub fn to_wire_string(&self) -> Result<String, serde_json::Error> {
        match &self.wire {
            Some(s) => Ok(s.clone()),
            None => serde_json::to_string(&self.value),
        }
    }

    /// Kind derived from the current shape.
    pub fn kind(&self) -> LayerKind {
        classify(&self.value)
    }
}

impl PartialEq for LayerModel {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl From<Value> for LayerModel {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

impl Serialize for LayerModel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LayerModel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::new)
    }
}

/// One rendering layer of a [`SceneDocument`](crate::model::document::SceneDocument).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDescriptor {
    /// Layer model.
    pub model: LayerModel,
    /// Whether the layer is drawn.
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Per-vertex fuzz for mesh layers, `null` otherwise.
    #[serde(default)]
    pub scene_fuzz: Option<SceneFuzz>,
    /// Core-owned fields preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_visible() -> bool {
    true
}

impl LayerDescriptor {
    /// Visible layer with no fuzz.
    pub fn new(model: impl Into<LayerModel>) -> Self {
        Self {
            model: model.into(),
            visible: true,
            scene_fuzz: None,
            extra: Map::new(),
        }
    }

    /// Kind of the current model.
    pub fn kind(&self) -> LayerKind {
        self.model.kind()
    }
}
