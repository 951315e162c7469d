use serde_json::Value;

/// Which procedural builder a layer model belongs to.
///
/// Always computed from the model's shape via [`classify`]; never stored next to the model, so
/// the two cannot drift apart.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum LayerKind {
    /// Triangulated flat-surface mesh with per-vertex fuzz.
    MeshField,
    /// Groups of animated metaballs.
    MetaballField,
    /// Fluid layer backed by per-group gradient ramp textures.
    FluidGradient,
    /// Anything the pipeline does not build scenes for (text, logo, background...).
    Other,
}

impl LayerKind {
    /// Whether a cheap `resize` of an existing scene is supported.
    pub fn is_resizable(self) -> bool {
        matches!(self, Self::MetaballField)
    }

    /// Whether scenes of this kind carry exportable scene fuzz.
    pub fn has_fuzz(self) -> bool {
        matches!(self, Self::MeshField)
    }

    /// Stable tag mixed into per-layer seeds.
    pub(crate) fn seed_tag(self) -> u8 {
        match self {
            Self::MeshField => b'M',
            Self::MetaballField => b'B',
            Self::FluidGradient => b'G',
            Self::Other => b'O',
        }
    }
}

/// Classify a layer model by shape. Total and side-effect free.
pub fn classify(model: &Value) -> LayerKind {
    if is_mesh_field(model) {
        LayerKind::MeshField
    } else if is_fluid_gradient(model) {
        LayerKind::FluidGradient
    } else if is_metaball_field(model) {
        LayerKind::MetaballField
    } else {
        LayerKind::Other
    }
}

/// `faces: {x: number, y: number}` plus an `amplitude` entry.
pub fn is_mesh_field(model: &Value) -> bool {
    let Some(obj) = model.as_object() else {
        return false;
    };
    let faces_ok = obj
        .get("faces")
        .and_then(Value::as_object)
        .is_some_and(|f| {
            f.get("x").is_some_and(Value::is_number) && f.get("y").is_some_and(Value::is_number)
        });
    faces_ok && obj.contains_key("amplitude")
}

/// `groups` is an array of objects.
pub fn is_fluid_gradient(model: &Value) -> bool {
    model
        .get("groups")
        .and_then(Value::as_array)
        .is_some_and(|groups| groups.iter().all(Value::is_object))
}

/// `colors` is a non-empty array of strings.
pub fn is_metaball_field(model: &Value) -> bool {
    model
        .get("colors")
        .and_then(Value::as_array)
        .is_some_and(|colors| !colors.is_empty() && colors.iter().all(Value::is_string))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/classify.rs"]
mod tests;
