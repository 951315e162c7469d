use serde_json::Value;

use crate::{
    channel::bus::Message,
    export::{artifact::SavedArtifact, image::CaptureRequest},
    foundation::{
        color::Color,
        core::{LayerIndex, Size},
    },
    model::wire::WireDocument,
    scene::state::{GradientScene, MeshScene},
};

/// Messages from the application core.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    /// The core started (or restarted) with this document.
    StartGui(WireDocument),
    /// Apply a snapshot JSON, typically loaded from a file.
    Import(String),
    /// Produce a JSON snapshot of the core's exported state.
    Export(String),
    /// Produce a bundle archive of the core's exported state.
    ExportZip(String),
    /// Rebuild the mesh layer `layer` of `document`.
    RequestMeshRebuild {
        /// Layer to rebuild.
        layer: LayerIndex,
        /// Current document in wire form.
        document: WireDocument,
    },
    /// Build gradient textures for a fluid layer.
    BuildGradientTextures {
        /// Target layer.
        layer: LayerIndex,
        /// Fluid layer model.
        model: Value,
    },
    /// Replace the palette of a cached metaball layer.
    UpdateMetaballColors {
        /// Target layer.
        layer: LayerIndex,
        /// New palette.
        colors: Vec<Color>,
    },
    /// The host window changed size.
    RequestWindowResize(Size),
    /// Size the canvas to the current window.
    RequestFitToWindow,
    /// Capture the current frame as a PNG.
    TriggerSavePng(CaptureRequest),
    /// Capture one PNG per size, in order.
    SaveBatch(Vec<Size>),
    /// Abort a running batch.
    CancelBatch,
    /// The canvas settled after a batch resize; capture it.
    NextBatchStep,
    /// Randomize the document's procedural parameters.
    RequestRandomize(WireDocument),
    /// The core removed the layer at this index.
    LayerRemoved(LayerIndex),
}

impl Message for Inbound {
    fn channel(&self) -> &'static str {
        match self {
            Self::StartGui(_) => "startGui",
            Self::Import(_) => "import_",
            Self::Export(_) => "export_",
            Self::ExportZip(_) => "exportZip_",
            Self::RequestMeshRebuild { .. } => "requestFssRebuild",
            Self::BuildGradientTextures { .. } => "buildFluidGradientTextures",
            Self::UpdateMetaballColors { .. } => "updateNativeMetaballs",
            Self::RequestWindowResize(_) => "requestWindowResize",
            Self::RequestFitToWindow => "requestFitToWindow",
            Self::TriggerSavePng(_) => "triggerSavePng",
            Self::SaveBatch(_) => "saveBatch",
            Self::CancelBatch => "cancelBatch",
            Self::NextBatchStep => "nextBatchStep",
            Self::RequestRandomize(_) => "requestRandomize",
            Self::LayerRemoved(_) => "layerRemoved",
        }
    }
}

/// Every inbound channel name.
pub const INBOUND_CHANNELS: [&str; 15] = [
    "startGui",
    "import_",
    "export_",
    "exportZip_",
    "requestFssRebuild",
    "buildFluidGradientTextures",
    "updateNativeMetaballs",
    "requestWindowResize",
    "requestFitToWindow",
    "triggerSavePng",
    "saveBatch",
    "cancelBatch",
    "nextBatchStep",
    "requestRandomize",
    "layerRemoved",
];

/// A scene update addressed to one layer.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerUpdate<T> {
    /// Target layer.
    pub layer: LayerIndex,
    /// Payload.
    pub value: T,
}

/// A per-layer parameter the control surface can change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerParam {
    /// `changeLightSpeed`, rounded.
    LightSpeed,
    /// `changeVignette`.
    Vignette,
    /// `changeIris`.
    Iris,
    /// `changeFacesX`, rounded.
    FacesX,
    /// `changeFacesY`, rounded.
    FacesY,
    /// `changeFssRenderMode`, a string.
    RenderMode,
    /// `changeAmplitude`.
    Amplitude,
    /// `shiftColor`.
    ShiftColor,
    /// `changeOpacity`.
    Opacity,
    /// `changeVariety`.
    Variety,
    /// `changeOrbit`.
    Orbit,
    /// `turnOn`, no value.
    TurnOn,
    /// `turnOff`, no value.
    TurnOff,
    /// `mirrorOn`, no value.
    MirrorOn,
    /// `mirrorOff`, no value.
    MirrorOff,
}

impl LayerParam {
    /// Outbound channel name.
    pub fn channel(self) -> &'static str {
        match self {
            Self::LightSpeed => "changeLightSpeed",
            Self::Vignette => "changeVignette",
            Self::Iris => "changeIris",
            Self::FacesX => "changeFacesX",
            Self::FacesY => "changeFacesY",
            Self::RenderMode => "changeFssRenderMode",
            Self::Amplitude => "changeAmplitude",
            Self::ShiftColor => "shiftColor",
            Self::Opacity => "changeOpacity",
            Self::Variety => "changeVariety",
            Self::Orbit => "changeOrbit",
            Self::TurnOn => "turnOn",
            Self::TurnOff => "turnOff",
            Self::MirrorOn => "mirrorOn",
            Self::MirrorOff => "mirrorOff",
        }
    }

    /// Whether values of this parameter are sent as integers.
    pub fn is_integral(self) -> bool {
        matches!(self, Self::LightSpeed | Self::FacesX | Self::FacesY)
    }

    /// Whether this parameter carries no value.
    pub fn is_toggle(self) -> bool {
        matches!(
            self,
            Self::TurnOn | Self::TurnOff | Self::MirrorOn | Self::MirrorOff
        )
    }
}

/// `{ layer, value }` notification for one parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamChange {
    /// Target layer.
    pub layer: LayerIndex,
    /// Parameter.
    pub param: LayerParam,
    /// New value, `null` for toggles.
    pub value: Value,
}

impl ParamChange {
    /// Numeric change, rounded for integral parameters.
    pub fn number(layer: LayerIndex, param: LayerParam, value: f64) -> Self {
        let value = if param.is_toggle() {
            Value::Null
        } else if param.is_integral() {
            Value::from(value.round() as i64)
        } else {
            serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
        };
        Self {
            layer,
            param,
            value,
        }
    }

    /// String-valued change such as the render mode.
    pub fn text(layer: LayerIndex, param: LayerParam, value: impl Into<String>) -> Self {
        Self {
            layer,
            param,
            value: Value::String(value.into()),
        }
    }

    /// Value-less toggle.
    pub fn toggle(layer: LayerIndex, param: LayerParam) -> Self {
        Self {
            layer,
            param,
            value: Value::Null,
        }
    }
}

/// Messages to the application core.
#[derive(Clone, Debug, PartialEq)]
pub enum Outbound {
    /// Imported document, in wire JSON.
    Import(String),
    /// A mesh layer was rebuilt.
    RebuildMesh(LayerUpdate<MeshScene>),
    /// Gradient textures for a fluid layer are ready.
    LoadGradientTextures(LayerUpdate<GradientScene>),
    /// Set the canvas size.
    SetCustomSize(Size),
    /// Stop live animation.
    Pause,
    /// Randomized document, in wire form.
    ApplyRandomizer(WireDocument),
    /// Snapshot JSON is ready.
    ExportReady(String),
    /// A file artifact was handed to the sink.
    ArtifactSaved(SavedArtifact),
    /// Something failed; human-readable reason.
    Failure(String),
    /// A per-layer parameter changed.
    Param(ParamChange),
}

impl Message for Outbound {
    fn channel(&self) -> &'static str {
        match self {
            Self::Import(_) => "import_",
            Self::RebuildMesh(_) => "rebuildFss",
            Self::LoadGradientTextures(_) => "loadFluidGradientTextures",
            Self::SetCustomSize(_) => "setCustomSize",
            Self::Pause => "pause",
            Self::ApplyRandomizer(_) => "applyRandomizer",
            Self::ExportReady(_) => "exportReady",
            Self::ArtifactSaved(_) => "artifactSaved",
            Self::Failure(_) => "failure",
            Self::Param(change) => change.param.channel(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/channel/message.rs"]
mod tests;
