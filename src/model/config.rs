use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::foundation::{
    color::Color,
    core::Size,
    error::{GenSceneError, GenSceneResult},
};

/// Document-wide settings owned by the application core.
///
/// Read-only to the pipeline. Fields this crate does not interpret are kept in `extra` and
/// written back unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    /// Product identity, used in file names and asset lookups.
    pub product: String,
    /// Canvas size.
    pub size: Size,
    /// Background color as a CSS hex string.
    #[serde(default = "default_background")]
    pub background: String,
    /// Sizes offered for batch export.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub export_sizes: Vec<Size>,
    /// Optional UI mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Core-owned fields preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_background() -> String {
    "#000000".to_owned()
}

impl GlobalConfig {
    /// Minimal config for `product` on a `size` canvas.
    pub fn new(product: impl Into<String>, size: Size) -> Self {
        Self {
            product: product.into(),
            size,
            background: default_background(),
            export_sizes: Vec::new(),
            mode: None,
            extra: Map::new(),
        }
    }

    /// Parsed background color.
    pub fn background_color(&self) -> GenSceneResult<Color> {
        Color::from_hex(&self.background).map_err(|e| {
            GenSceneError::validation(format!("background '{}': {e}", self.background))
        })
    }

    /// Check the fields the pipeline depends on.
    pub fn validate(&self) -> GenSceneResult<()> {
        if self.product.trim().is_empty() {
            return Err(GenSceneError::validation("product must be non-empty"));
        }
        if self
            .product
            .chars()
            .any(|c| matches!(c, '/' | '\\') || c.is_control())
        {
            return Err(GenSceneError::validation(format!(
                "product '{}' must not contain path separators",
                self.product
            )));
        }
        self.size.validate("canvas size")?;
        self.background_color()?;
        Ok(())
    }
}
