use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{GenSceneError, GenSceneResult};

pub use kurbo::{Affine, BezPath, Point, Vec2};

/// Virtual-clock timestamp or duration in milliseconds.
pub type Millis = u64;

/// Index of a layer in z-order within the current document.
pub type LayerIndex = usize;

/// Pixel dimensions, serialized as a `[width, height]` pair.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// The `[0, 0]` sentinel that ends a batch run.
    pub const ZERO: Size = Size {
        width: 0,
        height: 0,
    };

    /// Construct a size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Return `true` when either dimension is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Validate that both dimensions are positive.
    pub fn validate(self, what: &str) -> GenSceneResult<Self> {
        if self.is_empty() {
            return Err(GenSceneError::validation(format!(
                "{what} must have width and height > 0 (got {self})"
            )));
        }
        Ok(self)
    }

    /// Validate that both dimensions are positive and at most `max`.
    pub fn validate_within(self, what: &str, max: u32) -> GenSceneResult<Self> {
        let size = self.validate(what)?;
        if size.width > max || size.height > max {
            return Err(GenSceneError::validation(format!(
                "{what} must be at most {max}x{max} (got {size})"
            )));
        }
        Ok(size)
    }

    /// Number of RGBA8 bytes needed for a buffer of this size.
    pub fn rgba8_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }

    /// Per-axis scale factors mapping `self` onto `to`.
    ///
    /// Returns `None` when `self` is empty.
    pub fn ratio_to(self, to: Size) -> Option<(f64, f64)> {
        if self.is_empty() {
            return None;
        }
        Some((
            f64::from(to.width) / f64::from(self.width),
            f64::from(to.height) / f64::from(self.height),
        ))
    }

    /// Parse a `"W,H"` custom-size string as typed into the size panel.
    ///
    /// Falls back to `viewport` when either dimension is missing, unparsable, or not positive.
    pub fn parse_custom_or(input: &str, viewport: Size) -> Size {
        let mut parts = input.split(',').map(|p| p.trim().parse::<i64>());
        match (parts.next(), parts.next()) {
            (Some(Ok(w)), Some(Ok(h))) if w > 0 && h > 0 => {
                Size::new(w.min(i64::from(u32::MAX)) as u32, h.min(i64::from(u32::MAX)) as u32)
            }
            _ => viewport,
        }
    }
}

impl From<[u32; 2]> for Size {
    fn from([width, height]: [u32; 2]) -> Self {
        Self { width, height }
    }
}

impl From<Size> for [u32; 2] {
    fn from(s: Size) -> Self {
        [s.width, s.height]
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Size {
    type Err = GenSceneError;

    /// Parse `"WIDTHxHEIGHT"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| GenSceneError::validation(format!("size '{s}' must look like 800x600")))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| GenSceneError::validation(format!("size '{s}': {e}")))
        };
        Ok(Size::new(parse(w)?, parse(h)?))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
