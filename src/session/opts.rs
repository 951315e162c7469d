use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    export::{bundle::BundleLayout, snapshot::FuzzPolicy},
    foundation::{
        core::{Millis, Size},
        error::{GenSceneError, GenSceneResult},
    },
    timing::scheduler::DEFAULT_FRAME_INTERVAL_MS,
};

/// Options controlling a [`crate::session::sync_session::Session`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionOpts {
    /// Session seed every per-layer builder seed is derived from.
    pub seed: u64,
    /// Quiet period before a resize burst rebuilds metaball layers.
    pub debounce_ms: Millis,
    /// Pause between batch capture steps.
    pub batch_pause_ms: Millis,
    /// Frame interval of the scheduler's frame boundaries.
    pub frame_interval_ms: Millis,
    /// Source of exported mesh fuzz.
    pub fuzz_policy: FuzzPolicy,
    /// Bundle export layout.
    pub bundle: BundleLayout,
    /// Host window size until the first resize event.
    pub viewport: Size,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            seed: 0,
            debounce_ms: 300,
            batch_pause_ms: 1000,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            fuzz_policy: FuzzPolicy::default(),
            bundle: BundleLayout::default(),
            viewport: Size::new(1280, 720),
        }
    }
}

impl SessionOpts {
    /// Parse options from a JSON reader. Missing fields take their defaults.
    pub fn from_reader<R: std::io::Read>(r: R) -> GenSceneResult<Self> {
        let opts: Self = serde_json::from_reader(r)
            .map_err(|e| GenSceneError::validation(format!("parse session options JSON: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Parse options from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> GenSceneResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            GenSceneError::validation(format!("open session options '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Reject option combinations the session cannot run with.
    pub fn validate(&self) -> GenSceneResult<()> {
        if self.frame_interval_ms == 0 {
            return Err(GenSceneError::validation("frameIntervalMs must be > 0"));
        }
        if self.bundle.scene_global.is_empty() {
            return Err(GenSceneError::validation("bundle.sceneGlobal must be non-empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/opts.rs"]
mod tests;
