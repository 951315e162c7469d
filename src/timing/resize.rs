use std::collections::BTreeMap;

use crate::{
    foundation::core::{LayerIndex, Size},
    timing::debounce::Debouncer,
};

/// One debounced resize handler per resizable layer.
///
/// Binding an index that is already bound cancels the old debouncer first, so repeated start
/// events never stack handlers.
#[derive(Debug, Default)]
pub struct ResizeController {
    bound: BTreeMap<LayerIndex, Debouncer<Size>>,
}

impl ResizeController {
    /// Controller with no bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `debouncer` to `layer`. Returns `true` when it replaced an existing binding.
    pub fn bind(&mut self, layer: LayerIndex, debouncer: Debouncer<Size>) -> bool {
        match self.bound.insert(layer, debouncer) {
            Some(old) => {
                old.cancel();
                tracing::debug!(layer, "replaced resize handler");
                true
            }
            None => false,
        }
    }

    /// Cancel and remove the binding of `layer`.
    pub fn unbind(&mut self, layer: LayerIndex) -> bool {
        match self.bound.remove(&layer) {
            Some(old) => {
                old.cancel();
                true
            }
            None => false,
        }
    }

    /// Forward a window size to every bound debouncer.
    pub fn notify(&self, size: Size) {
        for debouncer in self.bound.values() {
            debouncer.call(size);
        }
    }

    /// Cancel and remove every binding.
    pub fn clear(&mut self) {
        for (_, old) in std::mem::take(&mut self.bound) {
            old.cancel();
        }
    }

    /// Layers with a handler, ascending.
    pub fn bound_layers(&self) -> Vec<LayerIndex> {
        self.bound.keys().copied().collect()
    }

    /// Whether `layer` has a handler.
    pub fn is_bound(&self, layer: LayerIndex) -> bool {
        self.bound.contains_key(&layer)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timing/resize.rs"]
mod tests;
