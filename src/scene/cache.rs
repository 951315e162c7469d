use std::collections::BTreeMap;

use crate::{foundation::core::LayerIndex, scene::state::SceneState};

/// Claim on the next build result for one layer index.
///
/// Obtained from [`SceneCache::begin`]; only the most recent ticket of an index may commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildTicket {
    /// Layer the build is for.
    pub layer: LayerIndex,
    /// Generation the build was started at.
    pub generation: u64,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    state: Option<SceneState>,
}

/// Last-built scene per layer index, guarded by a per-index generation counter.
///
/// Slots are never dropped once created, so a generation never goes backwards and a stale ticket
/// can never match a later one.
#[derive(Debug, Default)]
pub struct SceneCache {
    slots: BTreeMap<LayerIndex, Slot>,
}

impl SceneCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene currently cached for `layer`.
    pub fn get(&self, layer: LayerIndex) -> Option<&SceneState> {
        self.slots.get(&layer).and_then(|s| s.state.as_ref())
    }

    /// Start a build for `layer`, superseding any build already in flight.
    pub fn begin(&mut self, layer: LayerIndex) -> BuildTicket {
        let slot = self.slots.entry(layer).or_default();
        slot.generation += 1;
        BuildTicket {
            layer,
            generation: slot.generation,
        }
    }

    /// Whether `ticket` is still the latest build of its layer.
    pub fn is_current(&self, ticket: BuildTicket) -> bool {
        self.slots
            .get(&ticket.layer)
            .is_some_and(|s| s.generation == ticket.generation)
    }

    /// Store a build result. Returns `false` and drops `state` when the ticket was superseded.
    pub fn commit(&mut self, ticket: BuildTicket, state: SceneState) -> bool {
        match self.slots.get_mut(&ticket.layer) {
            Some(slot) if slot.generation == ticket.generation => {
                slot.state = Some(state);
                true
            }
            current => {
                tracing::debug!(
                    layer = ticket.layer,
                    generation = ticket.generation,
                    current = current.map(|s| s.generation),
                    "discarding stale scene build"
                );
                false
            }
        }
    }

    /// Replace the scene of `layer` immediately.
    pub fn set(&mut self, layer: LayerIndex, state: SceneState) {
        let ticket = self.begin(layer);
        self.commit(ticket, state);
    }

    /// Drop the scene of `layer` and supersede in-flight builds. Returns whether a scene was held.
    pub fn invalidate(&mut self, layer: LayerIndex) -> bool {
        self.remove(layer).is_some()
    }

    /// Take the scene of `layer` out of the cache and supersede in-flight builds.
    pub fn remove(&mut self, layer: LayerIndex) -> Option<SceneState> {
        let slot = self.slots.get_mut(&layer)?;
        slot.generation += 1;
        slot.state.take()
    }

    /// Drop every scene, superseding all in-flight builds.
    pub fn clear(&mut self) {
        for slot in self.slots.values_mut() {
            slot.generation += 1;
            slot.state = None;
        }
    }

    /// Number of cached scenes.
    pub fn len(&self) -> usize {
        self.slots.values().filter(|s| s.state.is_some()).count()
    }

    /// `true` when no scene is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indices holding a scene, ascending.
    pub fn indices(&self) -> Vec<LayerIndex> {
        self.slots
            .iter()
            .filter(|(_, s)| s.state.is_some())
            .map(|(i, _)| *i)
            .collect()
    }

    /// Current generation of `layer` (`0` if never built).
    pub fn generation(&self, layer: LayerIndex) -> u64 {
        self.slots.get(&layer).map_or(0, |s| s.generation)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/cache.rs"]
mod tests;
