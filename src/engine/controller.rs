//! Control-side handle: the only ingress for note events and parameter
//! updates.
//!
//! Everything here is non-blocking from the caller's perspective. Note
//! events cross to the render thread through a bounded SPSC ring; when the
//! ring is full the event is dropped and counted, never waited on.
//! Parameter updates are clamped and published atomically, so they need no
//! queue at all.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use rtrb::Producer;

use crate::engine::snapshot::EngineStats;
use crate::params::{Module, ParamId, ParamUpdate, ParameterStore};
use crate::synth::message::SynthMessage;

pub struct SynthController {
    params: Arc<ParameterStore>,
    stats: Arc<EngineStats>,
    notes: Producer<SynthMessage>,
}

impl SynthController {
    pub(crate) fn new(
        params: Arc<ParameterStore>,
        stats: Arc<EngineStats>,
        notes: Producer<SynthMessage>,
    ) -> Self {
        Self {
            params,
            stats,
            notes,
        }
    }

    /// Queue a note event for the render thread.
    pub fn submit_note_event(&mut self, event: SynthMessage) {
        if self.notes.push(event).is_err() {
            self.stats.dropped_events.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Clamp and publish one parameter value. Out-of-range values are
    /// silently brought into range; this is never an error.
    pub fn submit_parameter_update(&self, update: ParamUpdate) {
        self.params.set(update.id, update.value);
    }

    /// Enable or disable a bypassable signal-chain module.
    pub fn set_module_enabled(&self, module: Module, enabled: bool) {
        self.params.set_module_enabled(module, enabled);
    }

    /// The most recently published value of a parameter.
    pub fn parameter(&self, id: ParamId) -> f32 {
        self.params.get(id)
    }

    /// Global engine counters.
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }
}
