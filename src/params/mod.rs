//! Process-wide synthesis parameters shared between the control thread and
//! the render thread.
//!
//! Each parameter lives in its own atomic slot: the writer clamps the value
//! to the parameter's declared range and publishes it with a single atomic
//! store; the render thread reads it with a single atomic load. A 32-bit
//! word cannot tear, so the reader never observes a half-written value, and
//! nothing on this path can block the audio thread. Staleness of up to one
//! control interval is acceptable; tearing is not.
//!
//! Ordering is `Relaxed` throughout: every parameter is an independent word
//! with last-write-wins semantics, and no cross-parameter ordering is
//! guaranteed or needed.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::filter::{max_cutoff, MIN_CUTOFF};

/// Number of oscillator slots per voice (sine, saw, triangle, pulse).
pub const OSC_SLOTS: usize = 4;

const SLOT_COUNT: usize = 2 * OSC_SLOTS + 11;

/// An `f32` published through an `AtomicU32` bit-cast.
#[derive(Debug)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// A synthesis parameter, addressed as (target, index) where the target
/// family needs one.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamId {
    /// Mix level of oscillator slot 0..=3.
    OscMix(u8),
    /// Detune of oscillator slot 0..=3, in semitones.
    OscDetune(u8),
    FilterCutoff,
    FilterResonance,
    EnvAttack,
    EnvDecay,
    EnvSustain,
    EnvRelease,
    LfoRate,
    LfoDepth,
    NoiseMix,
    SubMix,
    MasterGain,
}

const ALL_PARAMS: [ParamId; SLOT_COUNT] = [
    ParamId::OscMix(0),
    ParamId::OscMix(1),
    ParamId::OscMix(2),
    ParamId::OscMix(3),
    ParamId::OscDetune(0),
    ParamId::OscDetune(1),
    ParamId::OscDetune(2),
    ParamId::OscDetune(3),
    ParamId::FilterCutoff,
    ParamId::FilterResonance,
    ParamId::EnvAttack,
    ParamId::EnvDecay,
    ParamId::EnvSustain,
    ParamId::EnvRelease,
    ParamId::LfoRate,
    ParamId::LfoDepth,
    ParamId::NoiseMix,
    ParamId::SubMix,
    ParamId::MasterGain,
];

impl ParamId {
    /// Every addressable parameter, for enumeration in tests and UIs.
    pub fn all() -> impl Iterator<Item = ParamId> {
        ALL_PARAMS.into_iter()
    }

    /// Flat slot index, or None for an out-of-range oscillator index.
    fn slot(self) -> Option<usize> {
        let slot = match self {
            ParamId::OscMix(i) if (i as usize) < OSC_SLOTS => i as usize,
            ParamId::OscDetune(i) if (i as usize) < OSC_SLOTS => OSC_SLOTS + i as usize,
            ParamId::OscMix(_) | ParamId::OscDetune(_) => return None,
            ParamId::FilterCutoff => 8,
            ParamId::FilterResonance => 9,
            ParamId::EnvAttack => 10,
            ParamId::EnvDecay => 11,
            ParamId::EnvSustain => 12,
            ParamId::EnvRelease => 13,
            ParamId::LfoRate => 14,
            ParamId::LfoDepth => 15,
            ParamId::NoiseMix => 16,
            ParamId::SubMix => 17,
            ParamId::MasterGain => 18,
        };
        Some(slot)
    }

    /// Declared valid range, enforced at the write site. The cutoff ceiling
    /// depends on the engine sample rate.
    pub fn range(self, sample_rate: f32) -> (f32, f32) {
        match self {
            ParamId::OscMix(_) => (0.0, 1.0),
            ParamId::OscDetune(_) => (-12.0, 12.0),
            ParamId::FilterCutoff => (MIN_CUTOFF, max_cutoff(sample_rate)),
            ParamId::FilterResonance => (0.0, 1.0),
            ParamId::EnvAttack | ParamId::EnvDecay | ParamId::EnvRelease => (0.0, 10.0),
            ParamId::EnvSustain => (0.0, 1.0),
            ParamId::LfoRate => (0.01, 20.0),
            ParamId::LfoDepth => (0.0, 1.0),
            ParamId::NoiseMix | ParamId::SubMix => (0.0, 1.0),
            ParamId::MasterGain => (0.0, 2.0),
        }
    }

    /// Power-on default.
    pub fn default_value(self, sample_rate: f32) -> f32 {
        match self {
            ParamId::OscMix(_) => 0.25,
            ParamId::OscDetune(_) => 0.0,
            ParamId::FilterCutoff => max_cutoff(sample_rate), // fully open
            ParamId::FilterResonance => 0.0,
            ParamId::EnvAttack => 0.01,
            ParamId::EnvDecay => 0.1,
            ParamId::EnvSustain => 0.7,
            ParamId::EnvRelease => 0.3,
            ParamId::LfoRate => 1.0,
            ParamId::LfoDepth => 0.0,
            ParamId::NoiseMix | ParamId::SubMix => 0.0,
            ParamId::MasterGain => 1.0,
        }
    }
}

/// One parameter write from the event source: (target, index) plus the raw
/// value, clamped at the store.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamUpdate {
    pub id: ParamId,
    pub value: f32,
}

/// Bypassable signal-chain modules. The renderer queries these flags each
/// tick; a disabled module passes its input through (filter), holds its
/// base value (LFO), or contributes nothing (noise/sub).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    Filter,
    Lfo,
    NoiseSub,
}

/// The process-wide parameter table.
pub struct ParameterStore {
    slots: [AtomicF32; SLOT_COUNT],
    sample_rate: f32,

    filter_enabled: AtomicBool,
    lfo_enabled: AtomicBool,
    noise_enabled: AtomicBool,
}

impl ParameterStore {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            slots: std::array::from_fn(|i| {
                AtomicF32::new(ALL_PARAMS[i].default_value(sample_rate))
            }),
            sample_rate,
            filter_enabled: AtomicBool::new(true),
            lfo_enabled: AtomicBool::new(true),
            noise_enabled: AtomicBool::new(true),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Clamp `value` to the parameter's declared range and publish it.
    ///
    /// Validation is entirely a writer-side concern; the render thread
    /// never re-checks what it loads. An oscillator index outside the slot
    /// count is absorbed silently, like every other steady-state anomaly.
    pub fn set(&self, id: ParamId, value: f32) {
        let Some(slot) = id.slot() else { return };
        let (lo, hi) = id.range(self.sample_rate);
        self.slots[slot].store(value.clamp(lo, hi));
    }

    /// Most recently published value; the default for an out-of-range
    /// oscillator index.
    pub fn get(&self, id: ParamId) -> f32 {
        match id.slot() {
            Some(slot) => self.slots[slot].load(),
            None => id.default_value(self.sample_rate),
        }
    }

    pub fn set_module_enabled(&self, module: Module, enabled: bool) {
        self.flag(module).store(enabled, Ordering::Relaxed);
    }

    pub fn module_enabled(&self, module: Module) -> bool {
        self.flag(module).load(Ordering::Relaxed)
    }

    fn flag(&self, module: Module) -> &AtomicBool {
        match module {
            Module::Filter => &self.filter_enabled,
            Module::Lfo => &self.lfo_enabled,
            Module::NoiseSub => &self.noise_enabled,
        }
    }

    /// One pass over the table for the render tick: plain values, loaded
    /// once per buffer so the per-sample loop touches no atomics.
    pub fn render_view(&self) -> RenderParams {
        RenderParams {
            osc_mix: std::array::from_fn(|i| self.slots[i].load()),
            osc_detune: std::array::from_fn(|i| self.slots[OSC_SLOTS + i].load()),
            cutoff_hz: self.get(ParamId::FilterCutoff),
            resonance: self.get(ParamId::FilterResonance),
            attack: self.get(ParamId::EnvAttack),
            decay: self.get(ParamId::EnvDecay),
            sustain: self.get(ParamId::EnvSustain),
            release: self.get(ParamId::EnvRelease),
            lfo_rate: self.get(ParamId::LfoRate),
            lfo_depth: self.get(ParamId::LfoDepth),
            noise_mix: self.get(ParamId::NoiseMix),
            sub_mix: self.get(ParamId::SubMix),
            master_gain: self.get(ParamId::MasterGain),
            filter_enabled: self.module_enabled(Module::Filter),
            lfo_enabled: self.module_enabled(Module::Lfo),
            noise_enabled: self.module_enabled(Module::NoiseSub),
        }
    }
}

/// Per-tick parameter snapshot handed to the voices. Plain `Copy` data:
/// the per-sample render loop reads this, not the atomic table.
#[derive(Debug, Clone, Copy)]
pub struct RenderParams {
    pub osc_mix: [f32; OSC_SLOTS],
    pub osc_detune: [f32; OSC_SLOTS],
    pub cutoff_hz: f32,
    pub resonance: f32,
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub lfo_rate: f32,
    pub lfo_depth: f32,
    pub noise_mix: f32,
    pub sub_mix: f32,
    pub master_gain: f32,
    pub filter_enabled: bool,
    pub lfo_enabled: bool,
    pub noise_enabled: bool,
}
