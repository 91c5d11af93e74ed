//! Read-only observability for visualization and metrics collaborators.
//!
//! Designed for real-time safety the same way the rest of the engine is:
//! snapshots are `Copy`, fixed-size, and built without allocation on the
//! render thread, then pushed through a bounded SPSC ring. A full ring
//! drops the push; observers only ever want the freshest observation, and
//! the render thread never waits for one to be consumed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rtrb::Consumer;

use crate::dsp::envelope::EnvelopeStage;
use crate::MAX_VOICES;

/// Per-voice observability state (Copy, no allocations).
#[derive(Debug, Clone, Copy)]
pub struct VoiceSnapshot {
    /// Whether the voice is contributing to the mix.
    pub active: bool,
    /// MIDI note the voice is bound to (0 when idle).
    pub note: u8,
    /// Current envelope stage.
    pub stage: EnvelopeStage,
    /// Current envelope level (0.0-1.0).
    pub level: f32,
}

impl Default for VoiceSnapshot {
    fn default() -> Self {
        Self {
            active: false,
            note: 0,
            stage: EnvelopeStage::Idle,
            level: 0.0,
        }
    }
}

/// One engine observation, published once per buffer tick.
#[derive(Debug, Clone, Copy)]
pub struct EngineSnapshot {
    /// Fixed-size voice slots; only `voices[..voice_count]` are meaningful.
    pub voices: [VoiceSnapshot; MAX_VOICES],
    /// Configured polyphony ceiling.
    pub voice_count: usize,
    /// Voices contributing to the mix this tick.
    pub active_voices: usize,
    /// Render ticks that missed their deadline so far.
    pub underruns: u64,
    /// Total frames rendered so far.
    pub frames_rendered: u64,
}

impl EngineSnapshot {
    /// The configured voice slots, without the unused tail.
    pub fn configured_voices(&self) -> &[VoiceSnapshot] {
        &self.voices[..self.voice_count]
    }
}

/// Shared counters, readable from any thread without touching the render
/// thread. Plain relaxed atomics; each is an independent monotonic count.
#[derive(Debug, Default)]
pub struct EngineStats {
    pub(crate) underruns: AtomicU64,
    pub(crate) dropped_events: AtomicU64,
    pub(crate) active_voices: AtomicU64,
    pub(crate) frames_rendered: AtomicU64,
}

impl EngineStats {
    /// Render ticks that exceeded their time budget.
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }

    /// Note events dropped because the ingress ring was full.
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// Voices contributing to the mix as of the last tick.
    pub fn active_voices(&self) -> u64 {
        self.active_voices.load(Ordering::Relaxed)
    }

    /// Total frames rendered.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered.load(Ordering::Relaxed)
    }
}

/// Consumer side of the snapshot channel.
///
/// `latest()` drains the ring and keeps the freshest observation; reading
/// never mutates engine state and never blocks the render thread.
pub struct SnapshotReader {
    rx: Consumer<EngineSnapshot>,
    stats: Arc<EngineStats>,
    last: Option<EngineSnapshot>,
}

impl SnapshotReader {
    pub(crate) fn new(rx: Consumer<EngineSnapshot>, stats: Arc<EngineStats>) -> Self {
        Self {
            rx,
            stats,
            last: None,
        }
    }

    /// The most recent snapshot the render thread has published, or None
    /// before the first tick.
    pub fn latest(&mut self) -> Option<EngineSnapshot> {
        while let Ok(snapshot) = self.rx.pop() {
            self.last = Some(snapshot);
        }
        self.last
    }

    /// Global counters (underruns, active voices, dropped events).
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }
}
