//! The per-buffer render cycle.
//!
//! One `render_tick` call produces exactly one output buffer: drain queued
//! note events, reclaim finished voices, read the parameter table once,
//! advance the LFO, sum every sounding voice, apply headroom and the hard
//! safety clamp, publish an observability snapshot. Nothing on this path
//! blocks, allocates, or takes a lock; the scratch buffer and voice arena
//! are allocated at construction, before the audio thread exists.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rtrb::{Consumer, Producer};

use crate::dsp::filter::{max_cutoff, MIN_CUTOFF};
use crate::dsp::lfo::{modulate_cutoff, Lfo};
use crate::engine::snapshot::{EngineSnapshot, EngineStats, VoiceSnapshot};
use crate::engine::EngineConfig;
use crate::params::ParameterStore;
use crate::synth::message::SynthMessage;
use crate::synth::pool::VoicePool;
use crate::MAX_VOICES;

pub struct AudioRenderer {
    config: EngineConfig,
    params: Arc<ParameterStore>,
    stats: Arc<EngineStats>,
    notes: Consumer<SynthMessage>,
    snapshots: Producer<EngineSnapshot>,

    pool: VoicePool,
    lfo: Lfo,
    scratch: Vec<f32>,

    frames_rendered: u64,
    underruns: u64,
    tick_budget: Duration,
}

impl AudioRenderer {
    pub(crate) fn new(
        config: EngineConfig,
        params: Arc<ParameterStore>,
        stats: Arc<EngineStats>,
        notes: Consumer<SynthMessage>,
        snapshots: Producer<EngineSnapshot>,
    ) -> Self {
        Self {
            pool: VoicePool::new(config.sample_rate, config.max_voices),
            lfo: Lfo::new(config.sample_rate, config.buffer_size),
            scratch: vec![0.0; config.buffer_size],
            tick_budget: Duration::from_secs_f64(
                config.buffer_size as f64 / config.sample_rate as f64,
            ),
            config,
            params,
            stats,
            notes,
            snapshots,
            frames_rendered: 0,
            underruns: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Render one buffer tick into `out`.
    ///
    /// `out` is the configured buffer size; the whole slice is always
    /// filled, so a deadline miss still emits a complete buffer; it is
    /// counted as an underrun, never propagated.
    pub fn render_tick(&mut self, out: &mut [f32]) {
        debug_assert!(out.len() <= self.scratch.len());
        let started = Instant::now();

        self.drain_note_events();
        self.pool.reclaim();

        let params = self.params.render_view();

        // The LFO advances once per tick; events apply at buffer
        // boundaries, so block-rate modulation is as fine as it gets.
        let cutoff_hz = if params.lfo_enabled {
            let lfo = self.lfo.next_tick(params.lfo_rate);
            modulate_cutoff(params.cutoff_hz, lfo, params.lfo_depth)
                .clamp(MIN_CUTOFF, max_cutoff(self.config.sample_rate))
        } else {
            params.cutoff_hz
        };

        out.fill(0.0);
        let frames = out.len().min(self.scratch.len());
        let scratch = &mut self.scratch[..frames];
        for voice in self.pool.voices_mut() {
            if voice.is_active() {
                voice.render(scratch, &params, cutoff_hz);
                for (mixed, &sample) in out.iter_mut().zip(scratch.iter()) {
                    *mixed += sample;
                }
            }
        }

        // Fixed headroom and master gain, then the hard safety clamp: a
        // correctness bound on the output, not a cosmetic limiter.
        let gain = self.config.amp_headroom * params.master_gain;
        let (lo, hi) = self.config.clamp_range;
        for sample in out.iter_mut() {
            *sample = (*sample * gain).clamp(lo, hi);
        }

        self.frames_rendered += frames as u64;
        if started.elapsed() > self.tick_budget {
            self.underruns += 1;
            self.stats.underruns.fetch_add(1, Ordering::Relaxed);
        }

        let active = self.pool.active_count();
        self.stats
            .active_voices
            .store(active as u64, Ordering::Relaxed);
        self.stats
            .frames_rendered
            .store(self.frames_rendered, Ordering::Relaxed);

        self.publish_snapshot(active);
    }

    fn drain_note_events(&mut self) {
        while let Ok(message) = self.notes.pop() {
            match message {
                SynthMessage::NoteOn { note, velocity } => self.pool.note_on(note, velocity),
                SynthMessage::NoteOff { note } => self.pool.note_off(note),
                SynthMessage::AllNotesOff => self.pool.release_all(),
            }
        }
    }

    fn publish_snapshot(&mut self, active: usize) {
        let mut snapshot = EngineSnapshot {
            voices: [VoiceSnapshot::default(); MAX_VOICES],
            voice_count: self.pool.capacity(),
            active_voices: active,
            underruns: self.underruns,
            frames_rendered: self.frames_rendered,
        };

        for (slot, voice) in snapshot.voices.iter_mut().zip(self.pool.voices()) {
            *slot = VoiceSnapshot {
                active: voice.is_active(),
                note: voice.note(),
                stage: voice.envelope_stage(),
                level: voice.envelope_level(),
            };
        }

        // Full ring: drop the push, the reader only wants fresh data.
        let _ = self.snapshots.push(snapshot);
    }
}
