use crate::dsp::envelope::{Envelope, EnvelopeStage};
use crate::dsp::filter::LowPassFilter;
use crate::dsp::noise::NoiseSource;
use crate::dsp::oscillator::{detune_ratio, Oscillator, Waveform};
use crate::params::{RenderParams, OSC_SLOTS};
use crate::synth::midi_note_to_freq;

/// Waveform assigned to each oscillator slot, matching the slot order of
/// the mix/detune parameters.
const SLOT_WAVEFORMS: [Waveform; OSC_SLOTS] = [
    Waveform::Sine,
    Waveform::Saw,
    Waveform::Triangle,
    Waveform::Pulse,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Idle,      // Available for allocation
    Active,    // Playing, envelope in attack/decay/sustain
    Releasing, // Note released, envelope in release phase
}

/// One note's full signal chain: four oscillator slots plus noise and a
/// sub-oscillator, summed into the filter, shaped by the envelope.
pub struct Voice {
    note: u8,
    velocity: f32,
    state: VoiceState,
    /// Trigger sequence number, assigned by the pool. Later trigger =
    /// larger stamp; this is what "oldest" and "most recent" mean in the
    /// stealing and note-off rules.
    stamp: u64,
    frequency: f32,

    oscillators: [Oscillator; OSC_SLOTS],
    sub_osc: Oscillator,
    noise: NoiseSource,
    filter: LowPassFilter,
    envelope: Envelope,
}

impl Voice {
    pub fn new(sample_rate: f32, noise_seed: u64) -> Self {
        Self {
            note: 0,
            velocity: 0.0,
            state: VoiceState::Idle,
            stamp: 0,
            frequency: 0.0,
            oscillators: SLOT_WAVEFORMS.map(|waveform| Oscillator::new(waveform, sample_rate)),
            sub_osc: Oscillator::new(Waveform::Sine, sample_rate),
            noise: NoiseSource::new(noise_seed),
            filter: LowPassFilter::new(sample_rate),
            envelope: Envelope::new(sample_rate),
        }
    }

    /// Bind this voice to a note.
    ///
    /// Oscillator phases are deliberately left untouched: continuing from
    /// the previous phase is what keeps retriggers and steals click-free.
    /// A steal lands here too; the prior note's tail is simply discarded.
    pub fn trigger(&mut self, note: u8, velocity: f32, stamp: u64) {
        self.note = note;
        self.velocity = velocity.clamp(0.0, 1.0);
        self.frequency = midi_note_to_freq(note);
        self.state = VoiceState::Active;
        self.stamp = stamp;
        self.envelope.note_on();
    }

    pub fn release(&mut self) {
        if self.state == VoiceState::Active {
            self.state = VoiceState::Releasing;
            self.envelope.note_off();
        }
    }

    /// True once the release has fully closed; the pool may move this
    /// voice back to Idle.
    pub fn is_reclaimable(&self) -> bool {
        self.state == VoiceState::Releasing && !self.envelope.is_active()
    }

    /// Return to Idle. Filter memory, oscillator phases, and envelope
    /// state are cleared here and only here, so a reused voice never
    /// replays stale state.
    pub fn reclaim(&mut self) {
        self.state = VoiceState::Idle;
        self.note = 0;
        self.velocity = 0.0;
        self.filter.reset();
        for osc in &mut self.oscillators {
            osc.reset_phase();
        }
        self.sub_osc.reset_phase();
        self.envelope.reset();
    }

    /// Render one block of this voice into `out`.
    ///
    /// `cutoff_hz` arrives separately from the parameter snapshot because
    /// the renderer applies LFO modulation on top of the base cutoff.
    pub fn render(&mut self, out: &mut [f32], params: &RenderParams, cutoff_hz: f32) {
        self.envelope
            .set_adsr(params.attack, params.decay, params.sustain, params.release);
        if params.filter_enabled {
            self.filter.set_params(cutoff_hz, params.resonance);
        }

        for slot in out.iter_mut() {
            let mut sample = 0.0;
            for (i, osc) in self.oscillators.iter_mut().enumerate() {
                let frequency = self.frequency * detune_ratio(params.osc_detune[i]);
                sample += osc.next_sample(frequency) * params.osc_mix[i];
            }

            if params.noise_enabled {
                sample += self.noise.next_sample() * params.noise_mix;
                sample += self.sub_osc.next_sample(self.frequency * 0.5) * params.sub_mix;
            }

            let shaped = if params.filter_enabled {
                self.filter.next_sample(sample)
            } else {
                sample
            };

            *slot = shaped * self.envelope.next_sample() * self.velocity;
        }
    }

    /// True while the voice contributes to the mix (Active or Releasing).
    pub fn is_active(&self) -> bool {
        matches!(self.state, VoiceState::Active | VoiceState::Releasing)
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    pub fn envelope_level(&self) -> f32 {
        self.envelope.level()
    }

    pub fn envelope_stage(&self) -> EnvelopeStage {
        self.envelope.stage()
    }
}
