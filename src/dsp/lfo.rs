use crate::dsp::oscillator::{Oscillator, Waveform};

/// Control-rate oscillator, advanced once per buffer tick.
///
/// Same waveform math as the audio-band oscillator, run at the tick rate
/// (sample_rate / buffer_size) instead of the sample rate. Output is
/// bipolar in [-1, 1]; the renderer maps it onto the modulation target.
/// Free-running: note events never reset the phase.
pub struct Lfo {
    osc: Oscillator,
}

impl Lfo {
    pub fn new(sample_rate: f32, buffer_size: usize) -> Self {
        let tick_rate = sample_rate / buffer_size.max(1) as f32;
        Self {
            osc: Oscillator::new(Waveform::Sine, tick_rate),
        }
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.osc.set_waveform(waveform);
    }

    /// Advance one buffer tick and return the bipolar LFO value for it.
    #[inline]
    pub fn next_tick(&mut self, rate_hz: f32) -> f32 {
        self.osc.next_sample(rate_hz)
    }
}

/// Exponential cutoff modulation: `base · 2^(lfo · depth)`.
///
/// At depth 1.0 the sweep spans one octave either side of the base cutoff,
/// which reads as an even sweep to the ear; at depth 0 the base passes
/// through untouched.
#[inline]
pub fn modulate_cutoff(base_hz: f32, lfo: f32, depth: f32) -> f32 {
    base_hz * 2.0_f32.powf(lfo * depth)
}
