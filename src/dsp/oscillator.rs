use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
| waveform | phase → sample            | spectrum                  |
| -------- | ------------------------- | ------------------------- |
| sine     | sin(2π·phase)             | fundamental only          |
| saw      | 2·phase − 1               | all harmonics, 1/n        |
| triangle | folded saw                | odd harmonics, 1/n²       |
| pulse    | phase < 0.5 ? +1 : −1     | odd harmonics, 1/n        |
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Saw,
    Triangle,
    Pulse,
}

/// Phase-accumulator oscillator producing one sample per call.
///
/// The phase advances by `frequency / sample_rate` each sample and wraps
/// into [0, 1). Nothing here allocates or locks, and no waveform does more
/// work than its shape requires, so a fixed number of oscillators always
/// fits the per-sample budget.
///
/// Retriggering a note does not touch the phase: continuity across triggers
/// is what keeps voice reuse and stealing click-free. The phase is cleared
/// only when the owning voice is reclaimed.
pub struct Oscillator {
    waveform: Waveform,
    phase: f32,
    sample_rate: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform, sample_rate: f32) -> Self {
        Self {
            waveform,
            phase: 0.0,
            sample_rate,
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Clear the phase accumulator. Called on voice reclamation, never on
    /// retrigger.
    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }

    /// Generate the next sample at `frequency` Hz.
    #[inline]
    pub fn next_sample(&mut self, frequency: f32) -> f32 {
        let sample = match self.waveform {
            Waveform::Sine => (self.phase * TAU).sin(),
            Waveform::Saw => 2.0 * self.phase - 1.0,
            Waveform::Triangle => {
                let saw = 2.0 * self.phase - 1.0;
                2.0 * saw.abs() - 1.0
            }
            Waveform::Pulse => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        };

        self.phase += frequency / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample
    }

    /// Fill `out` with samples at a constant `frequency`.
    pub fn render(&mut self, out: &mut [f32], frequency: f32) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(frequency);
        }
    }
}

/// Frequency ratio for a detune in semitones: `2^(semitones / 12)`.
#[inline]
pub fn detune_ratio(semitones: f32) -> f32 {
    2.0_f32.powf(semitones / 12.0)
}
