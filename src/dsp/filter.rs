use std::f32::consts::TAU;

/// Floor on the damping term. Resonance at the top of its range leaves the
/// filter with bounded gain instead of the k → 0 blow-up of the raw
/// formula, so no valid (cutoff, resonance) pair can produce NaN or
/// unbounded output.
const MIN_DAMPING: f32 = 0.08;

/// Coefficients for the two-pole state-variable low-pass, derived
/// deterministically from (cutoff, resonance, sample rate).
///
/// Deriving these costs a `tan` and a division, which is why they are
/// cached and re-derived only when an input changes rather than per sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterCoefficients {
    /// Prewarped integrator gain.
    g: f32,
    /// Damping (inverse resonance).
    k: f32,
    /// Precomputed 1 / (1 + g·(g + k)).
    h: f32,
}

impl FilterCoefficients {
    pub fn derive(cutoff_hz: f32, resonance: f32, sample_rate: f32) -> Self {
        let wd = TAU * cutoff_hz;
        let wa = (2.0 * sample_rate) * (wd / (2.0 * sample_rate)).tan();
        let g = wa / (2.0 * sample_rate);
        let k = (2.0 - 2.0 * resonance).max(MIN_DAMPING);
        let h = 1.0 / (1.0 + g * (g + k));

        Self { g, k, h }
    }
}

/// Resonant low-pass: topology-preserving state-variable structure, two
/// integrators whose memory persists across calls.
///
/// The delay state carries the filter's ringing between buffers; it is
/// cleared only on voice reclamation so a reused voice never rings with the
/// previous note's tail.
pub struct LowPassFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    cutoff_hz: f32,
    resonance: f32,
    sample_rate: f32,
    coefficients: FilterCoefficients,
}

impl LowPassFilter {
    pub fn new(sample_rate: f32) -> Self {
        let cutoff_hz = max_cutoff(sample_rate);
        let resonance = 0.0;

        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz,
            resonance,
            sample_rate,
            coefficients: FilterCoefficients::derive(cutoff_hz, resonance, sample_rate),
        }
    }

    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Update cutoff/resonance. Coefficients are re-derived only when the
    /// pair actually changed.
    pub fn set_params(&mut self, cutoff_hz: f32, resonance: f32) {
        if cutoff_hz != self.cutoff_hz || resonance != self.resonance {
            self.cutoff_hz = cutoff_hz;
            self.resonance = resonance;
            self.coefficients = FilterCoefficients::derive(cutoff_hz, resonance, self.sample_rate);
        }
    }

    /// Filter one sample through the low-pass response.
    #[inline]
    pub fn next_sample(&mut self, sample: f32) -> f32 {
        let FilterCoefficients { g, h, .. } = self.coefficients;

        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        v2
    }

    /// Clear the delay taps. Called on voice reclamation.
    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}

/// Highest cutoff the filter accepts at a given sample rate. Kept below
/// Nyquist so the prewarp `tan` stays on its principal branch.
#[inline]
pub fn max_cutoff(sample_rate: f32) -> f32 {
    sample_rate * 0.45
}

/// Lowest accepted cutoff, in Hz.
pub const MIN_CUTOFF: f32 = 20.0;
