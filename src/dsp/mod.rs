//! Low-level DSP primitives used by the voice signal chain.
//!
//! These components are allocation-free and realtime-safe, making them safe
//! to embed directly inside voice structs. They stay focused on the
//! signal-processing math; orchestration (voice lifecycle, parameter
//! routing, mixdown) lives in `synth` and `engine`.

/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Resonant low-pass state-variable filter.
pub mod filter;
/// Control-rate oscillator for parameter modulation.
pub mod lfo;
/// White-noise source for the noise/sub mix stage.
pub mod noise;
/// Audio-band phase-accumulator oscillator.
pub mod oscillator;

pub use envelope::EnvelopeStage;
