pub mod dsp;
pub mod engine; // Buffer-tick render loop, config, cross-thread handles
pub mod params; // Lock-free control-rate parameter store
pub mod synth; // Voice lifecycle and polyphony

pub use engine::{build, AudioRenderer, ConfigError, EngineConfig, SynthController};

/// Largest render buffer the engine can be configured with.
pub const MAX_BLOCK_SIZE: usize = 2048;
/// Hard ceiling on the configurable polyphony.
pub const MAX_VOICES: usize = 32;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
