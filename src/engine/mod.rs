//! Engine assembly: immutable configuration, the render-side
//! [`AudioRenderer`], the control-side [`SynthController`], and the
//! observability snapshot channel.
//!
//! Construction is the one fallible step in the crate: a bad configuration
//! is rejected here, before any thread exists. Everything after `build`
//! absorbs its anomalies locally (clamp, ignore, or count).

pub mod controller;
pub mod renderer;
pub mod snapshot;

use std::sync::Arc;

use rtrb::RingBuffer;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::params::ParameterStore;
use crate::{MAX_BLOCK_SIZE, MAX_VOICES};

pub use controller::SynthController;
pub use renderer::AudioRenderer;
pub use snapshot::{EngineSnapshot, EngineStats, SnapshotReader, VoiceSnapshot};

/// Capacity of the note-event ring. At a ~100 Hz control rate and ~5 ms
/// buffer ticks the queue drains every tick; 256 slots absorb bursts
/// without the producer ever waiting.
const NOTE_QUEUE_SIZE: usize = 256;

/// Capacity of the snapshot ring. Readers only want the freshest
/// observation, so a short queue is enough; a full ring drops the push.
const SNAPSHOT_QUEUE_SIZE: usize = 8;

/// Immutable engine configuration, injected at construction.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Output sample rate in Hz.
    pub sample_rate: f32,
    /// Samples per render tick.
    pub buffer_size: usize,
    /// Polyphony ceiling.
    pub max_voices: usize,
    /// Fixed gain applied to the summed mix before the safety clamp.
    pub amp_headroom: f32,
    /// Hard output bounds; every emitted sample lies inside.
    pub clamp_range: (f32, f32),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100.0,
            buffer_size: 256,
            max_voices: 16,
            amp_headroom: 0.7,
            clamp_range: (-1.0, 1.0),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f32),
    #[error("buffer size must be in 1..={max}, got {got}")]
    InvalidBufferSize { got: usize, max: usize },
    #[error("max voices must be in 1..={max}, got {got}")]
    InvalidMaxVoices { got: usize, max: usize },
    #[error("amp headroom must be positive and finite, got {0}")]
    InvalidHeadroom(f32),
    #[error("clamp range must satisfy min < max, got [{0}, {1}]")]
    InvalidClampRange(f32, f32),
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate > 0.0 && self.sample_rate.is_finite()) {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if self.buffer_size == 0 || self.buffer_size > MAX_BLOCK_SIZE {
            return Err(ConfigError::InvalidBufferSize {
                got: self.buffer_size,
                max: MAX_BLOCK_SIZE,
            });
        }
        if self.max_voices == 0 || self.max_voices > MAX_VOICES {
            return Err(ConfigError::InvalidMaxVoices {
                got: self.max_voices,
                max: MAX_VOICES,
            });
        }
        if !(self.amp_headroom > 0.0 && self.amp_headroom.is_finite()) {
            return Err(ConfigError::InvalidHeadroom(self.amp_headroom));
        }
        let (lo, hi) = self.clamp_range;
        if !(lo < hi && lo.is_finite() && hi.is_finite()) {
            return Err(ConfigError::InvalidClampRange(lo, hi));
        }
        Ok(())
    }
}

/// Wire up a complete engine.
///
/// Returns the renderer (to be owned by the real-time audio thread), the
/// controller (the control thread's only ingress), and the snapshot reader
/// (for observability collaborators). The three sides share nothing but
/// atomics and bounded SPSC rings.
pub fn build(
    config: EngineConfig,
) -> Result<(AudioRenderer, SynthController, SnapshotReader), ConfigError> {
    config.validate()?;

    let params = Arc::new(ParameterStore::new(config.sample_rate));
    let stats = Arc::new(EngineStats::default());

    let (note_tx, note_rx) = RingBuffer::new(NOTE_QUEUE_SIZE);
    let (snapshot_tx, snapshot_rx) = RingBuffer::new(SNAPSHOT_QUEUE_SIZE);

    let renderer = AudioRenderer::new(
        config,
        Arc::clone(&params),
        Arc::clone(&stats),
        note_rx,
        snapshot_tx,
    );
    let controller = SynthController::new(params, Arc::clone(&stats), note_tx);
    let reader = SnapshotReader::new(snapshot_rx, stats);

    Ok((renderer, controller, reader))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_sample_rate_is_rejected() {
        let config = EngineConfig {
            sample_rate: 0.0,
            ..EngineConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidSampleRate(0.0))
        );
    }

    #[test]
    fn zero_voices_is_rejected() {
        let config = EngineConfig {
            max_voices: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMaxVoices { got: 0, .. })
        ));
    }

    #[test]
    fn oversized_buffer_is_rejected() {
        let config = EngineConfig {
            buffer_size: MAX_BLOCK_SIZE + 1,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBufferSize { .. })
        ));
    }

    #[test]
    fn inverted_clamp_range_is_rejected() {
        let config = EngineConfig {
            clamp_range: (1.0, -1.0),
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidClampRange(..))
        ));
    }

    #[test]
    fn build_rejects_before_any_thread_exists() {
        let config = EngineConfig {
            max_voices: MAX_VOICES + 1,
            ..EngineConfig::default()
        };
        assert!(build(config).is_err());
    }
}
