use crate::MIN_TIME;

/*
ADSR state machine
------------------

    ┌──────┐  note_on   ┌────────┐  level=1   ┌───────┐  level=S  ┌─────────┐
    │ Idle │ ─────────► │ Attack │ ─────────► │ Decay │ ────────► │ Sustain │
    └──────┘            └────────┘            └───────┘           └─────────┘
        ▲                    │                    │                    │
        │                    └──────── note_off ──┴────────────────────┘
        │    level=0         ▼
        └─────────────── ┌─────────┐
                         │ Release │
                         └─────────┘

Ramps are linear in time: Δlevel = 1 / (stage_seconds · sample_rate) per
sample. note_off enters Release from the CURRENT level no matter which
stage is running, so a release during Attack never detours through
Decay/Sustain.

note_on enters Attack from the CURRENT level as well: a retriggered voice
ramps up from wherever its envelope sits instead of snapping to zero, which
is what keeps fast retriggers and voice steals click-free.

Release is special-cased: the starting level and total sample count are
snapshotted at note_off and interpolated, so the ramp lands exactly on 0.
*/

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

pub struct Envelope {
    // ADSR parameters, updated live from the parameter store
    attack_time: f32,
    decay_time: f32,
    sustain_level: f32,
    release_time: f32,

    sample_rate: f32,

    // Runtime state
    stage: EnvelopeStage,
    level: f32,

    // Release bookkeeping, snapshotted at note_off
    release_start_level: f32,
    release_total_samples: u32,
    release_elapsed_samples: u32,
}

impl Envelope {
    pub fn new(sample_rate: f32) -> Self {
        Self::adsr(sample_rate, 0.01, 0.1, 0.7, 0.3)
    }

    pub fn adsr(sample_rate: f32, attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack_time: attack.max(MIN_TIME),
            decay_time: decay.max(MIN_TIME),
            sustain_level: sustain.clamp(0.0, 1.0),
            release_time: release.max(MIN_TIME),

            sample_rate,

            stage: EnvelopeStage::Idle,
            level: 0.0,

            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        }
    }

    /// Update the stage times and sustain target without disturbing the
    /// running stage. Increments are computed fresh each sample, so changes
    /// take effect immediately.
    pub fn set_adsr(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        self.attack_time = attack.max(MIN_TIME);
        self.decay_time = decay.max(MIN_TIME);
        self.sustain_level = sustain.clamp(0.0, 1.0);
        self.release_time = release.max(MIN_TIME);
    }

    /// Gate high: enter Attack ramping from the current level.
    ///
    /// The level is deliberately NOT reset; a retrigger continues upward
    /// from wherever the envelope sits.
    pub fn note_on(&mut self) {
        self.stage = EnvelopeStage::Attack;
        self.release_elapsed_samples = 0;
    }

    /// Gate low: enter Release from the current level, from any stage.
    pub fn note_off(&mut self) {
        if self.stage == EnvelopeStage::Idle {
            return;
        }

        self.release_start_level = self.level;
        self.release_total_samples = (self.release_time * self.sample_rate).round().max(1.0) as u32;
        self.release_elapsed_samples = 0;
        self.stage = EnvelopeStage::Release;
    }

    /// Advance one sample and return the gain multiplier for it.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }

            EnvelopeStage::Attack => {
                let increment = 1.0 / (self.attack_time * self.sample_rate);
                self.level += increment;

                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
            }

            EnvelopeStage::Decay => {
                let decrement = (1.0 - self.sustain_level) / (self.decay_time * self.sample_rate);
                self.level -= decrement;

                if self.level <= self.sustain_level {
                    self.level = self.sustain_level;
                    self.stage = EnvelopeStage::Sustain;
                }
            }

            EnvelopeStage::Sustain => {
                // Track the sustain target so live parameter edits apply.
                self.level = self.sustain_level;
            }

            EnvelopeStage::Release => {
                let progress =
                    self.release_elapsed_samples as f32 / self.release_total_samples as f32;
                self.level = (self.release_start_level * (1.0 - progress)).max(0.0);

                self.release_elapsed_samples = self.release_elapsed_samples.saturating_add(1);

                if self.release_elapsed_samples >= self.release_total_samples {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// Returns true while the envelope produces output (any stage but
    /// Idle). A false return after a release signals the voice is
    /// reclaimable.
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    /// Drop back to Idle. Called on voice reclamation.
    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
        self.release_start_level = 0.0;
        self.release_elapsed_samples = 0;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }
}
