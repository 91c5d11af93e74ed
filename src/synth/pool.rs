use crate::synth::voice::{Voice, VoiceState};

/// Fixed arena of voices, owned and mutated exclusively by the render
/// thread.
///
/// Every operation is O(capacity), bounded, and allocation-free; the only
/// allocation happens at construction, before the render thread exists.
/// At most `capacity` voices are non-Idle at any time, and a voice only
/// ever moves Idle → Active → (Releasing) → Idle.
pub struct VoicePool {
    voices: Vec<Voice>,
    /// Monotonic trigger counter; defines "oldest" for stealing and "most
    /// recent" for ambiguous note-offs.
    next_stamp: u64,
}

impl VoicePool {
    pub fn new(sample_rate: f32, max_voices: usize) -> Self {
        let voices = (0..max_voices)
            .map(|i| Voice::new(sample_rate, 0x9E37_79B9_7F4A_7C15 ^ (i as u64 + 1)))
            .collect();

        Self {
            voices,
            next_stamp: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.voices.len()
    }

    /// Voices currently contributing to the mix (Active or Releasing).
    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    /// Allocate a voice for `note` and trigger it. Never rejects a
    /// note-on: on exhaustion a victim is stolen and retriggered
    /// immediately, discarding its prior note's tail.
    pub fn note_on(&mut self, note: u8, velocity: f32) {
        let stamp = self.next_stamp;
        self.next_stamp += 1;

        if let Some(idx) = self.find_idle().or_else(|| self.find_victim()) {
            self.voices[idx].trigger(note, velocity, stamp);
        }
    }

    /// Release the Active voice holding `note`. When the same pitch was
    /// retriggered while still held, the most recently triggered match is
    /// released. Silently a no-op when nothing matches.
    pub fn note_off(&mut self, note: u8) {
        let found = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == VoiceState::Active && v.note() == note)
            .max_by_key(|(_, v)| v.stamp())
            .map(|(idx, _)| idx);

        if let Some(idx) = found {
            self.voices[idx].release();
        }
    }

    /// Release every Active voice.
    pub fn release_all(&mut self) {
        for voice in &mut self.voices {
            voice.release();
        }
    }

    /// Move every finished voice back to Idle. Called once per render
    /// cycle; idempotent, a pool with nothing reclaimable is untouched.
    pub fn reclaim(&mut self) {
        for voice in &mut self.voices {
            if voice.is_reclaimable() {
                voice.reclaim();
            }
        }
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn voices_mut(&mut self) -> &mut [Voice] {
        &mut self.voices
    }

    fn find_idle(&self) -> Option<usize> {
        self.voices
            .iter()
            .position(|v| v.state() == VoiceState::Idle)
    }

    /// Steal target: the most-advanced Releasing voice (lowest envelope
    /// level) when any voice is Releasing, otherwise the oldest-triggered
    /// Active voice.
    fn find_victim(&self) -> Option<usize> {
        let releasing = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == VoiceState::Releasing)
            .min_by(|(_, a), (_, b)| a.envelope_level().total_cmp(&b.envelope_level()))
            .map(|(idx, _)| idx);

        if releasing.is_some() {
            return releasing;
        }

        self.voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == VoiceState::Active)
            .min_by_key(|(_, v)| v.stamp())
            .map(|(idx, _)| idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParameterStore, RenderParams};

    const SAMPLE_RATE: f32 = 44_100.0;

    fn render_params() -> RenderParams {
        ParameterStore::new(SAMPLE_RATE).render_view()
    }

    fn render_blocks(pool: &mut VoicePool, params: &RenderParams, blocks: usize) {
        let mut buffer = vec![0.0f32; 256];
        for _ in 0..blocks {
            pool.reclaim();
            for voice in pool.voices_mut() {
                if voice.is_active() {
                    voice.render(&mut buffer, params, params.cutoff_hz);
                }
            }
        }
    }

    fn held_notes(pool: &VoicePool) -> Vec<u8> {
        let mut notes: Vec<u8> = pool
            .voices()
            .iter()
            .filter(|v| v.state() == VoiceState::Active)
            .map(|v| v.note())
            .collect();
        notes.sort_unstable();
        notes
    }

    #[test]
    fn allocates_idle_voices_first() {
        let mut pool = VoicePool::new(SAMPLE_RATE, 4);

        pool.note_on(60, 1.0);
        pool.note_on(64, 1.0);
        assert_eq!(pool.active_count(), 2);
        assert_eq!(held_notes(&pool), vec![60, 64]);
    }

    #[test]
    fn never_exceeds_the_polyphony_ceiling() {
        let max_voices = 4;
        let mut pool = VoicePool::new(SAMPLE_RATE, max_voices);
        let params = render_params();

        // Pseudo-random on/off pattern, 10x the ceiling in length.
        let mut rng: u64 = 0xBAD5_EED;
        for step in 0..(10 * max_voices) {
            rng ^= rng << 13;
            rng ^= rng >> 7;
            rng ^= rng << 17;

            let note = 40 + (rng % 40) as u8;
            if step % 3 == 2 {
                pool.note_off(note);
            } else {
                pool.note_on(note, 1.0);
            }
            render_blocks(&mut pool, &params, 1);

            assert!(
                pool.active_count() <= max_voices,
                "ceiling exceeded at step {step}"
            );
        }
    }

    #[test]
    fn exhaustion_steals_the_oldest_active_voice() {
        // maxVoices=2; noteOn(60), noteOn(64), noteOn(67): the third call
        // steals the oldest voice (holding 60), leaving exactly 64 and 67.
        let mut pool = VoicePool::new(SAMPLE_RATE, 2);

        pool.note_on(60, 1.0);
        pool.note_on(64, 1.0);
        pool.note_on(67, 1.0);

        assert_eq!(pool.active_count(), 2);
        assert_eq!(held_notes(&pool), vec![64, 67]);
    }

    #[test]
    fn exhaustion_prefers_the_most_advanced_releasing_voice() {
        let mut pool = VoicePool::new(SAMPLE_RATE, 3);
        let params = render_params();

        pool.note_on(60, 1.0);
        pool.note_on(64, 1.0);
        pool.note_on(67, 1.0);
        render_blocks(&mut pool, &params, 2);

        // 64 enters release first, then 67: by steal time 64's level has
        // fallen further (most advanced).
        pool.note_off(64);
        render_blocks(&mut pool, &params, 4);
        pool.note_off(67);
        render_blocks(&mut pool, &params, 1);

        pool.note_on(72, 1.0);

        // 60 is still held; the steal must have hit the releasing voice
        // that was further along (previously 64).
        let notes = held_notes(&pool);
        assert!(notes.contains(&60), "held voice must not be stolen");
        assert!(notes.contains(&72));
        let still_releasing: Vec<u8> = pool
            .voices()
            .iter()
            .filter(|v| v.state() == VoiceState::Releasing)
            .map(|v| v.note())
            .collect();
        assert_eq!(still_releasing, vec![67]);
    }

    #[test]
    fn note_off_releases_the_most_recent_duplicate() {
        let mut pool = VoicePool::new(SAMPLE_RATE, 4);

        pool.note_on(60, 1.0);
        pool.note_on(60, 0.5);

        pool.note_off(60);

        // The second trigger (larger stamp) is the one released.
        let releasing: Vec<u64> = pool
            .voices()
            .iter()
            .filter(|v| v.state() == VoiceState::Releasing)
            .map(|v| v.stamp())
            .collect();
        assert_eq!(releasing, vec![1]);

        let active: Vec<u64> = pool
            .voices()
            .iter()
            .filter(|v| v.state() == VoiceState::Active)
            .map(|v| v.stamp())
            .collect();
        assert_eq!(active, vec![0]);
    }

    #[test]
    fn unmatched_note_off_changes_nothing() {
        let mut pool = VoicePool::new(SAMPLE_RATE, 4);
        pool.note_on(60, 1.0);

        let before: Vec<(VoiceState, u8)> = pool
            .voices()
            .iter()
            .map(|v| (v.state(), v.note()))
            .collect();

        pool.note_off(61); // nothing holds 61

        let after: Vec<(VoiceState, u8)> = pool
            .voices()
            .iter()
            .map(|v| (v.state(), v.note()))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn reclaim_is_idempotent_on_an_idle_pool() {
        let mut pool = VoicePool::new(SAMPLE_RATE, 4);

        pool.reclaim();
        pool.reclaim();
        assert_eq!(pool.active_count(), 0);
        assert!(pool
            .voices()
            .iter()
            .all(|v| v.state() == VoiceState::Idle));
    }

    #[test]
    fn released_voices_are_reclaimed_after_the_tail() {
        let mut pool = VoicePool::new(SAMPLE_RATE, 2);
        let params = render_params();

        pool.note_on(60, 1.0);
        render_blocks(&mut pool, &params, 2);
        pool.note_off(60);

        // Default release is 0.3 s at 44.1 kHz: ~52 blocks of 256.
        render_blocks(&mut pool, &params, 60);
        pool.reclaim();

        assert_eq!(pool.active_count(), 0);
        assert!(pool
            .voices()
            .iter()
            .all(|v| v.state() == VoiceState::Idle));
    }

    #[test]
    fn release_all_empties_the_pool_over_time() {
        let mut pool = VoicePool::new(SAMPLE_RATE, 4);
        let params = render_params();

        for note in [60, 64, 67] {
            pool.note_on(note, 1.0);
        }
        pool.release_all();
        assert!(pool
            .voices()
            .iter()
            .filter(|v| v.is_active())
            .all(|v| v.state() == VoiceState::Releasing));

        render_blocks(&mut pool, &params, 60);
        pool.reclaim();
        assert_eq!(pool.active_count(), 0);
    }
}
