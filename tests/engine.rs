//! End-to-end tests driving the public engine API: controller in, rendered
//! buffers and snapshots out.

use subsynth::params::{Module, ParamId, ParamUpdate};
use subsynth::synth::message::SynthMessage;
use subsynth::{build, ConfigError, EngineConfig, MAX_VOICES};

fn peak(buffer: &[f32]) -> f32 {
    buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
}

#[test]
fn renders_silence_with_no_notes() {
    let config = EngineConfig::default();
    let (mut renderer, _controller, _snapshots) = build(config).unwrap();

    let mut buffer = vec![0.0f32; config.buffer_size];
    renderer.render_tick(&mut buffer);

    assert_eq!(peak(&buffer), 0.0);
}

#[test]
fn zero_attack_voice_is_audible_in_the_first_buffer() {
    // sampleRate=44100, bufferSize=256: a single voice triggered with
    // attack=0 must show a non-zero peak in its very first buffer.
    let config = EngineConfig {
        sample_rate: 44_100.0,
        buffer_size: 256,
        ..EngineConfig::default()
    };
    let (mut renderer, mut controller, _snapshots) = build(config).unwrap();

    controller.submit_parameter_update(ParamUpdate {
        id: ParamId::EnvAttack,
        value: 0.0,
    });
    controller.submit_note_event(SynthMessage::NoteOn {
        note: 60,
        velocity: 1.0,
    });

    let mut buffer = vec![0.0f32; config.buffer_size];
    renderer.render_tick(&mut buffer);

    assert!(
        peak(&buffer) > 0.0,
        "first buffer after note-on should be audible"
    );
}

#[test]
fn output_always_lies_within_the_clamp_range() {
    let config = EngineConfig {
        clamp_range: (-0.8, 0.8),
        ..EngineConfig::default()
    };
    let (mut renderer, mut controller, _snapshots) = build(config).unwrap();

    // Pile on voices and crank the gain to force the summed mix well past
    // the bounds.
    controller.submit_parameter_update(ParamUpdate {
        id: ParamId::MasterGain,
        value: 2.0,
    });
    for note in 48..64 {
        controller.submit_note_event(SynthMessage::NoteOn {
            note,
            velocity: 1.0,
        });
    }

    let mut buffer = vec![0.0f32; config.buffer_size];
    for _ in 0..20 {
        renderer.render_tick(&mut buffer);
        for &sample in &buffer {
            assert!(
                (-0.8..=0.8).contains(&sample),
                "sample {sample} escaped the clamp range"
            );
        }
    }
}

#[test]
fn above_ceiling_cutoff_write_reads_back_clamped() {
    // A cutoff write above the configured maximum is clamped at the write
    // site; the read returns exactly the clamped value, never the raw
    // input.
    let config = EngineConfig::default();
    let (_renderer, controller, _snapshots) = build(config).unwrap();

    controller.submit_parameter_update(ParamUpdate {
        id: ParamId::FilterCutoff,
        value: 20_000.0,
    });

    let expected = config.sample_rate * 0.45;
    assert_eq!(controller.parameter(ParamId::FilterCutoff), expected);
}

#[test]
fn polyphony_ceiling_holds_under_note_floods() {
    let config = EngineConfig {
        max_voices: 4,
        ..EngineConfig::default()
    };
    let (mut renderer, mut controller, mut snapshots) = build(config).unwrap();

    let mut buffer = vec![0.0f32; config.buffer_size];
    for round in 0..10u8 {
        for offset in 0..4u8 {
            controller.submit_note_event(SynthMessage::NoteOn {
                note: 36 + round * 4 + offset,
                velocity: 1.0,
            });
        }
        renderer.render_tick(&mut buffer);

        let snapshot = snapshots.latest().expect("snapshot after tick");
        assert!(
            snapshot.active_voices <= config.max_voices,
            "round {round}: {} active voices exceed ceiling",
            snapshot.active_voices
        );
    }
}

#[test]
fn third_note_on_two_voices_steals_the_oldest() {
    let config = EngineConfig {
        max_voices: 2,
        ..EngineConfig::default()
    };
    let (mut renderer, mut controller, mut snapshots) = build(config).unwrap();
    let mut buffer = vec![0.0f32; config.buffer_size];

    for note in [60, 64, 67] {
        controller.submit_note_event(SynthMessage::NoteOn {
            note,
            velocity: 1.0,
        });
    }
    renderer.render_tick(&mut buffer);

    let snapshot = snapshots.latest().unwrap();
    let mut held: Vec<u8> = snapshot
        .configured_voices()
        .iter()
        .filter(|v| v.active)
        .map(|v| v.note)
        .collect();
    held.sort_unstable();

    assert_eq!(snapshot.active_voices, 2);
    assert_eq!(held, vec![64, 67], "oldest voice (60) must be stolen");
}

#[test]
fn unmatched_note_off_is_silently_ignored() {
    let config = EngineConfig::default();
    let (mut renderer, mut controller, mut snapshots) = build(config).unwrap();
    let mut buffer = vec![0.0f32; config.buffer_size];

    controller.submit_note_event(SynthMessage::NoteOn {
        note: 64,
        velocity: 1.0,
    });
    renderer.render_tick(&mut buffer);
    let before = snapshots.latest().unwrap();

    // Nothing holds 60; this must change no voice state and raise nothing.
    controller.submit_note_event(SynthMessage::NoteOff { note: 60 });
    renderer.render_tick(&mut buffer);
    let after = snapshots.latest().unwrap();

    assert_eq!(before.active_voices, after.active_voices);
    for (b, a) in before
        .configured_voices()
        .iter()
        .zip(after.configured_voices())
    {
        assert_eq!(b.active, a.active);
        assert_eq!(b.note, a.note);
        assert_eq!(b.stage, a.stage);
    }
}

#[test]
fn note_off_moves_the_voice_through_release_to_idle() {
    let config = EngineConfig::default();
    let (mut renderer, mut controller, mut snapshots) = build(config).unwrap();
    let mut buffer = vec![0.0f32; config.buffer_size];

    controller.submit_note_event(SynthMessage::NoteOn {
        note: 60,
        velocity: 1.0,
    });
    renderer.render_tick(&mut buffer);
    assert_eq!(snapshots.latest().unwrap().active_voices, 1);

    controller.submit_note_event(SynthMessage::NoteOff { note: 60 });

    // Default release is 0.3 s; render past it and the voice must be
    // reclaimed.
    let ticks = (0.4 * config.sample_rate / config.buffer_size as f32) as usize;
    for _ in 0..ticks {
        renderer.render_tick(&mut buffer);
    }

    let snapshot = snapshots.latest().unwrap();
    assert_eq!(snapshot.active_voices, 0);
    assert_eq!(peak(&buffer), 0.0, "released voice should have gone silent");
}

#[test]
fn snapshot_reports_per_voice_pitch_stage_and_level() {
    let config = EngineConfig::default();
    let (mut renderer, mut controller, mut snapshots) = build(config).unwrap();
    let mut buffer = vec![0.0f32; config.buffer_size];

    controller.submit_note_event(SynthMessage::NoteOn {
        note: 72,
        velocity: 1.0,
    });
    for _ in 0..8 {
        renderer.render_tick(&mut buffer);
    }

    let snapshot = snapshots.latest().unwrap();
    let voice = snapshot
        .configured_voices()
        .iter()
        .find(|v| v.active)
        .expect("one active voice");
    assert_eq!(voice.note, 72);
    assert!(voice.level > 0.0);
    assert_eq!(snapshot.voice_count, config.max_voices);
}

#[test]
fn overflowing_the_note_ring_drops_and_counts() {
    let config = EngineConfig::default();
    let (_renderer, mut controller, _snapshots) = build(config).unwrap();

    // The ring is bounded; without a renderer draining it, the overflow
    // must be dropped and counted, never blocked on.
    for _ in 0..1_000 {
        controller.submit_note_event(SynthMessage::NoteOn {
            note: 60,
            velocity: 1.0,
        });
    }

    let dropped = controller.stats().dropped_events();
    assert!(
        (1..1_000).contains(&dropped),
        "expected some but not all events dropped, got {dropped}"
    );
}

#[test]
fn disabling_the_filter_module_passes_signal_through() {
    let config = EngineConfig::default();
    let (mut renderer, mut controller, _snapshots) = build(config).unwrap();
    let mut buffer = vec![0.0f32; config.buffer_size];

    // Nearly closed filter strangles a bright note...
    controller.submit_parameter_update(ParamUpdate {
        id: ParamId::FilterCutoff,
        value: 30.0,
    });
    controller.submit_note_event(SynthMessage::NoteOn {
        note: 96,
        velocity: 1.0,
    });
    for _ in 0..10 {
        renderer.render_tick(&mut buffer);
    }
    let filtered_peak = peak(&buffer);

    // ...and bypassing the module restores it.
    controller.set_module_enabled(Module::Filter, false);
    for _ in 0..10 {
        renderer.render_tick(&mut buffer);
    }
    let bypassed_peak = peak(&buffer);

    assert!(
        bypassed_peak > filtered_peak * 2.0,
        "bypass should be louder: bypassed={bypassed_peak}, filtered={filtered_peak}"
    );
}

#[test]
fn all_notes_off_releases_everything() {
    let config = EngineConfig::default();
    let (mut renderer, mut controller, mut snapshots) = build(config).unwrap();
    let mut buffer = vec![0.0f32; config.buffer_size];

    for note in [60, 64, 67, 71] {
        controller.submit_note_event(SynthMessage::NoteOn {
            note,
            velocity: 1.0,
        });
    }
    renderer.render_tick(&mut buffer);
    assert_eq!(snapshots.latest().unwrap().active_voices, 4);

    controller.submit_note_event(SynthMessage::AllNotesOff);
    let ticks = (0.4 * config.sample_rate / config.buffer_size as f32) as usize;
    for _ in 0..ticks {
        renderer.render_tick(&mut buffer);
    }

    assert_eq!(snapshots.latest().unwrap().active_voices, 0);
}

#[test]
fn invalid_configs_fail_fast_at_build() {
    assert!(matches!(
        build(EngineConfig {
            sample_rate: -1.0,
            ..EngineConfig::default()
        }),
        Err(ConfigError::InvalidSampleRate(_))
    ));
    assert!(matches!(
        build(EngineConfig {
            max_voices: MAX_VOICES + 1,
            ..EngineConfig::default()
        }),
        Err(ConfigError::InvalidMaxVoices { .. })
    ));
    assert!(matches!(
        build(EngineConfig {
            buffer_size: 0,
            ..EngineConfig::default()
        }),
        Err(ConfigError::InvalidBufferSize { .. })
    ));
}

#[test]
fn control_thread_can_mutate_parameters_while_rendering() {
    let config = EngineConfig::default();
    let (mut renderer, mut controller, _snapshots) = build(config).unwrap();

    controller.submit_note_event(SynthMessage::NoteOn {
        note: 60,
        velocity: 1.0,
    });

    let writer = std::thread::spawn(move || {
        for i in 0..2_000 {
            controller.submit_parameter_update(ParamUpdate {
                id: ParamId::FilterCutoff,
                value: 100.0 + (i % 100) as f32 * 150.0,
            });
            controller.submit_parameter_update(ParamUpdate {
                id: ParamId::FilterResonance,
                value: (i % 10) as f32 / 10.0,
            });
        }
        controller
    });

    // Render concurrently with the writes; every emitted sample must stay
    // finite and inside the clamp range.
    let mut buffer = vec![0.0f32; config.buffer_size];
    let (lo, hi) = config.clamp_range;
    for _ in 0..50 {
        renderer.render_tick(&mut buffer);
        for &sample in &buffer {
            assert!(sample.is_finite());
            assert!((lo..=hi).contains(&sample));
        }
    }

    writer.join().unwrap();
}
