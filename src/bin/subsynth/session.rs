//! A scripted control-rate session: chords, an arpeggio, and a filter
//! sweep, submitted through the engine's ingress the way a live event
//! source would.

use std::time::Duration;

use subsynth::params::{ParamId, ParamUpdate};
use subsynth::synth::message::SynthMessage;
use subsynth::SynthController;

const CHORDS: [[u8; 3]; 4] = [
    [60, 64, 67], // C major
    [57, 60, 64], // A minor
    [53, 57, 60], // F major
    [55, 59, 62], // G major
];

const ARPEGGIO: [u8; 8] = [48, 55, 60, 64, 67, 64, 60, 55];

pub fn run_session(mut controller: SynthController) {
    // A little bite: resonant filter, snappier envelope.
    controller.submit_parameter_update(ParamUpdate {
        id: ParamId::FilterResonance,
        value: 0.6,
    });
    controller.submit_parameter_update(ParamUpdate {
        id: ParamId::EnvRelease,
        value: 0.5,
    });

    // Chord progression with a slow cutoff sweep underneath.
    for (step, chord) in CHORDS.iter().enumerate() {
        let cutoff = 600.0 + step as f32 * 1_200.0;
        controller.submit_parameter_update(ParamUpdate {
            id: ParamId::FilterCutoff,
            value: cutoff,
        });

        for &note in chord {
            controller.submit_note_event(SynthMessage::NoteOn {
                note,
                velocity: 0.9,
            });
        }
        std::thread::sleep(Duration::from_millis(900));
        for &note in chord {
            controller.submit_note_event(SynthMessage::NoteOff { note });
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    // Arpeggio with the LFO wobbling the cutoff.
    controller.submit_parameter_update(ParamUpdate {
        id: ParamId::LfoRate,
        value: 4.0,
    });
    controller.submit_parameter_update(ParamUpdate {
        id: ParamId::LfoDepth,
        value: 0.8,
    });
    controller.submit_parameter_update(ParamUpdate {
        id: ParamId::FilterCutoff,
        value: 1_500.0,
    });

    for _ in 0..2 {
        for &note in &ARPEGGIO {
            controller.submit_note_event(SynthMessage::NoteOn {
                note,
                velocity: 1.0,
            });
            std::thread::sleep(Duration::from_millis(150));
            controller.submit_note_event(SynthMessage::NoteOff { note });
        }
    }

    controller.submit_note_event(SynthMessage::AllNotesOff);
    // Let the release tails ring out before the stream closes.
    std::thread::sleep(Duration::from_millis(800));
}
