/// Note events handed from the control thread to the render thread.
///
/// Ephemeral, consumed once, and `Copy` so the ring buffer never allocates.
/// Velocity is normalized to [0, 1].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    NoteOn { note: u8, velocity: f32 },
    NoteOff { note: u8 },
    AllNotesOff,
}
