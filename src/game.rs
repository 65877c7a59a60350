//! Game state: the note the arrow keys steer.

use crate::config::AudioConfig;

/// Keys held this frame. Mapped from real key presses by the input layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameInput {
    pub up: bool,
    pub down: bool,
    pub quit: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    note: f32,
    min_note: f32,
    note_slew: f32,
}

impl GameState {
    pub fn new(config: &AudioConfig) -> Self {
        GameState {
            note: config.initial_note.max(config.min_note),
            min_note: config.min_note,
            note_slew: config.note_slew,
        }
    }

    pub fn note(&self) -> f32 {
        self.note
    }

    /// Applies one frame of input. Up wins over Down. The note never drops below the
    /// minimum, so the tone generator always sees a positive frequency.
    /// Returns `false` once the player asked to quit.
    pub fn update(&mut self, input: &GameInput, dt: f32) -> bool {
        let growth = self.note_slew * dt;
        if input.up {
            self.note += growth;
        } else if input.down {
            self.note -= growth;
        }
        self.note = self.note.max(self.min_note);
        !input.quit
    }
}
