//! Music theory for Platter
//!
//! Provides Camelot wheel notation, note-name parsing, and the key/BPM
//! transposition shown on a deck when its pitch fader moves.

mod camelot;
mod transpose;

pub use camelot::{CamelotKey, MusicalKey, Spelling};
pub use transpose::{semitone_shift, transpose_bpm, transpose_key, KeyDisplay, ResolvedKey};
