//! Deck control for Platter - turntables on top of an audio engine
//!
//! This crate drives an engine through the [`AudioBackend`] boundary:
//! - Deck: Track loading, transport, tempo with key-lock, levels, cue
//! - Scratch: Platter physics (direct angle or momentum) and grab detection
//! - Chain: Per-channel EQ, filter sweep and pitch-shift units
//! - Mixer: Crossfader laws
//! - Console: Two decks plus the crossfader behind a command channel

pub mod backend;
mod chain;
mod config;
mod console;
mod deck;
mod mixer;
mod params;
pub mod scratch;
mod transport;

pub use backend::{
    AudioBackend, ChannelHandle, DspHandle, DspKind, DspParam, EngineError, OpenState, SimBackend,
    SimSound, SoundFlags, SoundHandle, SoundInfo,
};
pub use chain::{DspChain, FILTER_RESONANCE};
pub use config::{DeckConfig, GrabDetection, ScratchModelKind};
pub use console::{AudioCommand, Console, ConsoleEvent, ConsoleHandle, DeckId};
pub use deck::{CoverArt, Deck, DeckEvent, DeckState, TrackStatus};
pub use mixer::{Crossfader, CrossfaderLaw};
pub use params::{
    eq_gain_db, final_volume, normalize, replay_gain_factor, EqBand, FilterSweep, EQ_RANGE_DB,
    FILTER_MIN_HZ, HIGH_PASS_MAX_HZ, LOW_PASS_MAX_HZ,
};
pub use transport::{Hold, PitchControl, PlaybackState, Transport};
