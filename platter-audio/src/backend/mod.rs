//! Audio engine boundary
//!
//! The deck never decodes or mixes audio itself. It drives an external
//! mixing engine through [`AudioBackend`]: sounds are opened from paths,
//! played on channels, and shaped by DSP units inserted on those channels.
//! Any engine offering volume, pitch, position and parametric DSP inserts
//! can sit behind this trait.
//!
//! The engine is owned by the host and passed into every deck call, so
//! decks hold handles only and stay testable against [`SimBackend`].

mod sim;

pub use sim::{SimBackend, SimSound};

use platter_library::TrackTags;
use std::path::Path;
use thiserror::Error;

/// Opaque handle to an opened sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle(pub u32);

/// Opaque handle to a playing (or paused) channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelHandle(pub u32);

/// Opaque handle to a DSP unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DspHandle(pub u32);

/// Flags for opening a sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SoundFlags {
    /// Return immediately and finish opening in the background
    pub non_blocking: bool,
    /// Decode on the fly instead of loading the whole file
    pub stream: bool,
}

impl SoundFlags {
    /// Flags used by decks: asynchronous, streamed
    pub const DECK: Self = Self {
        non_blocking: true,
        stream: true,
    };
}

/// Loading state of a sound opened with `non_blocking`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenState {
    Loading,
    Ready,
    Failed,
}

/// Format facts about a ready sound
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundInfo {
    pub length_ms: f64,
    pub sample_rate: u32,
}

impl SoundInfo {
    /// Total length in sample frames
    pub fn total_samples(&self) -> f64 {
        self.length_ms * self.sample_rate as f64 / 1000.0
    }
}

/// DSP unit types the deck inserts on its channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DspKind {
    /// Three-band shelving/peaking EQ
    ThreeBandEq,
    LowPass,
    HighPass,
    /// Formant-preserving pitch shifter
    PitchShift,
}

/// DSP parameters written by the deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DspParam {
    LowGainDb,
    MidGainDb,
    HighGainDb,
    /// Filter cutoff in Hz
    Cutoff,
    /// Filter resonance (Q)
    Resonance,
    /// Pitch shift in semitones (0 = neutral)
    PitchSemitones,
}

/// Errors reported by the audio engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Failed to open sound {path}: {reason}")]
    OpenFailed { path: String, reason: String },
    #[error("Sound is not ready")]
    NotReady,
    #[error("Invalid handle")]
    InvalidHandle,
    #[error("Failed to create DSP {0:?}")]
    DspCreateFailed(DspKind),
}

/// Control interface of an external mixing engine.
///
/// Parameter writes are fire-and-forget from the caller's point of view;
/// errors come back for logging but never block.
pub trait AudioBackend {
    /// Open a sound; with `non_blocking` the handle is returned while the
    /// file is still loading
    fn create_sound(&mut self, path: &Path, flags: SoundFlags) -> Result<SoundHandle, EngineError>;

    fn open_state(&self, sound: SoundHandle) -> OpenState;

    /// Length and sample rate, available once the sound is ready
    fn sound_info(&self, sound: SoundHandle) -> Result<SoundInfo, EngineError>;

    /// Embedded tags, available once the sound is ready
    fn tags(&self, sound: SoundHandle) -> Option<TrackTags>;

    fn release_sound(&mut self, sound: SoundHandle);

    /// Start a channel for `sound` at position 0
    fn play(&mut self, sound: SoundHandle, paused: bool) -> Result<ChannelHandle, EngineError>;

    /// Stop and free a channel
    fn stop(&mut self, channel: ChannelHandle);

    /// Whether the channel is still alive (false once it ran off the end)
    fn is_playing(&self, channel: ChannelHandle) -> bool;

    fn set_paused(&mut self, channel: ChannelHandle, paused: bool) -> Result<(), EngineError>;

    fn set_volume(&mut self, channel: ChannelHandle, volume: f32) -> Result<(), EngineError>;

    /// Playback rate; 1.0 = nominal speed and pitch
    fn set_pitch(&mut self, channel: ChannelHandle, pitch: f32) -> Result<(), EngineError>;

    fn set_position(&mut self, channel: ChannelHandle, position_ms: f64) -> Result<(), EngineError>;

    fn position(&self, channel: ChannelHandle) -> Result<f64, EngineError>;

    fn create_dsp(&mut self, kind: DspKind) -> Result<DspHandle, EngineError>;

    fn set_dsp_parameter(&mut self, dsp: DspHandle, param: DspParam, value: f32) -> Result<(), EngineError>;

    fn set_dsp_bypass(&mut self, dsp: DspHandle, bypass: bool) -> Result<(), EngineError>;

    fn add_dsp(&mut self, channel: ChannelHandle, dsp: DspHandle) -> Result<(), EngineError>;

    fn release_dsp(&mut self, dsp: DspHandle);
}

/// Log a failed fire-and-forget engine write
pub(crate) fn log_write(what: &'static str, result: Result<(), EngineError>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "engine {} failed", what);
    }
}
