//! Console - two decks, the crossfader, and command dispatch
//!
//! Input collaborators send [`AudioCommand`]s over a channel; the host drains
//! them once per frame with [`Console::drain`], then calls
//! [`Console::update`] and forwards the resulting [`ConsoleEvent`]s.

use crate::backend::AudioBackend;
use crate::config::DeckConfig;
use crate::deck::{Deck, DeckEvent, DeckState};
use crate::mixer::{Crossfader, CrossfaderLaw};
use crate::params::EqBand;
use crossbeam_channel::{bounded, Receiver, Sender};
use platter_analysis::CamelotKey;
use platter_library::TrackMetadata;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Deck identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeckId {
    A,
    B,
}

impl DeckId {
    pub fn letter(self) -> char {
        match self {
            DeckId::A => 'A',
            DeckId::B => 'B',
        }
    }
}

/// Commands sent to the console
#[derive(Debug, Clone)]
pub enum AudioCommand {
    // Track
    Load(DeckId, PathBuf),
    /// Load with metadata the library already read
    LoadWithMetadata(DeckId, PathBuf, Box<TrackMetadata>),
    Unload(DeckId),

    // Transport
    Play(DeckId),
    Start(DeckId),
    Pause(DeckId),
    Resume(DeckId),
    Stop(DeckId),
    CuePress(DeckId),
    CueRelease(DeckId),

    // Tempo
    SetPitch(DeckId, f32),
    ToggleKeyLock(DeckId),

    // Levels
    SetVolume(DeckId, f32),
    SetReplayGain(DeckId, f32),
    SetEq(DeckId, EqBand, f32),
    SetFilter(DeckId, f32),

    // Platter
    ScratchBegin(DeckId, f32),
    /// Platter angle and the time since the previous sample
    ScratchMove(DeckId, f32, f32),
    ScratchEnd(DeckId),

    // Mixer
    SetCrossfader(f32),
    CenterCrossfader,
    SetCrossfaderLaw(CrossfaderLaw),

    // System
    Shutdown,
}

/// Events published by the console
#[derive(Debug, Clone)]
pub enum ConsoleEvent {
    /// State update for UI rendering
    StateUpdate {
        deck_a: Box<DeckState>,
        deck_b: Box<DeckState>,
        crossfader: f32,
        /// Displayed keys of the two decks mix harmonically
        harmonic_match: Option<bool>,
    },
    TrackReady { deck: DeckId, title: String },
    LoadFailed { deck: DeckId, path: PathBuf, reason: String },
    TrackEnded { deck: DeckId },
}

/// Two decks and a crossfader, driven from one control thread
pub struct Console {
    pub deck_a: Deck,
    pub deck_b: Deck,
    crossfader: Crossfader,
}

impl Default for Console {
    fn default() -> Self {
        Self::new(DeckConfig::default())
    }
}

impl Console {
    pub fn new(config: DeckConfig) -> Self {
        let mut console = Self {
            crossfader: Crossfader::new(config.crossfader_law),
            deck_a: Deck::new(config.clone()),
            deck_b: Deck::new(config),
        };
        let (left, right) = console.crossfader.factors();
        console.deck_a.preset_crossfade(left);
        console.deck_b.preset_crossfade(right);
        console
    }

    pub fn deck(&self, id: DeckId) -> &Deck {
        match id {
            DeckId::A => &self.deck_a,
            DeckId::B => &self.deck_b,
        }
    }

    pub fn deck_mut(&mut self, id: DeckId) -> &mut Deck {
        match id {
            DeckId::A => &mut self.deck_a,
            DeckId::B => &mut self.deck_b,
        }
    }

    pub fn crossfader(&self) -> &Crossfader {
        &self.crossfader
    }

    /// Push the crossfader split into both decks' crossfade factors
    fn apply_crossfader(&mut self, engine: &mut dyn AudioBackend) {
        let (left, right) = self.crossfader.factors();
        self.deck_a.set_crossfade(engine, left);
        self.deck_b.set_crossfade(engine, right);
    }

    /// Process a command. Returns false for [`AudioCommand::Shutdown`].
    pub fn handle_command(&mut self, engine: &mut dyn AudioBackend, cmd: AudioCommand) -> bool {
        match cmd {
            AudioCommand::Load(id, path) => self.deck_mut(id).load(engine, &path),
            AudioCommand::LoadWithMetadata(id, path, metadata) => {
                self.deck_mut(id).load_with_metadata(engine, &path, *metadata)
            }
            AudioCommand::Unload(id) => self.deck_mut(id).unload(engine),

            AudioCommand::Play(id) => self.deck_mut(id).play(engine),
            AudioCommand::Start(id) => self.deck_mut(id).start(engine),
            AudioCommand::Pause(id) => self.deck_mut(id).pause(engine),
            AudioCommand::Resume(id) => self.deck_mut(id).resume(engine),
            AudioCommand::Stop(id) => self.deck_mut(id).stop(engine),
            AudioCommand::CuePress(id) => self.deck_mut(id).cue_press(engine),
            AudioCommand::CueRelease(id) => self.deck_mut(id).cue_release(engine),

            AudioCommand::SetPitch(id, ratio) => self.deck_mut(id).set_pitch(ratio),
            AudioCommand::ToggleKeyLock(id) => self.deck_mut(id).toggle_key_lock(engine),

            AudioCommand::SetVolume(id, volume) => self.deck_mut(id).set_base_volume(engine, volume),
            AudioCommand::SetReplayGain(id, db) => self.deck_mut(id).set_replay_gain_db(engine, db),
            AudioCommand::SetEq(id, band, knob) => self.deck_mut(id).set_eq(engine, band, knob),
            AudioCommand::SetFilter(id, knob) => self.deck_mut(id).set_filter(engine, knob),

            AudioCommand::ScratchBegin(id, angle) => self.deck_mut(id).begin_scratch(engine, angle),
            AudioCommand::ScratchMove(id, angle, dt) => {
                self.deck_mut(id).scratch_update(engine, angle, dt)
            }
            AudioCommand::ScratchEnd(id) => self.deck_mut(id).end_scratch(engine),

            AudioCommand::SetCrossfader(position) => {
                self.crossfader.set_position(position);
                self.apply_crossfader(engine);
            }
            AudioCommand::CenterCrossfader => {
                self.crossfader.center();
                self.apply_crossfader(engine);
            }
            AudioCommand::SetCrossfaderLaw(law) => {
                self.crossfader.set_law(law);
                self.apply_crossfader(engine);
            }

            AudioCommand::Shutdown => return false,
        }
        true
    }

    /// Handle every queued command. Returns false once shutdown was seen.
    pub fn drain(&mut self, engine: &mut dyn AudioBackend, commands: &Receiver<AudioCommand>) -> bool {
        while let Ok(cmd) = commands.try_recv() {
            if !self.handle_command(engine, cmd) {
                return false;
            }
        }
        true
    }

    /// Advance both decks by `dt` seconds, collecting their events
    pub fn update(&mut self, engine: &mut dyn AudioBackend, dt: f32) -> Vec<ConsoleEvent> {
        let mut events = Vec::new();
        for id in [DeckId::A, DeckId::B] {
            for event in self.deck_mut(id).update(engine, dt) {
                events.push(match event {
                    DeckEvent::TrackReady { title } => ConsoleEvent::TrackReady { deck: id, title },
                    DeckEvent::LoadFailed { path, reason } => {
                        ConsoleEvent::LoadFailed { deck: id, path, reason }
                    }
                    DeckEvent::TrackEnded => ConsoleEvent::TrackEnded { deck: id },
                });
            }
        }
        events
    }

    /// Whether the two decks' displayed keys mix harmonically; `None`
    /// unless both resolve to a Camelot code
    pub fn harmonic_match(&self) -> Option<bool> {
        let a = CamelotKey::parse(&self.deck_a.displayed_key()?.camelot)?;
        let b = CamelotKey::parse(&self.deck_b.displayed_key()?.camelot)?;
        Some(a.is_compatible(&b))
    }

    /// Generate current state for UI
    pub fn get_state(&self) -> ConsoleEvent {
        ConsoleEvent::StateUpdate {
            deck_a: Box::new(self.deck_a.state()),
            deck_b: Box::new(self.deck_b.state()),
            crossfader: self.crossfader.position(),
            harmonic_match: self.harmonic_match(),
        }
    }
}

/// Sending side of the console, held by input collaborators
#[derive(Clone)]
pub struct ConsoleHandle {
    command_tx: Sender<AudioCommand>,
    /// Shutdown flag
    shutdown: Arc<AtomicBool>,
}

impl ConsoleHandle {
    /// Create channels for console communication.
    /// Returns the handle, the command receiver for the control loop, the
    /// event sender for the control loop and the event receiver for the UI.
    pub fn create_channels() -> (
        ConsoleHandle,
        Receiver<AudioCommand>,
        Sender<ConsoleEvent>,
        Receiver<ConsoleEvent>,
    ) {
        let (cmd_tx, cmd_rx) = bounded(1024);
        let (evt_tx, evt_rx) = bounded(1024);
        let handle = ConsoleHandle {
            command_tx: cmd_tx,
            shutdown: Arc::new(AtomicBool::new(false)),
        };
        (handle, cmd_rx, evt_tx, evt_rx)
    }

    /// Send a command; dropped with a warning if the queue is full
    pub fn send(&self, cmd: AudioCommand) {
        if let Err(e) = self.command_tx.try_send(cmd) {
            tracing::warn!(error = %e, "console command dropped");
        }
    }

    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Request shutdown
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        let _ = self.command_tx.try_send(AudioCommand::Shutdown);
    }
}
