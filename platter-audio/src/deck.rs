//! Deck implementation - one turntable driving an engine channel
//!
//! The deck owns handles only. Every operation takes the engine explicitly,
//! writes parameters fire-and-forget, and never blocks: loading is polled
//! from [`Deck::update`], which the host calls once per frame.

use crate::backend::{
    log_write, AudioBackend, ChannelHandle, OpenState, SoundFlags, SoundHandle, SoundInfo,
};
use crate::chain::DspChain;
use crate::config::DeckConfig;
use crate::params::{eq_gain_db, final_volume, normalize, replay_gain_factor, EqBand, FilterSweep};
use crate::scratch::{self, Coast, GrabDetector, GrabSignal, ScratchModel};
use crate::transport::{Hold, PitchControl, PlaybackState, Transport};
use platter_analysis::KeyDisplay;
use platter_library::TrackMetadata;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the loaded track is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackStatus {
    #[default]
    Empty,
    Loading,
    Ready,
    Failed,
}

/// Cover art for the loaded track
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CoverArt {
    /// No track loaded
    #[default]
    None,
    /// Waiting for embedded art from the engine
    Pending,
    /// Picture embedded in the audio file
    Embedded(Arc<[u8]>),
    /// Image file named by the sidecar
    File(PathBuf),
    /// Nothing arrived in time; show the stock sleeve
    Default,
}

/// Something the host should hear about
#[derive(Debug, Clone, PartialEq)]
pub enum DeckEvent {
    TrackReady { title: String },
    LoadFailed { path: PathBuf, reason: String },
    /// Playback ran off the end of the track
    TrackEnded,
}

/// Complete deck state for UI rendering
#[derive(Debug, Clone, Default)]
pub struct DeckState {
    pub status: TrackStatus,
    pub playback: PlaybackState,
    pub scratching: bool,
    pub cue_held: bool,
    pub position_ms: f64,
    pub duration_ms: f64,
    /// Tempo fader target
    pub target_pitch: f32,
    /// Smoothed tempo ratio
    pub pitch: f32,
    pub key_lock: bool,
    pub semitone_shift: f32,
    pub base_volume: f32,
    pub crossfade: f32,
    pub replay_gain_db: f32,
    /// Volume as sent to the engine
    pub volume: f32,
    /// Low/mid/high gains in dB
    pub eq_db: [f32; 3],
    pub filter_knob: f32,
    pub cue_point_ms: f64,
    pub bpm: Option<u32>,
    pub key: Option<KeyDisplay>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub cover: CoverArt,
    /// Platter angle in degrees
    pub platter_angle: f32,
}

/// A single turntable deck
pub struct Deck {
    config: DeckConfig,

    // Track
    path: Option<PathBuf>,
    sound: Option<SoundHandle>,
    status: TrackStatus,
    info: Option<SoundInfo>,
    metadata: Option<Arc<TrackMetadata>>,
    /// Load failure waiting to be reported by `update`
    failure: Option<String>,

    // Channel
    channel: Option<ChannelHandle>,
    chain: DspChain,

    // Transport
    transport: Transport,
    pitch: PitchControl,
    /// Last known position; where playback starts when there is no channel
    position_ms: f64,
    cue_point_ms: f64,

    // Levels (knob values are kept normalized)
    base_volume: f32,
    crossfade: f32,
    replay_gain_db: f32,
    eq_knobs: [f32; 3],
    filter_knob: f32,

    // Platter
    scratch: Box<dyn ScratchModel>,
    grab: Box<dyn GrabDetector>,
    platter_angle: f32,

    cover: CoverArt,
    cover_wait: f32,
}

impl Default for Deck {
    fn default() -> Self {
        Self::new(DeckConfig::default())
    }
}

impl Deck {
    pub fn new(mut config: DeckConfig) -> Self {
        config.sanitize();
        Self {
            pitch: PitchControl::new(config.min_pitch, config.max_pitch, config.pitch_smoothing),
            scratch: scratch::model_for(&config),
            grab: scratch::detector_for(&config),
            config,
            path: None,
            sound: None,
            status: TrackStatus::Empty,
            info: None,
            metadata: None,
            failure: None,
            channel: None,
            chain: DspChain::new(),
            transport: Transport::new(),
            position_ms: 0.0,
            cue_point_ms: 0.0,
            base_volume: 1.0,
            crossfade: 1.0,
            replay_gain_db: 0.0,
            eq_knobs: [0.5; 3],
            filter_knob: 0.5,
            platter_angle: 0.0,
            cover: CoverArt::None,
            cover_wait: 0.0,
        }
    }

    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Load a track, reading its sidecar if there is one
    pub fn load(&mut self, engine: &mut dyn AudioBackend, path: &Path) {
        let metadata = TrackMetadata::load_for(path);
        self.load_with_metadata(engine, path, metadata);
    }

    /// Load a track with metadata the caller already has.
    ///
    /// Releases whatever was loaded, then asks the engine for a
    /// non-blocking open. Readiness is picked up by [`Deck::update`].
    pub fn load_with_metadata(
        &mut self,
        engine: &mut dyn AudioBackend,
        path: &Path,
        metadata: TrackMetadata,
    ) {
        self.unload(engine);

        let sound = match engine.create_sound(path, SoundFlags::DECK) {
            Ok(sound) => sound,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not open track");
                self.path = Some(path.to_path_buf());
                self.status = TrackStatus::Failed;
                self.failure = Some(e.to_string());
                return;
            }
        };

        tracing::info!(path = %path.display(), title = %metadata.title, "loading track");
        if let Some(db) = metadata.replay_gain_db {
            self.replay_gain_db = db;
        }
        self.cover = match metadata.cover.as_deref() {
            Some(name) => CoverArt::File(
                path.parent()
                    .map(|dir| dir.join(name))
                    .unwrap_or_else(|| PathBuf::from(name)),
            ),
            None => CoverArt::Pending,
        };
        self.path = Some(path.to_path_buf());
        self.sound = Some(sound);
        self.status = TrackStatus::Loading;
        self.metadata = Some(Arc::new(metadata));
    }

    /// Stop playback and release every engine resource the deck holds.
    ///
    /// Tempo target, key-lock and level settings survive.
    pub fn unload(&mut self, engine: &mut dyn AudioBackend) {
        self.release_channel(engine);
        if let Some(sound) = self.sound.take() {
            engine.release_sound(sound);
        }
        self.path = None;
        self.status = TrackStatus::Empty;
        self.info = None;
        self.metadata = None;
        self.failure = None;
        self.transport.reset();
        self.scratch.cancel();
        self.position_ms = 0.0;
        self.cue_point_ms = 0.0;
        self.replay_gain_db = 0.0;
        self.cover = CoverArt::None;
        self.cover_wait = 0.0;
    }

    fn release_channel(&mut self, engine: &mut dyn AudioBackend) {
        self.chain.release(engine);
        if let Some(channel) = self.channel.take() {
            engine.stop(channel);
        }
    }

    fn on_ready(&mut self, engine: &mut dyn AudioBackend, sound: SoundHandle) -> Option<DeckEvent> {
        let info = match engine.sound_info(sound) {
            Ok(info) => info,
            Err(e) => return self.fail_load(engine, e.to_string()),
        };
        self.info = Some(info);
        self.status = TrackStatus::Ready;

        if let (Some(tags), Some(path)) = (engine.tags(sound), self.path.clone()) {
            if let Some(metadata) = self.metadata.as_mut() {
                let sidecar_gain = metadata.replay_gain_db;
                Arc::make_mut(metadata).merge_tags(&tags, &path);
                if sidecar_gain.is_none() {
                    if let Some(db) = metadata.replay_gain_db {
                        self.replay_gain_db = db;
                    }
                }
            }
        }

        let title = self
            .metadata
            .as_ref()
            .map(|m| m.title.clone())
            .unwrap_or_default();
        tracing::info!(%title, length_ms = info.length_ms, "track ready");

        if self.transport.pending_start() {
            self.transport.set_pending_start(false);
            self.start(engine);
        }

        Some(DeckEvent::TrackReady { title })
    }

    fn fail_load(&mut self, engine: &mut dyn AudioBackend, reason: String) -> Option<DeckEvent> {
        let path = self.path.clone().unwrap_or_default();
        tracing::warn!(path = %path.display(), %reason, "track failed to load");
        if let Some(sound) = self.sound.take() {
            engine.release_sound(sound);
        }
        self.status = TrackStatus::Failed;
        self.transport.reset();
        self.cover = CoverArt::None;
        Some(DeckEvent::LoadFailed { path, reason })
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    /// Play button: start, pause or resume depending on state
    pub fn play(&mut self, engine: &mut dyn AudioBackend) {
        if self.transport.pending_start() {
            self.transport.set_pending_start(false);
            return;
        }
        match self.transport.state() {
            PlaybackState::Stopped => self.start(engine),
            PlaybackState::Playing => self.pause(engine),
            PlaybackState::Paused => self.resume(engine),
        }
    }

    /// Start playback from the current position.
    ///
    /// While the track is still loading the start is deferred until it is
    /// ready. A paused deck resumes.
    pub fn start(&mut self, engine: &mut dyn AudioBackend) {
        match self.status {
            TrackStatus::Empty | TrackStatus::Failed => return,
            TrackStatus::Loading => {
                tracing::debug!("start deferred until track is ready");
                self.transport.set_pending_start(true);
                return;
            }
            TrackStatus::Ready => {}
        }
        if self.channel.is_some() {
            self.resume(engine);
            return;
        }
        if self.open_channel(engine) {
            self.set_channel_paused(engine, false);
            self.transport.set_state(PlaybackState::Playing);
        }
    }

    pub fn pause(&mut self, engine: &mut dyn AudioBackend) {
        if self.transport.state() != PlaybackState::Playing {
            return;
        }
        if !self.transport.is_held() {
            self.set_channel_paused(engine, true);
        }
        self.transport.set_state(PlaybackState::Paused);
    }

    pub fn resume(&mut self, engine: &mut dyn AudioBackend) {
        if self.transport.state() != PlaybackState::Paused || self.channel.is_none() {
            return;
        }
        if !self.transport.is_held() {
            self.set_channel_paused(engine, false);
        }
        self.transport.set_state(PlaybackState::Playing);
    }

    /// Halt playback and return to the start of the track
    pub fn stop(&mut self, engine: &mut dyn AudioBackend) {
        if self.sound.is_none() {
            return;
        }
        self.release_channel(engine);
        self.transport.reset();
        self.scratch.cancel();
        self.position_ms = 0.0;
        self.replay_gain_db = 0.0;
    }

    /// Create a paused channel with the full parameter chain applied
    fn open_channel(&mut self, engine: &mut dyn AudioBackend) -> bool {
        let (Some(sound), Some(info)) = (self.sound, self.info) else {
            return false;
        };
        let channel = match engine.play(sound, true) {
            Ok(channel) => channel,
            Err(e) => {
                tracing::warn!(error = %e, "could not start channel");
                return false;
            }
        };
        self.channel = Some(channel);
        self.chain.attach(engine, channel);
        self.scratch.calibrate(info.length_ms, info.sample_rate);
        if self.position_ms > 0.0 {
            log_write("seek", engine.set_position(channel, self.position_ms));
        }
        self.apply_all(engine);
        true
    }

    /// Make sure a channel exists, opening a paused one if needed
    fn ensure_channel(&mut self, engine: &mut dyn AudioBackend) -> bool {
        if self.channel.is_some() {
            return true;
        }
        if self.status != TrackStatus::Ready || !self.open_channel(engine) {
            return false;
        }
        self.transport.set_state(PlaybackState::Paused);
        true
    }

    fn set_channel_paused(&self, engine: &mut dyn AudioBackend, paused: bool) {
        if let Some(channel) = self.channel {
            log_write("pause", engine.set_paused(channel, paused));
        }
    }

    fn seek(&mut self, engine: &mut dyn AudioBackend, position_ms: f64) {
        self.position_ms = position_ms;
        if let Some(channel) = self.channel {
            log_write("seek", engine.set_position(channel, position_ms));
        }
    }

    /// Hand the channel back to the state a hold interrupted
    fn restore(&mut self, engine: &mut dyn AudioBackend, state: PlaybackState) {
        self.set_channel_paused(engine, state != PlaybackState::Playing);
        self.push_pitch(engine);
    }

    pub fn is_playing(&self) -> bool {
        self.transport.state() == PlaybackState::Playing
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.transport.state()
    }

    pub fn status(&self) -> TrackStatus {
        self.status
    }

    /// Live playback position from the engine
    pub fn track_position_ms(&self, engine: &dyn AudioBackend) -> f64 {
        self.channel
            .and_then(|channel| engine.position(channel).ok())
            .unwrap_or(self.position_ms)
    }

    pub fn duration_ms(&self) -> f64 {
        self.info.map(|i| i.length_ms).unwrap_or(0.0)
    }

    // ------------------------------------------------------------------
    // Tempo
    // ------------------------------------------------------------------

    /// Set the tempo fader; the engine follows smoothly on each update
    pub fn set_pitch(&mut self, ratio: f32) {
        self.pitch.set_target(ratio);
    }

    pub fn target_pitch(&self) -> f32 {
        self.pitch.target()
    }

    /// Smoothed tempo ratio
    pub fn current_pitch(&self) -> f32 {
        self.pitch.current()
    }

    pub fn key_lock(&self) -> bool {
        self.pitch.key_lock()
    }

    pub fn toggle_key_lock(&mut self, engine: &mut dyn AudioBackend) {
        let enabled = !self.pitch.key_lock();
        self.pitch.set_key_lock(enabled);
        tracing::debug!(enabled, base = self.pitch.base(), "key lock");
        self.push_pitch(engine);
    }

    fn push_pitch(&self, engine: &mut dyn AudioBackend) {
        let Some(channel) = self.channel else {
            return;
        };
        let (rate, shift) = if self.transport.is_held() {
            (1.0, 0.0)
        } else {
            (self.pitch.channel_pitch(), self.pitch.semitone_shift())
        };
        log_write("set pitch", engine.set_pitch(channel, rate));
        self.chain.apply_pitch_shift(engine, shift);
    }

    /// Ratio the listener hears the key at
    fn key_ratio(&self) -> f64 {
        if self.pitch.key_lock() && self.pitch.base() > 0.0 {
            (self.pitch.current() / self.pitch.base()) as f64
        } else {
            self.pitch.current() as f64
        }
    }

    /// BPM at the current tempo
    pub fn displayed_bpm(&self) -> Option<u32> {
        let metadata = self.metadata.as_ref()?;
        metadata.displayed_bpm(self.pitch.channel_pitch() as f64)
    }

    /// Key and Camelot code at the current pitch
    pub fn displayed_key(&self) -> Option<KeyDisplay> {
        let metadata = self.metadata.as_ref()?;
        if metadata.initial_key.is_none() && metadata.camelot.is_none() {
            return None;
        }
        Some(metadata.displayed_key(self.key_ratio()))
    }

    // ------------------------------------------------------------------
    // Levels
    // ------------------------------------------------------------------

    pub fn set_base_volume(&mut self, engine: &mut dyn AudioBackend, volume: f32) {
        self.base_volume = normalize(volume);
        self.push_volume(engine);
    }

    pub fn set_crossfade(&mut self, engine: &mut dyn AudioBackend, factor: f32) {
        self.crossfade = normalize(factor);
        self.push_volume(engine);
    }

    /// Crossfade factor for a deck that has no channel yet
    pub(crate) fn preset_crossfade(&mut self, factor: f32) {
        self.crossfade = normalize(factor);
    }

    pub fn set_replay_gain_db(&mut self, engine: &mut dyn AudioBackend, db: f32) {
        if !db.is_finite() {
            tracing::warn!(db, "ignoring non-finite replaygain");
            self.replay_gain_db = 0.0;
        } else {
            self.replay_gain_db = db;
        }
        self.push_volume(engine);
    }

    /// Volume as sent to the engine
    pub fn volume(&self) -> f32 {
        final_volume(
            self.base_volume,
            self.crossfade,
            replay_gain_factor(self.replay_gain_db),
        )
    }

    fn push_volume(&self, engine: &mut dyn AudioBackend) {
        if let Some(channel) = self.channel {
            log_write("set volume", engine.set_volume(channel, self.volume()));
        }
    }

    pub fn set_eq(&mut self, engine: &mut dyn AudioBackend, band: EqBand, knob: f32) {
        self.eq_knobs[band.index()] = normalize(knob);
        self.chain.apply_eq(engine, self.eq_db());
    }

    pub fn set_eq_low(&mut self, engine: &mut dyn AudioBackend, knob: f32) {
        self.set_eq(engine, EqBand::Low, knob);
    }

    pub fn set_eq_mid(&mut self, engine: &mut dyn AudioBackend, knob: f32) {
        self.set_eq(engine, EqBand::Mid, knob);
    }

    pub fn set_eq_high(&mut self, engine: &mut dyn AudioBackend, knob: f32) {
        self.set_eq(engine, EqBand::High, knob);
    }

    fn eq_db(&self) -> [f32; 3] {
        self.eq_knobs.map(eq_gain_db)
    }

    /// Filter sweep knob: centre is off, left low-pass, right high-pass
    pub fn set_filter(&mut self, engine: &mut dyn AudioBackend, knob: f32) {
        self.filter_knob = normalize(knob);
        self.chain
            .apply_filter(engine, FilterSweep::from_knob(self.filter_knob));
    }

    fn apply_all(&self, engine: &mut dyn AudioBackend) {
        self.push_volume(engine);
        self.push_pitch(engine);
        self.chain.apply_eq(engine, self.eq_db());
        self.chain
            .apply_filter(engine, FilterSweep::from_knob(self.filter_knob));
    }

    // ------------------------------------------------------------------
    // Scratching
    // ------------------------------------------------------------------

    /// Hand touches the platter
    pub fn begin_scratch(&mut self, engine: &mut dyn AudioBackend, angle: f32) {
        if let Some(signal) = self.grab.on_touch(angle) {
            self.apply_grab(engine, signal);
        }
    }

    /// Platter angle sample; with motion detection this alone can start and
    /// end a scratch
    pub fn scratch_update(&mut self, engine: &mut dyn AudioBackend, angle: f32, dt: f32) {
        if let Some(signal) = self.grab.on_angle(angle, dt) {
            self.apply_grab(engine, signal);
        }
    }

    /// Hand leaves the platter
    pub fn end_scratch(&mut self, engine: &mut dyn AudioBackend) {
        if let Some(signal) = self.grab.on_release() {
            self.apply_grab(engine, signal);
        }
    }

    pub fn is_scratching(&self) -> bool {
        self.transport.is_scratching()
    }

    fn apply_grab(&mut self, engine: &mut dyn AudioBackend, signal: GrabSignal) {
        match signal {
            GrabSignal::Begin { angle } => {
                self.platter_angle = angle;
                if self.transport.is_scratching() {
                    // Caught again while still coasting
                    let position = self.track_position_ms(engine);
                    self.scratch.begin(angle, position);
                    return;
                }
                if !self.ensure_channel(engine) || !self.transport.enter(Hold::Scratch) {
                    return;
                }
                let position = self.track_position_ms(engine);
                self.scratch.begin(angle, position);
                self.set_channel_paused(engine, false);
                self.push_pitch(engine);
            }
            GrabSignal::Move { angle, dt } => {
                self.platter_angle = angle;
                if !self.transport.is_scratching() {
                    return;
                }
                let position = self.scratch.update(angle, dt);
                self.hold_at(engine, position);
            }
            GrabSignal::End { release_velocity } => {
                if !self.transport.is_scratching() {
                    return;
                }
                self.scratch.end(release_velocity);
                match self.scratch.coast(0.0) {
                    Coast::Idle => {
                        let position = self.scratch.position_ms();
                        self.finish_scratch(engine, position, false);
                    }
                    Coast::Settled { position_ms } => self.finish_scratch(engine, position_ms, true),
                    Coast::Spinning { .. } => {}
                }
            }
        }
    }

    /// Seek a held channel; it rests at the last frame instead of running
    /// off the end
    fn hold_at(&mut self, engine: &mut dyn AudioBackend, position_ms: f64) {
        self.seek(engine, position_ms);
        let at_end = self.info.is_some() && position_ms >= self.duration_ms();
        self.set_channel_paused(engine, at_end);
    }

    /// A held channel ran off the end: reopen it paused on the last frame
    /// so the hold keeps its place. False if the channel cannot be reopened.
    fn park_at_end(&mut self, engine: &mut dyn AudioBackend) -> bool {
        self.release_channel(engine);
        self.position_ms = self.duration_ms();
        if !self.open_channel(engine) {
            return false;
        }
        tracing::debug!(position_ms = self.position_ms, "held at end of track");
        true
    }

    fn finish_scratch(&mut self, engine: &mut dyn AudioBackend, position_ms: f64, coasted: bool) {
        self.seek(engine, position_ms);
        let Some(mut state) = self.transport.exit(Hold::Scratch) else {
            return;
        };
        if coasted && !self.config.motor_enabled && state == PlaybackState::Playing {
            // No motor to pick the record back up
            self.transport.set_state(PlaybackState::Paused);
            state = PlaybackState::Paused;
        }
        self.restore(engine, state);
    }

    // ------------------------------------------------------------------
    // Cue
    // ------------------------------------------------------------------

    /// Cue button down.
    ///
    /// From Stopped or Paused the current position becomes the cue point;
    /// from Playing the stored cue point is used. Playback previews from the
    /// cue point while the button is held.
    pub fn cue_press(&mut self, engine: &mut dyn AudioBackend) {
        if self.transport.is_held() || !self.ensure_channel(engine) {
            return;
        }
        if self.transport.state() == PlaybackState::Paused {
            self.cue_point_ms = self.track_position_ms(engine);
        }
        if !self.transport.enter(Hold::Cue) {
            return;
        }
        tracing::debug!(cue_ms = self.cue_point_ms, "cue preview");
        self.seek(engine, self.cue_point_ms);
        self.set_channel_paused(engine, false);
        self.push_pitch(engine);
    }

    /// Cue button up: back to the cue point, in the state the press
    /// interrupted
    pub fn cue_release(&mut self, engine: &mut dyn AudioBackend) {
        let Some(state) = self.transport.exit(Hold::Cue) else {
            return;
        };
        self.seek(engine, self.cue_point_ms);
        self.restore(engine, state);
    }

    pub fn cue_point_ms(&self) -> f64 {
        self.cue_point_ms
    }

    pub fn is_cue_held(&self) -> bool {
        self.transport.is_cue_held()
    }

    // ------------------------------------------------------------------
    // Per-frame update
    // ------------------------------------------------------------------

    /// Advance the deck by `dt` seconds: poll loading and cover art, run
    /// platter coasting, smooth the tempo and push it to the engine.
    /// Returns everything that happened this tick, in order.
    pub fn update(&mut self, engine: &mut dyn AudioBackend, dt: f32) -> Vec<DeckEvent> {
        let mut events = Vec::new();

        if let Some(reason) = self.failure.take() {
            events.push(DeckEvent::LoadFailed {
                path: self.path.clone().unwrap_or_default(),
                reason,
            });
        }

        if self.status == TrackStatus::Loading {
            if let Some(sound) = self.sound {
                let event = match engine.open_state(sound) {
                    OpenState::Loading => None,
                    OpenState::Ready => self.on_ready(engine, sound),
                    OpenState::Failed => self.fail_load(engine, "decode failed".to_string()),
                };
                events.extend(event);
            }
        }

        self.poll_cover(engine, dt);

        if let Some(channel) = self.channel {
            if !engine.is_playing(channel) && !(self.transport.is_held() && self.park_at_end(engine)) {
                tracing::debug!("track ended");
                self.release_channel(engine);
                self.transport.reset();
                self.scratch.cancel();
                self.position_ms = 0.0;
                events.push(DeckEvent::TrackEnded);
                return events;
            }
        }

        if self.transport.is_scratching() && !self.grab.is_grabbed() {
            match self.scratch.coast(dt) {
                Coast::Idle => {}
                Coast::Spinning { position_ms } => {
                    self.platter_angle =
                        (self.platter_angle + self.scratch.velocity() * dt).rem_euclid(360.0);
                    self.hold_at(engine, position_ms);
                }
                Coast::Settled { position_ms } => self.finish_scratch(engine, position_ms, true),
            }
        }

        if !self.transport.is_held() {
            self.pitch.tick(dt);
            if self.is_playing() {
                let rate = self.pitch.channel_pitch();
                self.platter_angle =
                    (self.platter_angle + self.config.motor_rate * rate * dt).rem_euclid(360.0);
            }
        }
        self.push_pitch(engine);

        if let Some(channel) = self.channel {
            if let Ok(position) = engine.position(channel) {
                self.position_ms = position;
            }
        }

        events
    }

    fn poll_cover(&mut self, engine: &dyn AudioBackend, dt: f32) {
        if self.cover != CoverArt::Pending {
            return;
        }
        if self.status == TrackStatus::Ready {
            if let Some(picture) = self.sound.and_then(|s| engine.tags(s)).and_then(|t| t.picture()) {
                self.cover = CoverArt::Embedded(picture);
                return;
            }
        }
        self.cover_wait += dt.max(0.0);
        if self.cover_wait >= self.config.cover_timeout_secs {
            tracing::warn!(waited = self.cover_wait, "no cover art, using default");
            self.cover = CoverArt::Default;
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn metadata(&self) -> Option<&Arc<TrackMetadata>> {
        self.metadata.as_ref()
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata.as_ref().map(|m| m.title.as_str())
    }

    pub fn artist(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.artist.as_deref())
    }

    pub fn cover(&self) -> &CoverArt {
        &self.cover
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn channel(&self) -> Option<ChannelHandle> {
        self.channel
    }

    pub fn dsp_chain(&self) -> &DspChain {
        &self.chain
    }

    /// Snapshot for UI rendering
    pub fn state(&self) -> DeckState {
        DeckState {
            status: self.status,
            playback: self.transport.state(),
            scratching: self.transport.is_scratching(),
            cue_held: self.transport.is_cue_held(),
            position_ms: self.position_ms,
            duration_ms: self.duration_ms(),
            target_pitch: self.pitch.target(),
            pitch: self.pitch.current(),
            key_lock: self.pitch.key_lock(),
            semitone_shift: self.pitch.semitone_shift(),
            base_volume: self.base_volume,
            crossfade: self.crossfade,
            replay_gain_db: self.replay_gain_db,
            volume: self.volume(),
            eq_db: self.eq_db(),
            filter_knob: self.filter_knob,
            cue_point_ms: self.cue_point_ms,
            bpm: self.displayed_bpm(),
            key: self.displayed_key(),
            title: self.title().map(str::to_string),
            artist: self.artist().map(str::to_string),
            cover: self.cover.clone(),
            platter_angle: self.platter_angle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DspParam, SimBackend, SimSound};
    use crate::config::{GrabDetection, ScratchModelKind};
    use platter_library::TrackTags;

    const FRAME: f32 = 1.0 / 60.0;
    const TRACK: &str = "/music/track.ogg";

    fn engine() -> SimBackend {
        let mut engine = SimBackend::new();
        engine.register(TRACK, SimSound::new(60_000.0).with_load_ticks(2));
        engine
    }

    fn metadata() -> TrackMetadata {
        TrackMetadata {
            bpm: Some(128),
            initial_key: Some("Am".into()),
            ..TrackMetadata::from_path(Path::new(TRACK))
        }
    }

    /// Deck with the track loaded and ready
    fn ready_deck(engine: &mut SimBackend, config: DeckConfig) -> Deck {
        let mut deck = Deck::new(config);
        deck.load_with_metadata(engine, Path::new(TRACK), metadata());
        for _ in 0..3 {
            engine.advance(FRAME);
            deck.update(engine, FRAME);
        }
        assert_eq!(deck.status(), TrackStatus::Ready);
        deck
    }

    fn tick(deck: &mut Deck, engine: &mut SimBackend, frames: usize) {
        for _ in 0..frames {
            engine.advance(FRAME);
            deck.update(engine, FRAME);
        }
    }

    #[test]
    fn test_unloaded_deck_is_inert() {
        let mut engine = engine();
        let mut deck = Deck::default();
        deck.play(&mut engine);
        deck.stop(&mut engine);
        deck.cue_press(&mut engine);
        deck.begin_scratch(&mut engine, 0.0);
        assert_eq!(deck.playback_state(), PlaybackState::Stopped);
        assert_eq!(engine.live_channels(), 0);
        assert!(deck.update(&mut engine, FRAME).is_empty());
    }

    #[test]
    fn test_load_reports_ready() {
        let mut engine = engine();
        let mut deck = Deck::default();
        deck.load_with_metadata(&mut engine, Path::new(TRACK), metadata());
        assert_eq!(deck.status(), TrackStatus::Loading);

        engine.advance(FRAME);
        assert!(deck.update(&mut engine, FRAME).is_empty());
        engine.advance(FRAME);
        assert_eq!(
            deck.update(&mut engine, FRAME),
            vec![DeckEvent::TrackReady {
                title: "track".into()
            }]
        );
        assert_eq!(deck.duration_ms(), 60_000.0);
    }

    #[test]
    fn test_open_failure_leaves_deck_unloaded() {
        let mut engine = engine();
        let mut deck = Deck::default();
        deck.load(&mut engine, Path::new("/music/missing.ogg"));
        assert_eq!(deck.status(), TrackStatus::Failed);
        assert!(matches!(
            deck.update(&mut engine, FRAME).as_slice(),
            [DeckEvent::LoadFailed { .. }]
        ));
        deck.play(&mut engine);
        assert_eq!(engine.live_channels(), 0);
    }

    #[test]
    fn test_async_failure_releases_sound() {
        let mut engine = SimBackend::new();
        engine.register(TRACK, SimSound::new(1000.0).with_load_ticks(1).failing());
        let mut deck = Deck::default();
        deck.load(&mut engine, Path::new(TRACK));
        engine.advance(FRAME);
        assert!(matches!(
            deck.update(&mut engine, FRAME).as_slice(),
            [DeckEvent::LoadFailed { .. }]
        ));
        assert_eq!(engine.live_sounds(), 0);
    }

    #[test]
    fn test_new_load_releases_old_resources() {
        let mut engine = engine();
        engine.register("/music/other.ogg", SimSound::new(30_000.0));
        let mut deck = ready_deck(&mut engine, DeckConfig::default());
        deck.start(&mut engine);
        assert_eq!(engine.live_channels(), 1);
        assert_eq!(engine.live_dsps(), 4);

        deck.load(&mut engine, Path::new("/music/other.ogg"));
        assert_eq!(engine.live_sounds(), 1);
        assert_eq!(engine.live_channels(), 0);
        assert_eq!(engine.live_dsps(), 0);
        assert_eq!(deck.playback_state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_start_while_loading_is_deferred() {
        let mut engine = engine();
        let mut deck = Deck::default();
        deck.load_with_metadata(&mut engine, Path::new(TRACK), metadata());
        deck.start(&mut engine);
        assert_eq!(engine.live_channels(), 0);

        tick(&mut deck, &mut engine, 3);
        assert!(deck.is_playing());
        assert_eq!(engine.live_channels(), 1);
    }

    #[test]
    fn test_play_toggles() {
        let mut engine = engine();
        let mut deck = ready_deck(&mut engine, DeckConfig::default());
        deck.play(&mut engine);
        assert_eq!(deck.playback_state(), PlaybackState::Playing);
        let channel = deck.channel().unwrap();
        assert_eq!(engine.channel_paused(channel), Some(false));

        deck.play(&mut engine);
        assert_eq!(deck.playback_state(), PlaybackState::Paused);
        assert_eq!(engine.channel_paused(channel), Some(true));

        deck.play(&mut engine);
        assert_eq!(deck.playback_state(), PlaybackState::Playing);
        assert_eq!(engine.channel_paused(channel), Some(false));
    }

    #[test]
    fn test_start_applies_full_chain() {
        let mut engine = engine();
        let mut deck = ready_deck(&mut engine, DeckConfig::default());
        deck.set_base_volume(&mut engine, 0.5);
        deck.set_eq_low(&mut engine, 0.0);
        deck.set_filter(&mut engine, 1.0);
        deck.start(&mut engine);

        let channel = deck.channel().unwrap();
        assert_eq!(engine.channel_volume(channel), Some(0.5));
        let eq = deck.dsp_chain().eq().unwrap();
        assert_eq!(engine.dsp_parameter(eq, DspParam::LowGainDb), Some(-12.0));
        let hp = deck.dsp_chain().high_pass().unwrap();
        assert_eq!(engine.dsp_bypassed(hp), Some(false));
        assert_eq!(engine.dsp_parameter(hp, DspParam::Cutoff), Some(4000.0));
    }

    #[test]
    fn test_volume_chain() {
        let mut engine = engine();
        let mut deck = ready_deck(&mut engine, DeckConfig::default());
        deck.start(&mut engine);
        let channel = deck.channel().unwrap();

        deck.set_base_volume(&mut engine, 0.8);
        deck.set_crossfade(&mut engine, 0.5);
        deck.set_replay_gain_db(&mut engine, 6.0);
        let expected = 0.8 * 0.5 * 10f32.powf(6.0 / 20.0);
        assert!((engine.channel_volume(channel).unwrap() - expected).abs() < 1e-5);

        deck.set_base_volume(&mut engine, 3.0);
        deck.set_crossfade(&mut engine, -1.0);
        assert_eq!(engine.channel_volume(channel), Some(0.0));
    }

    #[test]
    fn test_sidecar_replay_gain_applied_on_load() {
        let mut engine = engine();
        let mut deck = Deck::default();
        let meta = TrackMetadata {
            replay_gain_db: Some(-6.0),
            ..metadata()
        };
        deck.load_with_metadata(&mut engine, Path::new(TRACK), meta);
        assert!((deck.volume() - 0.501).abs() < 0.001);
    }

    #[test]
    fn test_tag_replay_gain_and_cover() {
        let mut tags = TrackTags::default();
        tags.insert("REPLAYGAIN_TRACK_GAIN", "-6 dB");
        tags.set_picture(vec![1u8, 2, 3]);
        let mut engine = SimBackend::new();
        engine.register(TRACK, SimSound::new(1000.0).with_load_ticks(1).with_tags(tags));

        let mut deck = Deck::default();
        deck.load_with_metadata(&mut engine, Path::new(TRACK), metadata());
        assert_eq!(deck.cover(), &CoverArt::Pending);
        assert_eq!(deck.volume(), 1.0);

        engine.advance(FRAME);
        deck.update(&mut engine, FRAME);
        assert!((deck.volume() - 0.501).abs() < 0.001);
        assert_eq!(deck.cover(), &CoverArt::Embedded(Arc::from(&[1u8, 2, 3][..])));
    }

    #[test]
    fn test_cover_timeout_falls_back() {
        let mut engine = engine();
        let mut deck = ready_deck(&mut engine, DeckConfig::default());
        assert_eq!(deck.cover(), &CoverArt::Pending);
        tick(&mut deck, &mut engine, 6 * 60);
        assert_eq!(deck.cover(), &CoverArt::Default);
    }

    #[test]
    fn test_stop_resets() {
        let mut engine = engine();
        let mut deck = ready_deck(&mut engine, DeckConfig::default());
        deck.set_replay_gain_db(&mut engine, -3.0);
        deck.start(&mut engine);
        tick(&mut deck, &mut engine, 30);
        assert!(deck.track_position_ms(&engine) > 0.0);

        deck.stop(&mut engine);
        assert_eq!(deck.playback_state(), PlaybackState::Stopped);
        assert_eq!(deck.track_position_ms(&engine), 0.0);
        assert_eq!(deck.volume(), 1.0);
        assert_eq!(engine.live_channels(), 0);
        assert_eq!(engine.live_dsps(), 0);
    }

    #[test]
    fn test_track_end_stops() {
        let mut engine = SimBackend::new();
        engine.register(TRACK, SimSound::new(500.0));
        let mut deck = Deck::default();
        deck.load(&mut engine, Path::new(TRACK));
        deck.start(&mut engine);
        deck.update(&mut engine, FRAME);
        assert!(deck.is_playing());

        let mut ended = false;
        for _ in 0..60 {
            engine.advance(FRAME);
            if deck.update(&mut engine, FRAME).contains(&DeckEvent::TrackEnded) {
                ended = true;
                break;
            }
        }
        assert!(ended);
        assert_eq!(deck.playback_state(), PlaybackState::Stopped);
        assert_eq!(deck.track_position_ms(&engine), 0.0);
    }

    #[test]
    fn test_pitch_converges_and_is_pushed() {
        for target in [0.94, 0.98, 1.02, 1.06] {
            let mut engine = engine();
            let mut deck = ready_deck(&mut engine, DeckConfig::default());
            deck.start(&mut engine);
            deck.set_pitch(target);
            tick(&mut deck, &mut engine, 600);
            assert!((deck.current_pitch() - target).abs() < 1e-4);
            let pushed = engine.channel_pitch(deck.channel().unwrap()).unwrap();
            assert!((pushed - target).abs() < 1e-4);
        }
    }

    #[test]
    fn test_pitch_stays_in_range() {
        let mut engine = engine();
        let mut deck = ready_deck(&mut engine, DeckConfig::default());
        deck.start(&mut engine);
        deck.set_pitch(1.5);
        for _ in 0..300 {
            tick(&mut deck, &mut engine, 1);
            assert!(deck.current_pitch() <= 1.06);
        }
        deck.set_pitch(0.1);
        for _ in 0..300 {
            tick(&mut deck, &mut engine, 1);
            assert!(deck.current_pitch() >= 0.94);
        }
    }

    #[test]
    fn test_key_lock_round_trip() {
        let mut engine = engine();
        let mut deck = ready_deck(&mut engine, DeckConfig::default());
        deck.start(&mut engine);
        deck.set_pitch(1.04);
        tick(&mut deck, &mut engine, 600);
        let before = deck.current_pitch();
        let channel = deck.channel().unwrap();
        let shifter = deck.dsp_chain().pitch_shift().unwrap();

        deck.toggle_key_lock(&mut engine);
        assert_eq!(engine.channel_pitch(channel), Some(1.0));
        assert_eq!(engine.dsp_parameter(shifter, DspParam::PitchSemitones), Some(0.0));

        deck.toggle_key_lock(&mut engine);
        assert_eq!(deck.current_pitch(), before);
        assert_eq!(engine.dsp_parameter(shifter, DspParam::PitchSemitones), Some(0.0));
        assert_eq!(engine.channel_pitch(channel), Some(before));
    }

    #[test]
    fn test_key_lock_routes_changes_to_shifter() {
        let mut engine = engine();
        let mut deck = ready_deck(&mut engine, DeckConfig::default());
        deck.start(&mut engine);
        deck.toggle_key_lock(&mut engine);
        deck.set_pitch(1.06);
        tick(&mut deck, &mut engine, 600);

        let channel = deck.channel().unwrap();
        let shifter = deck.dsp_chain().pitch_shift().unwrap();
        assert_eq!(engine.channel_pitch(channel), Some(1.0));
        let shift = engine
            .dsp_parameter(shifter, DspParam::PitchSemitones)
            .unwrap();
        assert!((shift - 12.0 * 1.06f32.log2()).abs() < 1e-2);
        // Tempo is held at 1.0, key moves up a semitone
        assert_eq!(deck.displayed_bpm(), Some(128));
        assert_eq!(deck.displayed_key().unwrap().camelot, "3A");
    }

    #[test]
    fn test_displayed_values_follow_pitch() {
        let mut engine = engine();
        let mut deck = ready_deck(&mut engine, DeckConfig::default());
        assert_eq!(deck.displayed_bpm(), Some(128));
        assert_eq!(deck.displayed_key().unwrap().name, "Am");

        deck.set_pitch(1.06);
        tick(&mut deck, &mut engine, 600);
        assert_eq!(deck.displayed_bpm(), Some(136));
    }

    #[test]
    fn test_cue_from_paused() {
        let mut engine = engine();
        let mut deck = ready_deck(&mut engine, DeckConfig::default());
        deck.start(&mut engine);
        tick(&mut deck, &mut engine, 60);
        deck.pause(&mut engine);
        let here = deck.track_position_ms(&engine);

        deck.cue_press(&mut engine);
        assert_eq!(deck.cue_point_ms(), here);
        assert!(deck.is_cue_held());
        let channel = deck.channel().unwrap();
        assert_eq!(engine.channel_paused(channel), Some(false));
        assert_eq!(engine.channel_pitch(channel), Some(1.0));

        tick(&mut deck, &mut engine, 30);
        assert!(deck.track_position_ms(&engine) > here);

        deck.cue_release(&mut engine);
        assert_eq!(deck.track_position_ms(&engine), here);
        assert_eq!(deck.playback_state(), PlaybackState::Paused);
        assert_eq!(engine.channel_paused(channel), Some(true));

        // Pressing again without moving keeps the same cue point
        deck.cue_press(&mut engine);
        deck.cue_release(&mut engine);
        assert_eq!(deck.cue_point_ms(), here);
    }

    #[test]
    fn test_cue_from_stopped_captures_start() {
        let mut engine = engine();
        let mut deck = ready_deck(&mut engine, DeckConfig::default());
        deck.cue_press(&mut engine);
        assert_eq!(deck.cue_point_ms(), 0.0);
        tick(&mut deck, &mut engine, 30);
        deck.cue_release(&mut engine);
        assert_eq!(deck.track_position_ms(&engine), 0.0);
        assert_eq!(deck.playback_state(), PlaybackState::Paused);
    }

    #[test]
    fn test_cue_from_playing_restores_playing() {
        let mut engine = engine();
        let mut deck = ready_deck(&mut engine, DeckConfig::default());
        deck.start(&mut engine);
        tick(&mut deck, &mut engine, 60);

        deck.cue_press(&mut engine);
        assert_eq!(deck.track_position_ms(&engine), 0.0);
        deck.cue_release(&mut engine);
        assert_eq!(deck.track_position_ms(&engine), 0.0);
        assert!(deck.is_playing());
        assert_eq!(engine.channel_paused(deck.channel().unwrap()), Some(false));
    }

    #[test]
    fn test_direct_scratch() {
        let mut engine = engine();
        let mut deck = ready_deck(&mut engine, DeckConfig::default());
        deck.start(&mut engine);
        tick(&mut deck, &mut engine, 60);
        let anchor = deck.track_position_ms(&engine);

        deck.begin_scratch(&mut engine, 0.0);
        assert!(deck.is_scratching());
        let channel = deck.channel().unwrap();
        assert_eq!(engine.channel_pitch(channel), Some(1.0));

        deck.scratch_update(&mut engine, 10.0, FRAME);
        assert!((deck.track_position_ms(&engine) - (anchor + 50.0)).abs() < 1e-6);

        deck.end_scratch(&mut engine);
        assert!(!deck.is_scratching());
        assert!(deck.is_playing());
        assert!((deck.track_position_ms(&engine) - (anchor + 50.0)).abs() < 1e-6);
    }

    #[test]
    fn test_pitch_forced_to_unity_while_scratching() {
        let mut engine = engine();
        let mut deck = ready_deck(&mut engine, DeckConfig::default());
        deck.start(&mut engine);
        deck.set_pitch(1.06);
        tick(&mut deck, &mut engine, 30);
        let mid = deck.current_pitch();

        deck.begin_scratch(&mut engine, 0.0);
        tick(&mut deck, &mut engine, 30);
        assert_eq!(engine.channel_pitch(deck.channel().unwrap()), Some(1.0));
        // Smoothing waits for the hold to end
        assert_eq!(deck.current_pitch(), mid);
        deck.end_scratch(&mut engine);
        assert_eq!(engine.channel_pitch(deck.channel().unwrap()), Some(mid));
    }

    #[test]
    fn test_momentum_scratch_coasts_then_resumes() {
        let mut engine = engine();
        let config = DeckConfig {
            scratch_model: ScratchModelKind::Momentum,
            ..DeckConfig::default()
        };
        let mut deck = ready_deck(&mut engine, config);
        deck.start(&mut engine);

        deck.begin_scratch(&mut engine, 0.0);
        deck.scratch_update(&mut engine, 5.0, 0.01);
        deck.end_scratch(&mut engine);
        assert!(deck.is_scratching(), "still coasting");

        tick(&mut deck, &mut engine, 120);
        assert!(!deck.is_scratching());
        assert!(deck.is_playing());
    }

    #[test]
    fn test_momentum_without_motor_pauses() {
        let mut engine = engine();
        let config = DeckConfig {
            scratch_model: ScratchModelKind::Momentum,
            motor_enabled: false,
            ..DeckConfig::default()
        };
        let mut deck = ready_deck(&mut engine, config);
        deck.start(&mut engine);
        deck.begin_scratch(&mut engine, 0.0);
        deck.scratch_update(&mut engine, 5.0, 0.01);
        deck.end_scratch(&mut engine);
        tick(&mut deck, &mut engine, 120);
        assert_eq!(deck.playback_state(), PlaybackState::Paused);
    }

    #[test]
    fn test_motion_grab_drives_scratch() {
        let mut engine = engine();
        let config = DeckConfig {
            grab_detection: GrabDetection::Motion,
            ..DeckConfig::default()
        };
        let mut deck = ready_deck(&mut engine, config);
        deck.start(&mut engine);

        deck.scratch_update(&mut engine, 0.0, FRAME);
        deck.scratch_update(&mut engine, 10.0, FRAME);
        assert!(deck.is_scratching());
        deck.scratch_update(&mut engine, 20.0, FRAME);
        deck.scratch_update(&mut engine, 20.0, FRAME);
        assert!(!deck.is_scratching());
        assert!(deck.is_playing());
    }

    fn short_track_paused() -> (SimBackend, Deck) {
        let mut engine = SimBackend::new();
        engine.register(TRACK, SimSound::new(500.0));
        let mut deck = Deck::default();
        deck.load(&mut engine, Path::new(TRACK));
        deck.update(&mut engine, FRAME);
        deck.start(&mut engine);
        deck.pause(&mut engine);
        (engine, deck)
    }

    #[test]
    fn test_scratch_past_end_clamps() {
        let (mut engine, mut deck) = short_track_paused();
        deck.begin_scratch(&mut engine, 0.0);
        deck.scratch_update(&mut engine, 170.0, FRAME);
        assert_eq!(deck.track_position_ms(&engine), 500.0);

        engine.advance(FRAME);
        assert!(deck.update(&mut engine, FRAME).is_empty());
        assert!(deck.is_scratching());
        assert_eq!(deck.track_position_ms(&engine), 500.0);

        deck.end_scratch(&mut engine);
        assert_eq!(deck.playback_state(), PlaybackState::Paused);
        assert_eq!(deck.track_position_ms(&engine), 500.0);
        assert_eq!(engine.channel_paused(deck.channel().unwrap()), Some(true));
    }

    #[test]
    fn test_held_channel_running_off_end_keeps_hold() {
        let (mut engine, mut deck) = short_track_paused();
        deck.begin_scratch(&mut engine, 0.0);
        deck.scratch_update(&mut engine, 98.0, FRAME);
        assert_eq!(deck.track_position_ms(&engine), 490.0);

        // The resting hand lets the channel play past the last frame
        engine.advance(FRAME);
        assert!(deck.update(&mut engine, FRAME).is_empty());
        assert!(deck.is_scratching());
        assert_eq!(deck.track_position_ms(&engine), 500.0);

        deck.scratch_update(&mut engine, 80.0, FRAME);
        assert_eq!(deck.track_position_ms(&engine), 400.0);
        assert_eq!(engine.channel_paused(deck.channel().unwrap()), Some(false));

        deck.end_scratch(&mut engine);
        assert_eq!(deck.playback_state(), PlaybackState::Paused);
        assert_eq!(deck.track_position_ms(&engine), 400.0);
    }

    #[test]
    fn test_track_end_keeps_earlier_events() {
        let mut engine = SimBackend::new();
        engine.register(TRACK, SimSound::new(10.0));
        let mut deck = Deck::default();
        deck.load(&mut engine, Path::new(TRACK));
        deck.update(&mut engine, FRAME);
        deck.start(&mut engine);
        engine.advance(FRAME);

        deck.failure = Some("late".into());
        let events = deck.update(&mut engine, FRAME);
        assert!(matches!(
            events.as_slice(),
            [DeckEvent::LoadFailed { .. }, DeckEvent::TrackEnded]
        ));
    }

    #[test]
    fn test_reversed_pitch_range_falls_back() {
        let mut deck = Deck::new(DeckConfig {
            min_pitch: 1.1,
            max_pitch: 0.9,
            ..DeckConfig::default()
        });
        let defaults = DeckConfig::default();
        assert_eq!(deck.config().min_pitch, defaults.min_pitch);
        assert_eq!(deck.config().max_pitch, defaults.max_pitch);
        deck.set_pitch(2.0);
        assert_eq!(deck.target_pitch(), defaults.max_pitch);
    }

    #[test]
    fn test_state_snapshot() {
        let mut engine = engine();
        let mut deck = ready_deck(&mut engine, DeckConfig::default());
        deck.set_eq_high(&mut engine, 1.0);
        let state = deck.state();
        assert_eq!(state.status, TrackStatus::Ready);
        assert_eq!(state.title.as_deref(), Some("track"));
        assert_eq!(state.eq_db, [0.0, 0.0, 12.0]);
        assert_eq!(state.bpm, Some(128));
        assert_eq!(state.duration_ms, 60_000.0);
    }
}
