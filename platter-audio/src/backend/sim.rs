//! In-memory audio engine
//!
//! Tracks sounds, channels and DSP units as plain data and advances channel
//! positions on [`SimBackend::advance`]. Used by the headless host and by
//! tests, where every parameter the deck writes can be read back.

use super::{
    AudioBackend, ChannelHandle, DspHandle, DspKind, DspParam, EngineError, OpenState,
    SoundFlags, SoundHandle, SoundInfo,
};
use platter_library::TrackTags;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Description of a sound the simulated engine can open
#[derive(Debug, Clone)]
pub struct SimSound {
    pub length_ms: f64,
    pub sample_rate: u32,
    pub tags: TrackTags,
    /// Number of `advance` calls before a non-blocking open completes
    pub load_ticks: u32,
    /// Whether the background open ends in failure
    pub fails: bool,
}

impl SimSound {
    pub fn new(length_ms: f64) -> Self {
        Self {
            length_ms,
            sample_rate: 44100,
            tags: TrackTags::default(),
            load_ticks: 0,
            fails: false,
        }
    }

    pub fn with_tags(mut self, tags: TrackTags) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_load_ticks(mut self, ticks: u32) -> Self {
        self.load_ticks = ticks;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fails = true;
        self
    }
}

#[derive(Debug)]
struct SoundSlot {
    sound: SimSound,
    remaining_ticks: u32,
    state: OpenState,
}

#[derive(Debug)]
struct ChannelSlot {
    sound: SoundHandle,
    length_ms: f64,
    position_ms: f64,
    paused: bool,
    volume: f32,
    pitch: f32,
    dsps: Vec<DspHandle>,
}

#[derive(Debug)]
struct DspSlot {
    kind: DspKind,
    params: HashMap<DspParam, f32>,
    bypass: bool,
}

/// Simulated mixing engine
#[derive(Debug, Default)]
pub struct SimBackend {
    catalog: HashMap<PathBuf, SimSound>,
    sounds: HashMap<u32, SoundSlot>,
    channels: HashMap<u32, ChannelSlot>,
    dsps: HashMap<u32, DspSlot>,
    failing_dsps: HashSet<DspKind>,
    probe_files: bool,
    next_id: u32,
}

impl SimBackend {
    /// Engine that only opens sounds registered with [`SimBackend::register`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine that also opens real files, probing them for length and tags
    pub fn probing_files() -> Self {
        Self {
            probe_files: true,
            ..Self::default()
        }
    }

    /// Make `path` openable as `sound`
    pub fn register(&mut self, path: impl Into<PathBuf>, sound: SimSound) {
        self.catalog.insert(path.into(), sound);
    }

    /// Make every future `create_dsp` of `kind` fail
    pub fn fail_dsp(&mut self, kind: DspKind) {
        self.failing_dsps.insert(kind);
    }

    /// Advance the engine clock: finish pending opens and move playing
    /// channels forward by `dt` seconds at their pitch
    pub fn advance(&mut self, dt: f32) {
        for slot in self.sounds.values_mut() {
            if slot.state != OpenState::Loading {
                continue;
            }
            slot.remaining_ticks = slot.remaining_ticks.saturating_sub(1);
            if slot.remaining_ticks == 0 {
                slot.state = if slot.sound.fails {
                    OpenState::Failed
                } else {
                    OpenState::Ready
                };
            }
        }

        let step_ms = dt as f64 * 1000.0;
        self.channels.retain(|_, ch| {
            if ch.paused {
                return true;
            }
            ch.position_ms = (ch.position_ms + step_ms * ch.pitch as f64).max(0.0);
            ch.position_ms < ch.length_ms
        });
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn channel_mut(&mut self, channel: ChannelHandle) -> Result<&mut ChannelSlot, EngineError> {
        self.channels
            .get_mut(&channel.0)
            .ok_or(EngineError::InvalidHandle)
    }

    fn dsp_mut(&mut self, dsp: DspHandle) -> Result<&mut DspSlot, EngineError> {
        self.dsps.get_mut(&dsp.0).ok_or(EngineError::InvalidHandle)
    }

    // Inspection helpers

    pub fn live_sounds(&self) -> usize {
        self.sounds.len()
    }

    pub fn live_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn live_dsps(&self) -> usize {
        self.dsps.len()
    }

    pub fn channel_volume(&self, channel: ChannelHandle) -> Option<f32> {
        self.channels.get(&channel.0).map(|c| c.volume)
    }

    pub fn channel_pitch(&self, channel: ChannelHandle) -> Option<f32> {
        self.channels.get(&channel.0).map(|c| c.pitch)
    }

    pub fn channel_paused(&self, channel: ChannelHandle) -> Option<bool> {
        self.channels.get(&channel.0).map(|c| c.paused)
    }

    pub fn channel_dsps(&self, channel: ChannelHandle) -> Vec<DspHandle> {
        self.channels
            .get(&channel.0)
            .map(|c| c.dsps.clone())
            .unwrap_or_default()
    }

    pub fn dsp_kind(&self, dsp: DspHandle) -> Option<DspKind> {
        self.dsps.get(&dsp.0).map(|d| d.kind)
    }

    pub fn dsp_parameter(&self, dsp: DspHandle, param: DspParam) -> Option<f32> {
        self.dsps.get(&dsp.0).and_then(|d| d.params.get(&param).copied())
    }

    pub fn dsp_bypassed(&self, dsp: DspHandle) -> Option<bool> {
        self.dsps.get(&dsp.0).map(|d| d.bypass)
    }
}

impl AudioBackend for SimBackend {
    fn create_sound(&mut self, path: &Path, flags: SoundFlags) -> Result<SoundHandle, EngineError> {
        let sound = match self.catalog.get(path) {
            Some(sound) => sound.clone(),
            None if self.probe_files => {
                let probe = platter_library::probe(path).map_err(|e| EngineError::OpenFailed {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                SimSound {
                    length_ms: probe.length_ms(),
                    sample_rate: probe.sample_rate,
                    tags: probe.tags,
                    load_ticks: 1,
                    fails: false,
                }
            }
            None => {
                return Err(EngineError::OpenFailed {
                    path: path.display().to_string(),
                    reason: "file not found".into(),
                })
            }
        };

        let immediate = !flags.non_blocking || sound.load_ticks == 0;
        if immediate && sound.fails {
            return Err(EngineError::OpenFailed {
                path: path.display().to_string(),
                reason: "decode failed".into(),
            });
        }

        let id = self.next_id();
        self.sounds.insert(
            id,
            SoundSlot {
                remaining_ticks: sound.load_ticks,
                state: if immediate {
                    OpenState::Ready
                } else {
                    OpenState::Loading
                },
                sound,
            },
        );
        Ok(SoundHandle(id))
    }

    fn open_state(&self, sound: SoundHandle) -> OpenState {
        self.sounds
            .get(&sound.0)
            .map(|s| s.state)
            .unwrap_or(OpenState::Failed)
    }

    fn sound_info(&self, sound: SoundHandle) -> Result<SoundInfo, EngineError> {
        let slot = self.sounds.get(&sound.0).ok_or(EngineError::InvalidHandle)?;
        if slot.state != OpenState::Ready {
            return Err(EngineError::NotReady);
        }
        Ok(SoundInfo {
            length_ms: slot.sound.length_ms,
            sample_rate: slot.sound.sample_rate,
        })
    }

    fn tags(&self, sound: SoundHandle) -> Option<TrackTags> {
        self.sounds
            .get(&sound.0)
            .filter(|s| s.state == OpenState::Ready)
            .map(|s| s.sound.tags.clone())
    }

    fn release_sound(&mut self, sound: SoundHandle) {
        self.sounds.remove(&sound.0);
        self.channels.retain(|_, ch| ch.sound != sound);
    }

    fn play(&mut self, sound: SoundHandle, paused: bool) -> Result<ChannelHandle, EngineError> {
        let slot = self.sounds.get(&sound.0).ok_or(EngineError::InvalidHandle)?;
        if slot.state != OpenState::Ready {
            return Err(EngineError::NotReady);
        }
        let length_ms = slot.sound.length_ms;
        let id = self.next_id();
        self.channels.insert(
            id,
            ChannelSlot {
                sound,
                length_ms,
                position_ms: 0.0,
                paused,
                volume: 1.0,
                pitch: 1.0,
                dsps: Vec::new(),
            },
        );
        Ok(ChannelHandle(id))
    }

    fn stop(&mut self, channel: ChannelHandle) {
        self.channels.remove(&channel.0);
    }

    fn is_playing(&self, channel: ChannelHandle) -> bool {
        self.channels.contains_key(&channel.0)
    }

    fn set_paused(&mut self, channel: ChannelHandle, paused: bool) -> Result<(), EngineError> {
        self.channel_mut(channel)?.paused = paused;
        Ok(())
    }

    fn set_volume(&mut self, channel: ChannelHandle, volume: f32) -> Result<(), EngineError> {
        self.channel_mut(channel)?.volume = volume;
        Ok(())
    }

    fn set_pitch(&mut self, channel: ChannelHandle, pitch: f32) -> Result<(), EngineError> {
        self.channel_mut(channel)?.pitch = pitch;
        Ok(())
    }

    fn set_position(&mut self, channel: ChannelHandle, position_ms: f64) -> Result<(), EngineError> {
        let ch = self.channel_mut(channel)?;
        ch.position_ms = position_ms.clamp(0.0, ch.length_ms);
        Ok(())
    }

    fn position(&self, channel: ChannelHandle) -> Result<f64, EngineError> {
        self.channels
            .get(&channel.0)
            .map(|c| c.position_ms)
            .ok_or(EngineError::InvalidHandle)
    }

    fn create_dsp(&mut self, kind: DspKind) -> Result<DspHandle, EngineError> {
        if self.failing_dsps.contains(&kind) {
            return Err(EngineError::DspCreateFailed(kind));
        }
        let id = self.next_id();
        self.dsps.insert(
            id,
            DspSlot {
                kind,
                params: HashMap::new(),
                bypass: false,
            },
        );
        Ok(DspHandle(id))
    }

    fn set_dsp_parameter(&mut self, dsp: DspHandle, param: DspParam, value: f32) -> Result<(), EngineError> {
        self.dsp_mut(dsp)?.params.insert(param, value);
        Ok(())
    }

    fn set_dsp_bypass(&mut self, dsp: DspHandle, bypass: bool) -> Result<(), EngineError> {
        self.dsp_mut(dsp)?.bypass = bypass;
        Ok(())
    }

    fn add_dsp(&mut self, channel: ChannelHandle, dsp: DspHandle) -> Result<(), EngineError> {
        if !self.dsps.contains_key(&dsp.0) {
            return Err(EngineError::InvalidHandle);
        }
        self.channel_mut(channel)?.dsps.push(dsp);
        Ok(())
    }

    fn release_dsp(&mut self, dsp: DspHandle) {
        self.dsps.remove(&dsp.0);
        for ch in self.channels.values_mut() {
            ch.dsps.retain(|d| *d != dsp);
        }
    }
}
