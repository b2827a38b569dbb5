//! Track metadata and JSON sidecar files
//!
//! Every track may ship with a `<stem>.json` companion next to the audio
//! file. Sidecars come from external tooling, so every field is optional and
//! tolerant: numbers may be strings, gains may carry a "dB" suffix. Anything
//! unusable falls back to a default instead of failing the load.

use crate::tags::TrackTags;
use platter_analysis::{transpose_bpm, transpose_key, KeyDisplay};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading a sidecar
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed sidecar: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raw sidecar record as written by the tagging tools
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SidecarRecord {
    title: Option<Value>,
    id: Option<Value>,
    filename: Option<Value>,
    bpm: Option<Value>,
    initial_key: Option<Value>,
    camelot: Option<Value>,
    replaygain_track_gain: Option<Value>,
    replaygain_track_peak: Option<Value>,
    cover: Option<Value>,
    artist: Option<Value>,
    album: Option<Value>,
}

/// Track metadata, parsed once per load and shared read-only afterwards
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    pub id: Option<String>,
    /// Display title, never empty (falls back to the file stem)
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub filename: Option<String>,
    /// Stored BPM, `None` when unknown
    pub bpm: Option<u32>,
    /// Initial key as written (note name or Camelot code)
    pub initial_key: Option<String>,
    pub camelot: Option<String>,
    /// ReplayGain track gain in dB
    pub replay_gain_db: Option<f32>,
    pub replay_gain_peak: Option<f32>,
    /// Cover image reference (file name relative to the sidecar)
    pub cover: Option<String>,
}

impl TrackMetadata {
    /// Minimal metadata for a track without a sidecar
    pub fn from_path(audio_path: &Path) -> Self {
        Self {
            title: display_name(audio_path),
            filename: audio_path
                .file_name()
                .and_then(|s| s.to_str())
                .map(str::to_string),
            ..Default::default()
        }
    }

    /// Parse sidecar JSON for the track at `audio_path`
    pub fn from_sidecar_json(json: &str, audio_path: &Path) -> Result<Self, MetadataError> {
        let record: SidecarRecord = serde_json::from_str(json)?;
        let fallback = Self::from_path(audio_path);

        let replay_gain_db = match record.replaygain_track_gain.as_ref() {
            Some(value) => {
                let parsed = value_to_gain(value);
                if parsed.is_none() {
                    tracing::warn!(?value, path = %audio_path.display(), "unparsable replaygain, using unit gain");
                }
                parsed
            }
            None => None,
        };

        Ok(Self {
            id: record.id.as_ref().and_then(value_to_text),
            title: record
                .title
                .as_ref()
                .and_then(value_to_text)
                .unwrap_or(fallback.title),
            artist: record.artist.as_ref().and_then(value_to_text),
            album: record.album.as_ref().and_then(value_to_text),
            filename: record
                .filename
                .as_ref()
                .and_then(value_to_text)
                .or(fallback.filename),
            bpm: record.bpm.as_ref().and_then(value_to_bpm),
            initial_key: record.initial_key.as_ref().and_then(value_to_text),
            camelot: record.camelot.as_ref().and_then(value_to_text),
            replay_gain_db,
            replay_gain_peak: record.replaygain_track_peak.as_ref().and_then(value_to_gain),
            cover: record.cover.as_ref().and_then(value_to_text),
        })
    }

    /// Read the sidecar file for `audio_path`
    pub fn load_sidecar(audio_path: &Path) -> Result<Self, MetadataError> {
        let content = fs::read_to_string(sidecar_path(audio_path))?;
        Self::from_sidecar_json(&content, audio_path)
    }

    /// Load metadata for a track, never failing.
    ///
    /// A missing sidecar is normal; a malformed one is logged. Both fall back
    /// to the filename-derived title and unit replaygain.
    pub fn load_for(audio_path: &Path) -> Self {
        match Self::load_sidecar(audio_path) {
            Ok(metadata) => metadata,
            Err(MetadataError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Self::from_path(audio_path)
            }
            Err(e) => {
                tracing::warn!(path = %audio_path.display(), error = %e, "ignoring sidecar");
                Self::from_path(audio_path)
            }
        }
    }

    /// Fill fields the sidecar left empty from embedded tags
    pub fn merge_tags(&mut self, tags: &TrackTags, audio_path: &Path) {
        if self.title == display_name(audio_path) {
            if let Some(title) = tags.title() {
                self.title = title.to_string();
            }
        }
        if self.artist.is_none() {
            self.artist = tags.artist().map(str::to_string);
        }
        if self.album.is_none() {
            self.album = tags.album().map(str::to_string);
        }
        if self.bpm.is_none() {
            self.bpm = tags.bpm();
        }
        if self.initial_key.is_none() {
            self.initial_key = tags.initial_key().map(str::to_string);
        }
        if self.replay_gain_db.is_none() {
            self.replay_gain_db = tags.replay_gain_db();
        }
        if self.replay_gain_peak.is_none() {
            self.replay_gain_peak = tags.replay_gain_peak();
        }
    }

    /// BPM as shown at the given pitch ratio
    pub fn displayed_bpm(&self, pitch_ratio: f64) -> Option<u32> {
        self.bpm.map(|bpm| transpose_bpm(bpm, pitch_ratio))
    }

    /// Key and Camelot code as shown at the given pitch ratio
    pub fn displayed_key(&self, pitch_ratio: f64) -> KeyDisplay {
        transpose_key(
            self.initial_key.as_deref(),
            self.camelot.as_deref(),
            pitch_ratio,
        )
    }
}

/// Sidecar location for an audio file: same directory and stem, `.json`
pub fn sidecar_path(audio_path: &Path) -> PathBuf {
    audio_path.with_extension("json")
}

/// Display name derived from the file name
pub fn display_name(audio_path: &Path) -> String {
    audio_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Unknown")
        .to_string()
}

/// Parse a ReplayGain value such as "-6.52 dB", "+1.3dB" or "-4"
pub fn parse_replay_gain(s: &str) -> Option<f32> {
    let s = s.trim();
    let lower = s.to_ascii_lowercase();
    let number = lower.strip_suffix("db").unwrap_or(&lower).trim();
    let number = number.strip_prefix('+').unwrap_or(number);
    // Some taggers write the unicode minus sign
    let number = number.replace('\u{2212}', "-");
    number.parse::<f32>().ok().filter(|g| g.is_finite())
}

/// Parse a BPM value; zero, negative and non-numeric mean "unknown"
pub fn parse_bpm(s: &str) -> Option<u32> {
    s.trim().parse::<f64>().ok().and_then(bpm_from_f64)
}

fn bpm_from_f64(bpm: f64) -> Option<u32> {
    if bpm.is_finite() && bpm >= 0.5 {
        Some(bpm.round() as u32)
    } else {
        None
    }
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_to_bpm(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_f64().and_then(bpm_from_f64),
        Value::String(s) => parse_bpm(s),
        _ => None,
    }
}

fn value_to_gain(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|g| g as f32).filter(|g| g.is_finite()),
        Value::String(s) => parse_replay_gain(s),
        _ => None,
    }
}
