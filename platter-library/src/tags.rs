//! Embedded tag reading
//!
//! Probes an audio file with Symphonia and collects the tags the deck cares
//! about (title, artist, album, ReplayGain, BPM, key) plus the first embedded
//! picture. Nothing is decoded; only container metadata is read.

use crate::metadata::{parse_bpm, parse_replay_gain};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardTagKey};
use symphonia::core::probe::Hint;
use thiserror::Error;

/// Errors that can occur while probing a file
#[derive(Error, Debug)]
pub enum TagError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No audio track found in file")]
    NoAudioTrack,
    #[error("Probe error: {0}")]
    Probe(String),
}

/// Raw tag names that mean the same thing across containers
const ALIASES: &[(&str, &str)] = &[
    ("TIT2", "TITLE"),
    ("TPE1", "ARTIST"),
    ("TALB", "ALBUM"),
    ("TBPM", "BPM"),
    ("TKEY", "INITIALKEY"),
    ("INITIAL_KEY", "INITIALKEY"),
    ("KEY", "INITIALKEY"),
];

/// Key-value view over a track's embedded tags
#[derive(Debug, Clone, Default)]
pub struct TrackTags {
    entries: BTreeMap<String, String>,
    picture: Option<Arc<[u8]>>,
}

impl TrackTags {
    /// Insert a tag; the key is normalized to upper case and aliased.
    /// The first value seen for a key wins.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        let upper = key.trim().to_ascii_uppercase();
        let key = ALIASES
            .iter()
            .find(|(alias, _)| *alias == upper)
            .map(|(_, canonical)| canonical.to_string())
            .unwrap_or(upper);
        let value = value.into();
        if value.trim().is_empty() {
            return;
        }
        self.entries.entry(key).or_insert(value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_ascii_uppercase())
            .map(String::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.get("TITLE")
    }

    pub fn artist(&self) -> Option<&str> {
        self.get("ARTIST")
    }

    pub fn album(&self) -> Option<&str> {
        self.get("ALBUM")
    }

    pub fn initial_key(&self) -> Option<&str> {
        self.get("INITIALKEY")
    }

    pub fn bpm(&self) -> Option<u32> {
        self.get("BPM").and_then(parse_bpm)
    }

    pub fn replay_gain_db(&self) -> Option<f32> {
        self.get("REPLAYGAIN_TRACK_GAIN").and_then(parse_replay_gain)
    }

    pub fn replay_gain_peak(&self) -> Option<f32> {
        self.get("REPLAYGAIN_TRACK_PEAK").and_then(parse_replay_gain)
    }

    /// Embedded cover image bytes, if any
    pub fn picture(&self) -> Option<Arc<[u8]>> {
        self.picture.clone()
    }

    pub fn set_picture(&mut self, data: impl Into<Arc<[u8]>>) {
        self.picture = Some(data.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.picture.is_none()
    }

    fn absorb(&mut self, revision: &MetadataRevision) {
        for tag in revision.tags() {
            let canonical = match tag.std_key {
                Some(StandardTagKey::TrackTitle) => Some("TITLE"),
                Some(StandardTagKey::Artist) => Some("ARTIST"),
                Some(StandardTagKey::Album) => Some("ALBUM"),
                Some(StandardTagKey::ReplayGainTrackGain) => Some("REPLAYGAIN_TRACK_GAIN"),
                Some(StandardTagKey::ReplayGainTrackPeak) => Some("REPLAYGAIN_TRACK_PEAK"),
                _ => None,
            };
            let value = tag.value.to_string();
            match canonical {
                Some(key) => self.insert(key, value),
                None => self.insert(&tag.key, value),
            }
        }
        if self.picture.is_none() {
            if let Some(visual) = revision.visuals().first() {
                self.picture = Some(Arc::from(&visual.data[..]));
            }
        }
    }
}

/// What a probe learns about a file without decoding it
#[derive(Debug, Clone)]
pub struct TrackProbe {
    pub sample_rate: u32,
    /// Total length in sample frames
    pub total_frames: u64,
    pub tags: TrackTags,
}

impl TrackProbe {
    /// Track length in milliseconds
    pub fn length_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.total_frames as f64 * 1000.0 / self.sample_rate as f64
    }
}

/// Probe an audio file for its length and tags
pub fn probe(path: &Path) -> Result<TrackProbe, TagError> {
    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let mut probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| TagError::Probe(e.to_string()))?;

    let mut tags = TrackTags::default();

    // Tags ahead of the container (ID3v2) come first, then the container's own
    if let Some(metadata) = probed.metadata.get() {
        if let Some(revision) = metadata.current() {
            tags.absorb(revision);
        }
    }

    let mut format = probed.format;
    if let Some(revision) = format.metadata().current() {
        tags.absorb(revision);
    }

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(TagError::NoAudioTrack)?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let time_base = track.codec_params.time_base;
    let known_frames = track.codec_params.n_frames;

    let total_frames = match known_frames {
        Some(frames) => frames,
        None => {
            // Walk packet durations; cheap compared to decoding
            let mut duration = 0u64;
            while let Ok(packet) = format.next_packet() {
                if packet.track_id() == track_id {
                    duration += packet.dur();
                }
            }
            match time_base {
                Some(tb) => {
                    let time = tb.calc_time(duration);
                    ((time.seconds as f64 + time.frac) * sample_rate as f64).round() as u64
                }
                None => duration,
            }
        }
    };

    tracing::debug!(
        path = %path.display(),
        sample_rate,
        total_frames,
        "probed track"
    );

    Ok(TrackProbe {
        sample_rate,
        total_frames,
        tags,
    })
}
