//! Track library for Platter - sidecar metadata, embedded tags, folder
//! scanning and configuration

mod config;
mod metadata;
mod scanner;
mod tags;

pub use config::Config;
pub use metadata::{
    display_name, parse_bpm, parse_replay_gain, sidecar_path, MetadataError, TrackMetadata,
};
pub use scanner::{LibraryEntry, LibraryScanner, ScanConfig, NONE_PLAYING};
pub use tags::{probe, TagError, TrackProbe, TrackTags};
