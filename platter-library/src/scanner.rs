//! Music folder scanner
//!
//! Lists playable files in a folder and pairs each with its sidecar
//! metadata. The list backs the track picker, whose first entry is always
//! "None Playing".

use crate::metadata::TrackMetadata;
use std::path::{Path, PathBuf};

/// Label for the picker slot that unloads the deck
pub const NONE_PLAYING: &str = "None Playing";

/// Configuration for the folder scanner
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Directory to scan
    pub directory: PathBuf,
    /// File extensions to include
    pub extensions: Vec<String>,
    /// Whether to scan subdirectories recursively
    pub recursive: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::new(),
            extensions: vec!["mp3".into(), "wav".into(), "ogg".into(), "flac".into()],
            recursive: false,
        }
    }
}

impl ScanConfig {
    pub fn for_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Default::default()
        }
    }
}

/// One playable track in the library
#[derive(Debug, Clone)]
pub struct LibraryEntry {
    pub path: PathBuf,
    pub metadata: TrackMetadata,
}

impl LibraryEntry {
    pub fn display_name(&self) -> &str {
        &self.metadata.title
    }
}

/// Folder scanner
#[derive(Debug, Default)]
pub struct LibraryScanner;

impl LibraryScanner {
    pub fn new() -> Self {
        Self
    }

    /// Scan the configured folder.
    ///
    /// A missing folder is logged and yields an empty library.
    pub fn scan(&self, config: &ScanConfig) -> Vec<LibraryEntry> {
        if !config.directory.is_dir() {
            tracing::warn!(dir = %config.directory.display(), "music folder not found");
            return Vec::new();
        }

        let files = self.collect_files(&config.directory, &config.extensions, config.recursive);
        let mut entries: Vec<LibraryEntry> = files
            .into_iter()
            .map(|path| LibraryEntry {
                metadata: TrackMetadata::load_for(&path),
                path,
            })
            .collect();

        entries.sort_by(|a, b| {
            a.display_name()
                .to_lowercase()
                .cmp(&b.display_name().to_lowercase())
                .then_with(|| a.path.cmp(&b.path))
        });

        tracing::info!(count = entries.len(), dir = %config.directory.display(), "loaded songs");
        entries
    }

    /// Picker labels: "None Playing" followed by each track's display name
    pub fn picker_labels(entries: &[LibraryEntry]) -> Vec<String> {
        std::iter::once(NONE_PLAYING.to_string())
            .chain(entries.iter().map(|e| e.display_name().to_string()))
            .collect()
    }

    /// Resolve a picker index; index 0 ("None Playing") and out-of-range
    /// indices yield `None`
    pub fn picker_entry(entries: &[LibraryEntry], index: usize) -> Option<&LibraryEntry> {
        index.checked_sub(1).and_then(|i| entries.get(i))
    }

    /// Collect all audio files from a directory
    fn collect_files(&self, dir: &Path, extensions: &[String], recursive: bool) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(_) => return files,
        };

        for entry in entries.flatten() {
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                    if extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
                        files.push(path);
                    }
                }
            } else if path.is_dir() && recursive {
                files.extend(self.collect_files(&path, extensions, recursive));
            }
        }

        files.sort();
        files
    }
}
