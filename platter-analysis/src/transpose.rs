//! Key and tempo transposition under a pitch ratio
//!
//! A turntable pitched up by a ratio `r` plays `12 * log2(r)` semitones
//! sharp. Display code rounds that to whole semitones and shifts the
//! track's stored key by it; BPM simply scales by `r`.

use crate::camelot::{CamelotKey, MusicalKey, Spelling};

/// Whole-semitone shift produced by playing at `pitch_ratio`
pub fn semitone_shift(pitch_ratio: f64) -> i32 {
    if !(pitch_ratio.is_finite() && pitch_ratio > 0.0) {
        return 0;
    }
    (12.0 * pitch_ratio.log2()).round() as i32
}

/// BPM shown to the user when a track with `bpm` plays at `pitch_ratio`
pub fn transpose_bpm(bpm: u32, pitch_ratio: f64) -> u32 {
    let scaled = bpm as f64 * pitch_ratio;
    if scaled.is_finite() && scaled > 0.0 {
        scaled.round() as u32
    } else {
        bpm
    }
}

/// A key resolved from either a note name or a Camelot code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedKey {
    pub key: MusicalKey,
    /// Accidental style of the input, used to spell the transposed name
    pub spelling: Spelling,
}

impl ResolvedKey {
    /// Accept "F#m", "Db", "E minor" as well as "11A", "3B"
    pub fn parse(s: &str) -> Option<Self> {
        if let Some((key, spelling)) = MusicalKey::parse_name(s) {
            return Some(Self {
                key,
                spelling: spelling.unwrap_or_default(),
            });
        }
        CamelotKey::parse(s).map(|camelot| Self {
            key: camelot.to_musical_key(),
            spelling: Spelling::default(),
        })
    }

    /// Shift by the semitones implied by `pitch_ratio`
    pub fn transpose(&self, pitch_ratio: f64) -> Self {
        Self {
            key: self.key.transpose(semitone_shift(pitch_ratio)),
            spelling: self.spelling,
        }
    }

    pub fn name(&self) -> String {
        self.key.name(self.spelling)
    }

    pub fn camelot(&self) -> CamelotKey {
        CamelotKey::from_musical_key(self.key)
    }
}

/// Key strings ready for display
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyDisplay {
    /// Note name ("C#") or whatever the track metadata carried
    pub name: String,
    /// Camelot code ("3B") or whatever the track metadata carried
    pub camelot: String,
}

/// Transpose a track's stored key for display at `pitch_ratio`.
///
/// `initial_key` and `camelot` are the raw metadata fields; either may be
/// missing. The name is tried first, then the Camelot code. When the shift
/// rounds to zero the stored strings are shown as-is (a missing field is
/// derived from the other). When neither field parses, both are shown
/// verbatim.
pub fn transpose_key(initial_key: Option<&str>, camelot: Option<&str>, pitch_ratio: f64) -> KeyDisplay {
    let resolved = initial_key
        .and_then(ResolvedKey::parse)
        .or_else(|| camelot.and_then(ResolvedKey::parse));

    let Some(resolved) = resolved else {
        if initial_key.is_some() || camelot.is_some() {
            tracing::debug!(?initial_key, ?camelot, "unparseable key, showing verbatim");
        }
        return KeyDisplay {
            name: initial_key.unwrap_or_default().to_string(),
            camelot: camelot.unwrap_or_default().to_string(),
        };
    };

    if semitone_shift(pitch_ratio) == 0 {
        return KeyDisplay {
            name: initial_key
                .map(str::to_string)
                .unwrap_or_else(|| resolved.name()),
            camelot: camelot
                .map(str::to_string)
                .unwrap_or_else(|| resolved.camelot().display()),
        };
    }

    let shifted = resolved.transpose(pitch_ratio);
    KeyDisplay {
        name: shifted.name(),
        camelot: shifted.camelot().display(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEMITONE: f64 = 1.059_463_094_359_295_3;

    #[test]
    fn test_semitone_shift() {
        assert_eq!(semitone_shift(1.0), 0);
        assert_eq!(semitone_shift(SEMITONE), 1);
        assert_eq!(semitone_shift(1.0 / SEMITONE), -1);
        assert_eq!(semitone_shift(2.0), 12);
        // ±6% is just under one semitone either way
        assert_eq!(semitone_shift(1.06), 1);
        assert_eq!(semitone_shift(0.94), -1);
        assert_eq!(semitone_shift(1.02), 0);
        assert_eq!(semitone_shift(0.0), 0);
        assert_eq!(semitone_shift(f64::NAN), 0);
    }

    #[test]
    fn test_transpose_bpm() {
        assert_eq!(transpose_bpm(128, 1.06), 136);
        assert_eq!(transpose_bpm(128, 1.0), 128);
        assert_eq!(transpose_bpm(120, 0.94), 113);
    }

    #[test]
    fn test_c_up_one_semitone() {
        let display = transpose_key(Some("C"), None, SEMITONE);
        assert!(display.name == "C#" || display.name == "Db");
        assert_eq!(display.camelot, "3B");
    }

    #[test]
    fn test_a_minor_unchanged() {
        let display = transpose_key(Some("Am"), None, 1.0);
        assert_eq!(display.name, "Am");
        assert_eq!(display.camelot, "8A");

        let display = transpose_key(Some("Am"), Some("8A"), 1.0);
        assert_eq!(display, KeyDisplay { name: "Am".into(), camelot: "8A".into() });
    }

    #[test]
    fn test_camelot_only_input() {
        let display = transpose_key(None, Some("11A"), SEMITONE);
        // F#m up one semitone is Gm
        assert_eq!(display.name, "Gm");
        assert_eq!(display.camelot, "6A");
    }

    #[test]
    fn test_camelot_in_key_field() {
        let display = transpose_key(Some("8B"), None, 1.0 / SEMITONE);
        assert_eq!(display.name, "B");
        assert_eq!(display.camelot, "1B");
    }

    #[test]
    fn test_spelling_follows_input() {
        let display = transpose_key(Some("Eb"), None, SEMITONE * SEMITONE);
        assert_eq!(display.name, "F");
        let display = transpose_key(Some("Eb"), None, SEMITONE);
        assert_eq!(display.name, "E");
        let display = transpose_key(Some("Ab"), None, SEMITONE * SEMITONE);
        assert_eq!(display.name, "Bb");
        let display = transpose_key(Some("F#m"), None, SEMITONE);
        assert_eq!(display.name, "Gm");
        let display = transpose_key(Some("F#m"), None, SEMITONE * SEMITONE);
        assert_eq!(display.name, "G#m");
    }

    #[test]
    fn test_unparseable_shown_verbatim() {
        let display = transpose_key(Some("unknown"), Some("??"), SEMITONE);
        assert_eq!(display.name, "unknown");
        assert_eq!(display.camelot, "??");

        let display = transpose_key(None, None, SEMITONE);
        assert_eq!(display, KeyDisplay::default());
    }

    #[test]
    fn test_name_unparseable_falls_back_to_camelot() {
        let display = transpose_key(Some("weird"), Some("8A"), SEMITONE);
        assert_eq!(display.name, "A#m");
        assert_eq!(display.camelot, "3A");
    }
}
