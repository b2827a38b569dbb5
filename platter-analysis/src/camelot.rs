//! Camelot wheel notation for harmonic mixing
//!
//! Maps musical keys to Camelot notation (1A-12B), parses both note names
//! ("F#m", "Db") and Camelot codes ("11A"), and shifts keys by semitones.

use std::fmt;

/// Note names using sharps, indexed by pitch class (0 = C)
const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Note names using flats, indexed by pitch class (0 = C)
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Camelot wheel number for each major key root, indexed by pitch class.
///
/// C major sits at 8B and each step clockwise is a fifth up.
const MAJOR_WHEEL: [u8; 12] = [8, 3, 10, 5, 12, 7, 2, 9, 4, 11, 6, 1];

/// Camelot wheel number for each minor key root, indexed by pitch class.
///
/// A minor sits at 8A, sharing the number of its relative major.
const MINOR_WHEEL: [u8; 12] = [5, 12, 7, 2, 9, 4, 11, 6, 1, 8, 3, 10];

/// Which accidental to use when spelling a black-key root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Spelling {
    #[default]
    Sharp,
    Flat,
}

/// Musical key (24 possible: 12 major + 12 minor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MusicalKey {
    /// Root pitch class (0-11, where 0 = C)
    root: u8,
    /// true = major, false = minor
    is_major: bool,
}

impl MusicalKey {
    /// Build a key from a pitch class (wrapped into 0-11) and mode
    pub fn from_pitch_class(pc: u8, is_major: bool) -> Self {
        Self {
            root: pc % 12,
            is_major,
        }
    }

    /// Get the pitch class (0-11, where 0=C) for this key's root
    pub fn root_pitch_class(&self) -> u8 {
        self.root
    }

    /// Check if this key is major
    pub fn is_major(&self) -> bool {
        self.is_major
    }

    /// Shift the root by a signed number of semitones, keeping the mode
    pub fn transpose(&self, semitones: i32) -> Self {
        let root = (self.root as i32 + semitones).rem_euclid(12) as u8;
        Self::from_pitch_class(root, self.is_major)
    }

    /// Spell the key as a note name ("C#", "Dbm")
    pub fn name(&self, spelling: Spelling) -> String {
        let table = match spelling {
            Spelling::Sharp => &SHARP_NAMES,
            Spelling::Flat => &FLAT_NAMES,
        };
        let root = table[self.root as usize];
        if self.is_major {
            root.to_string()
        } else {
            format!("{}m", root)
        }
    }

    /// Parse a note name such as "C", "F#m", "Bbmin" or "E major".
    ///
    /// Returns the key plus the spelling the input used, if it used an
    /// accidental at all.
    pub fn parse_name(s: &str) -> Option<(Self, Option<Spelling>)> {
        let s = s.trim();
        let mut chars = s.chars();

        let letter = chars.next()?;
        let mut pc: i32 = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };

        let mut rest = chars.as_str();
        let mut spelling = None;
        loop {
            if let Some(r) = rest.strip_prefix('#').or_else(|| rest.strip_prefix('♯')) {
                pc += 1;
                spelling = Some(Spelling::Sharp);
                rest = r;
            } else if let Some(r) = rest.strip_prefix('b').or_else(|| rest.strip_prefix('♭')) {
                pc -= 1;
                spelling = Some(Spelling::Flat);
                rest = r;
            } else {
                break;
            }
        }

        let is_major = match rest.trim().to_ascii_lowercase().as_str() {
            "" | "maj" | "major" => true,
            "m" | "min" | "minor" => false,
            _ => return None,
        };
        let root = pc.rem_euclid(12) as u8;
        Some((Self::from_pitch_class(root, is_major), spelling))
    }
}

impl fmt::Display for MusicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name(Spelling::Flat))
    }
}

/// Camelot wheel notation (1A-12B)
///
/// - Numbers 1-12 represent positions on the wheel
/// - 'A' suffix = minor keys
/// - 'B' suffix = major keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CamelotKey {
    /// Position on the wheel (1-12)
    pub number: u8,
    /// true = B (major), false = A (minor)
    pub is_major: bool,
}

impl CamelotKey {
    /// Create a new Camelot key
    pub fn new(number: u8, is_major: bool) -> Option<Self> {
        if (1..=12).contains(&number) {
            Some(Self { number, is_major })
        } else {
            None
        }
    }

    /// Convert from musical key to Camelot notation
    pub fn from_musical_key(key: MusicalKey) -> Self {
        let pc = key.root_pitch_class() as usize;
        let number = if key.is_major() {
            MAJOR_WHEEL[pc]
        } else {
            MINOR_WHEEL[pc]
        };
        Self {
            number,
            is_major: key.is_major(),
        }
    }

    /// Convert to musical key
    pub fn to_musical_key(&self) -> MusicalKey {
        let wheel = if self.is_major {
            &MAJOR_WHEEL
        } else {
            &MINOR_WHEEL
        };
        let pc = wheel
            .iter()
            .position(|&n| n == self.number)
            .unwrap_or(0) as u8;
        MusicalKey::from_pitch_class(pc, self.is_major)
    }

    /// Get display string (e.g., "8A", "12B")
    pub fn display(&self) -> String {
        format!("{}{}", self.number, if self.is_major { 'B' } else { 'A' })
    }

    /// Parse from string (e.g., "8A", "12B")
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.len() < 2 {
            return None;
        }

        let last = s.chars().last()?;
        let is_major = match last.to_ascii_uppercase() {
            'B' => true,
            'A' => false,
            _ => return None,
        };

        let num_part = &s[..s.len() - 1];
        let number: u8 = num_part.parse().ok()?;

        Self::new(number, is_major)
    }

    /// Check if two keys are harmonically compatible for mixing
    ///
    /// Compatible combinations:
    /// 1. Same key (8A ↔ 8A)
    /// 2. Adjacent on wheel, same letter (8A ↔ 7A, 8A ↔ 9A)
    /// 3. Same number, different letter (8A ↔ 8B)
    pub fn is_compatible(&self, other: &CamelotKey) -> bool {
        if self.number == other.number {
            return true;
        }
        if self.is_major != other.is_major {
            return false;
        }
        // 12 and 1 are neighbours
        let diff = (self.number as i8 - other.number as i8).abs();
        diff == 1 || diff == 11
    }
}

impl fmt::Display for CamelotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> MusicalKey {
        MusicalKey::parse_name(name).unwrap().0
    }

    #[test]
    fn test_camelot_from_musical_key() {
        assert_eq!(CamelotKey::from_musical_key(key("C")).display(), "8B");
        assert_eq!(CamelotKey::from_musical_key(key("Am")).display(), "8A");
        assert_eq!(CamelotKey::from_musical_key(key("G")).display(), "9B");
        assert_eq!(CamelotKey::from_musical_key(key("Em")).display(), "9A");
        assert_eq!(CamelotKey::from_musical_key(key("Db")).display(), "3B");
        assert_eq!(CamelotKey::from_musical_key(key("F#m")).display(), "11A");
    }

    #[test]
    fn test_wheel_tables_cover_every_position() {
        let mut major: Vec<u8> = MAJOR_WHEEL.to_vec();
        let mut minor: Vec<u8> = MINOR_WHEEL.to_vec();
        major.sort_unstable();
        minor.sort_unstable();
        assert_eq!(major, (1..=12).collect::<Vec<_>>());
        assert_eq!(minor, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn test_relative_minor_shares_number() {
        for pc in 0..12u8 {
            let major = MusicalKey::from_pitch_class(pc, true);
            let relative_minor = MusicalKey::from_pitch_class(pc + 9, false);
            assert_eq!(
                CamelotKey::from_musical_key(major).number,
                CamelotKey::from_musical_key(relative_minor).number
            );
        }
    }

    #[test]
    fn test_camelot_parse() {
        assert_eq!(CamelotKey::parse("8B"), CamelotKey::new(8, true));
        assert_eq!(CamelotKey::parse("12a"), CamelotKey::new(12, false));
        assert_eq!(CamelotKey::parse("13A"), None);
        assert_eq!(CamelotKey::parse("0B"), None);
        assert_eq!(CamelotKey::parse("invalid"), None);
    }

    #[test]
    fn test_parse_name_variants() {
        assert_eq!(
            MusicalKey::parse_name("F#m"),
            Some((MusicalKey::from_pitch_class(6, false), Some(Spelling::Sharp)))
        );
        assert_eq!(
            MusicalKey::parse_name("Bb"),
            Some((MusicalKey::from_pitch_class(10, true), Some(Spelling::Flat)))
        );
        assert_eq!(
            MusicalKey::parse_name("E minor"),
            Some((MusicalKey::from_pitch_class(4, false), None))
        );
        assert_eq!(
            MusicalKey::parse_name("Cb"),
            Some((MusicalKey::from_pitch_class(11, true), Some(Spelling::Flat)))
        );
        assert_eq!(MusicalKey::parse_name("H"), None);
        assert_eq!(MusicalKey::parse_name("Cx"), None);
        assert_eq!(MusicalKey::parse_name(""), None);
    }

    #[test]
    fn test_transpose_wraps() {
        let b = key("B");
        assert_eq!(b.transpose(1).root_pitch_class(), 0);
        assert_eq!(key("C").transpose(-1).root_pitch_class(), 11);
        assert_eq!(key("Am").transpose(12), key("Am"));
    }

    #[test]
    fn test_names_by_spelling() {
        let k = MusicalKey::from_pitch_class(1, false);
        assert_eq!(k.name(Spelling::Sharp), "C#m");
        assert_eq!(k.name(Spelling::Flat), "Dbm");
        assert_eq!(k.to_string(), "Dbm");
    }

    #[test]
    fn test_compatibility() {
        let am = CamelotKey::new(8, false).unwrap();
        assert!(am.is_compatible(&am));
        assert!(am.is_compatible(&CamelotKey::new(8, true).unwrap()));
        assert!(am.is_compatible(&CamelotKey::new(7, false).unwrap()));
        assert!(am.is_compatible(&CamelotKey::new(9, false).unwrap()));
        assert!(!am.is_compatible(&CamelotKey::new(3, false).unwrap()));
        assert!(!am.is_compatible(&CamelotKey::new(9, true).unwrap()));

        let one = CamelotKey::new(1, false).unwrap();
        let twelve = CamelotKey::new(12, false).unwrap();
        assert!(one.is_compatible(&twelve));
    }

    #[test]
    fn test_roundtrip_musical_key() {
        for pc in 0..12u8 {
            for is_major in [true, false] {
                let k = MusicalKey::from_pitch_class(pc, is_major);
                assert_eq!(CamelotKey::from_musical_key(k).to_musical_key(), k);
            }
        }
    }
}
