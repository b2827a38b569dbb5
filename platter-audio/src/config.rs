//! Deck tuning read from the application config file

use crate::mixer::CrossfaderLaw;
use platter_library::Config;

/// Scratch strategy selected in config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScratchModelKind {
    /// Platter angle maps straight onto a time offset
    #[default]
    Direct,
    /// Angular velocity drives the position, with coasting after release
    Momentum,
}

/// How a scratch begins and ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrabDetection {
    /// Touch and release events from the input device
    #[default]
    Explicit,
    /// Inferred from platter angular speed
    Motion,
}

/// Per-deck tuning
#[derive(Debug, Clone, PartialEq)]
pub struct DeckConfig {
    pub min_pitch: f32,
    pub max_pitch: f32,
    /// Pitch smoothing rate k (1/s)
    pub pitch_smoothing: f32,
    pub crossfader_law: CrossfaderLaw,
    pub scratch_model: ScratchModelKind,
    pub grab_detection: GrabDetection,
    /// Milliseconds of audio per degree of platter rotation
    pub scratch_sensitivity_ms: f32,
    /// Largest angular speed accepted while touched (deg/s)
    pub scratch_max_velocity: f32,
    /// Coasting deceleration (deg/s²)
    pub scratch_friction: f32,
    /// Speed below which coasting ends (deg/s)
    pub scratch_epsilon: f32,
    /// Nominal platter speed when the motor drives it (deg/s)
    pub motor_rate: f32,
    pub motor_enabled: bool,
    /// Angular speed that starts an inferred grab (deg/s)
    pub grab_threshold: f32,
    /// Angular speed that ends an inferred grab (deg/s)
    pub release_threshold: f32,
    /// Share of the release speed handed to coasting
    pub release_momentum: f32,
    /// Decay rate of the detector's own free spin (1/s)
    pub release_friction: f32,
    /// Seconds to wait for embedded cover art
    pub cover_timeout_secs: f32,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            min_pitch: 0.94,
            max_pitch: 1.06,
            pitch_smoothing: 3.0,
            crossfader_law: CrossfaderLaw::LinearDualRamp,
            scratch_model: ScratchModelKind::Direct,
            grab_detection: GrabDetection::Explicit,
            scratch_sensitivity_ms: 5.0,
            scratch_max_velocity: 2000.0,
            scratch_friction: 720.0,
            scratch_epsilon: 1.0,
            motor_rate: 200.0,
            motor_enabled: true,
            grab_threshold: 5.0,
            release_threshold: 1.0,
            release_momentum: 0.4,
            release_friction: 1.4,
            cover_timeout_secs: 5.0,
        }
    }
}

impl DeckConfig {
    /// Read deck settings, keeping defaults for missing or bad values
    pub fn from_config(config: &Config) -> Self {
        let mut deck = Self::default();

        macro_rules! read {
            ($field:ident) => {
                if let Some(value) = config.get_parsed(stringify!($field)) {
                    deck.$field = value;
                }
            };
        }

        read!(min_pitch);
        read!(max_pitch);
        read!(pitch_smoothing);
        read!(scratch_sensitivity_ms);
        read!(scratch_max_velocity);
        read!(scratch_friction);
        read!(scratch_epsilon);
        read!(motor_rate);
        read!(motor_enabled);
        read!(grab_threshold);
        read!(release_threshold);
        read!(release_momentum);
        read!(release_friction);
        read!(cover_timeout_secs);

        let exponent = config.get_parsed("crossfader_exponent").unwrap_or(1.0);
        if let Some(name) = config.get("crossfader_law") {
            match CrossfaderLaw::from_name(name, exponent) {
                Some(law) => deck.crossfader_law = law,
                None => tracing::warn!(value = name, "unknown crossfader_law"),
            }
        }

        if let Some(name) = config.get("scratch_model") {
            match name.trim().to_ascii_lowercase().as_str() {
                "direct" => deck.scratch_model = ScratchModelKind::Direct,
                "momentum" => deck.scratch_model = ScratchModelKind::Momentum,
                _ => tracing::warn!(value = name, "unknown scratch_model"),
            }
        }

        if let Some(name) = config.get("grab_detection") {
            match name.trim().to_ascii_lowercase().as_str() {
                "explicit" => deck.grab_detection = GrabDetection::Explicit,
                "motion" => deck.grab_detection = GrabDetection::Motion,
                _ => tracing::warn!(value = name, "unknown grab_detection"),
            }
        }

        deck.sanitize();
        deck
    }

    /// Write every deck setting back into `config`
    pub fn write_to(&self, config: &mut Config) {
        config.set("min_pitch", self.min_pitch);
        config.set("max_pitch", self.max_pitch);
        config.set("pitch_smoothing", self.pitch_smoothing);
        config.set("crossfader_law", self.crossfader_law.name());
        if let CrossfaderLaw::PowerCurve { exponent } = self.crossfader_law {
            config.set("crossfader_exponent", exponent);
        }
        config.set(
            "scratch_model",
            match self.scratch_model {
                ScratchModelKind::Direct => "direct",
                ScratchModelKind::Momentum => "momentum",
            },
        );
        config.set(
            "grab_detection",
            match self.grab_detection {
                GrabDetection::Explicit => "explicit",
                GrabDetection::Motion => "motion",
            },
        );
        config.set("scratch_sensitivity_ms", self.scratch_sensitivity_ms);
        config.set("scratch_max_velocity", self.scratch_max_velocity);
        config.set("scratch_friction", self.scratch_friction);
        config.set("scratch_epsilon", self.scratch_epsilon);
        config.set("motor_rate", self.motor_rate);
        config.set("motor_enabled", self.motor_enabled);
        config.set("grab_threshold", self.grab_threshold);
        config.set("release_threshold", self.release_threshold);
        config.set("release_momentum", self.release_momentum);
        config.set("release_friction", self.release_friction);
        config.set("cover_timeout_secs", self.cover_timeout_secs);
    }

    /// Repair settings that would break the pitch invariant
    pub(crate) fn sanitize(&mut self) {
        let defaults = Self::default();
        let valid_range = self.min_pitch.is_finite()
            && self.max_pitch.is_finite()
            && self.min_pitch > 0.0
            && self.min_pitch <= 1.0
            && self.max_pitch >= 1.0;
        if !valid_range {
            tracing::warn!(
                min = self.min_pitch,
                max = self.max_pitch,
                "invalid pitch range, using defaults"
            );
            self.min_pitch = defaults.min_pitch;
            self.max_pitch = defaults.max_pitch;
        }
        if !(self.pitch_smoothing.is_finite() && self.pitch_smoothing > 0.0) {
            self.pitch_smoothing = defaults.pitch_smoothing;
        }
        if !(self.release_threshold <= self.grab_threshold) {
            tracing::warn!("release_threshold above grab_threshold, using defaults");
            self.grab_threshold = defaults.grab_threshold;
            self.release_threshold = defaults.release_threshold;
        }
    }
}
