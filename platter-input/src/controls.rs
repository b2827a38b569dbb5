//! Control definitions and raw-value mapping

use platter_audio::{AudioCommand, DeckId, EqBand};

/// Knob travel end stops, degrees
pub const KNOB_MIN_ANGLE: f32 = -135.0;
pub const KNOB_MAX_ANGLE: f32 = 135.0;

/// Pitch slider span: full travel covers ±6%
pub const PITCH_SLIDER_SPAN: f32 = 0.12;

/// Changes smaller than this are not forwarded
pub const CHANGE_EPSILON: f32 = 0.0001;

/// Rotary knob kinds on a deck strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnobKind {
    EqHigh,
    EqMid,
    EqLow,
    /// Filter sweep
    Fx,
}

type KnobMapping = fn(DeckId, f32) -> AudioCommand;

const KNOB_TABLE: [(KnobKind, KnobMapping); 4] = [
    (KnobKind::EqHigh, |deck, v| AudioCommand::SetEq(deck, EqBand::High, v)),
    (KnobKind::EqMid, |deck, v| AudioCommand::SetEq(deck, EqBand::Mid, v)),
    (KnobKind::EqLow, |deck, v| AudioCommand::SetEq(deck, EqBand::Low, v)),
    (KnobKind::Fx, |deck, v| AudioCommand::SetFilter(deck, v)),
];

impl KnobKind {
    /// Command for a knob value in [0, 1]
    pub fn command(self, deck: DeckId, value: f32) -> AudioCommand {
        let (_, mapping) = KNOB_TABLE[self as usize];
        mapping(deck, value)
    }
}

/// Linear slider roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliderRole {
    /// Tempo fader
    Pitch,
    /// Channel volume fader
    Volume,
}

impl SliderRole {
    pub fn command(self, deck: DeckId, value: f32) -> AudioCommand {
        match self {
            SliderRole::Pitch => AudioCommand::SetPitch(deck, pitch_slider_to_ratio(value)),
            SliderRole::Volume => AudioCommand::SetVolume(deck, value),
        }
    }
}

/// Position of `x` between `a` and `b`, clamped to [0, 1]
fn inverse_lerp(a: f32, b: f32, x: f32) -> f32 {
    if a == b || !x.is_finite() {
        return 0.0;
    }
    ((x - a) / (b - a)).clamp(0.0, 1.0)
}

/// Knob rotation to a value in [0, 1]
pub fn knob_angle_to_value(angle: f32, min_angle: f32, max_angle: f32) -> f32 {
    inverse_lerp(min_angle, max_angle, angle)
}

/// Pitch slider value in [0, 1] to a tempo ratio; the centre is 1.0
pub fn pitch_slider_to_ratio(value: f32) -> f32 {
    1.0 + (value.clamp(0.0, 1.0) - 0.5) * PITCH_SLIDER_SPAN
}

/// Fader travel along its axis to a value in [0, 1]
pub fn fader_to_value(position: f32, length: f32) -> f32 {
    inverse_lerp(0.0, length, position)
}
