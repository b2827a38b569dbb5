//! Control surface mapping for Platter
//!
//! Knob angles, slider and fader travel, buttons and platter touches are
//! turned into [`platter_audio::AudioCommand`]s for the console.

mod controls;
mod surface;

pub use controls::{
    fader_to_value, knob_angle_to_value, pitch_slider_to_ratio, KnobKind, SliderRole,
    CHANGE_EPSILON, KNOB_MAX_ANGLE, KNOB_MIN_ANGLE, PITCH_SLIDER_SPAN,
};
pub use surface::{Button, SurfaceEvent, SurfaceHandler, SurfaceLayout};
