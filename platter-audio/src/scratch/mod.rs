//! Platter scratch physics
//!
//! A [`ScratchModel`] turns platter angles into playback positions while the
//! record is held (and, for the momentum model, while it coasts after
//! release). A [`GrabDetector`] decides when a hold begins and ends, either
//! from explicit touch events or from the platter's own motion.
//!
//! Angles are in degrees, positions in milliseconds.

mod direct;
mod grab;
mod momentum;

pub use direct::DirectScratch;
pub use grab::{ExplicitGrab, MotionGrab};
pub use momentum::MomentumScratch;

use crate::config::{DeckConfig, GrabDetection, ScratchModelKind};

/// Shortest signed angle from `from` to `to`, in [-180, 180)
pub fn angle_delta(from: f32, to: f32) -> f32 {
    wrap_degrees(to - from)
}

/// Wrap an angle difference into [-180, 180)
pub fn wrap_degrees(delta: f32) -> f32 {
    if !delta.is_finite() {
        return 0.0;
    }
    let wrapped = (delta + 180.0).rem_euclid(360.0);
    // rem_euclid can round a tiny negative up to exactly 360
    if wrapped >= 360.0 {
        -180.0
    } else {
        wrapped - 180.0
    }
}

/// What a released platter is doing on this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coast {
    /// Nothing to do; the model is not coasting
    Idle,
    /// Still spinning freely; playback belongs at this position
    Spinning { position_ms: f64 },
    /// The spin died out at this position
    Settled { position_ms: f64 },
}

/// Angle-to-position strategy
pub trait ScratchModel: Send {
    /// Track geometry, taken when playback starts
    fn calibrate(&mut self, length_ms: f64, sample_rate: u32);

    /// Hand on the platter at `angle` while playback sits at `position_ms`
    fn begin(&mut self, angle: f32, position_ms: f64);

    /// Platter moved to `angle`; returns the new playback position
    fn update(&mut self, angle: f32, dt: f32) -> f64;

    /// Hand off. `release_velocity` (deg/s) overrides the measured speed.
    fn end(&mut self, release_velocity: Option<f32>);

    /// Advance a released platter by `dt` seconds
    fn coast(&mut self, dt: f32) -> Coast;

    /// Drop any held or coasting motion
    fn cancel(&mut self);

    /// Playback position the model currently points at
    fn position_ms(&self) -> f64;

    /// Current angular velocity (deg/s)
    fn velocity(&self) -> f32;

    fn name(&self) -> &'static str;
}

/// Grab lifecycle event produced by a detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrabSignal {
    Begin { angle: f32 },
    Move { angle: f32, dt: f32 },
    End { release_velocity: Option<f32> },
}

/// Decides when the record is held
pub trait GrabDetector: Send {
    /// Touch event from an input device
    fn on_touch(&mut self, angle: f32) -> Option<GrabSignal>;

    /// Release event from an input device
    fn on_release(&mut self) -> Option<GrabSignal>;

    /// Platter angle sample
    fn on_angle(&mut self, angle: f32, dt: f32) -> Option<GrabSignal>;

    fn is_grabbed(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// Build the scratch model selected in config
pub fn model_for(config: &DeckConfig) -> Box<dyn ScratchModel> {
    match config.scratch_model {
        ScratchModelKind::Direct => Box::new(DirectScratch::new(config.scratch_sensitivity_ms)),
        ScratchModelKind::Momentum => Box::new(MomentumScratch::from_config(config)),
    }
}

/// Build the grab detector selected in config
pub fn detector_for(config: &DeckConfig) -> Box<dyn GrabDetector> {
    match config.grab_detection {
        GrabDetection::Explicit => Box::new(ExplicitGrab::new()),
        GrabDetection::Motion => Box::new(MotionGrab::from_config(config)),
    }
}
