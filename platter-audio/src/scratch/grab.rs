//! Grab detection: explicit touch events or inferred from platter motion

use super::{angle_delta, GrabDetector, GrabSignal};
use crate::config::DeckConfig;

/// Free spin below this speed (deg/s) is treated as stopped
const SPIN_FLOOR: f32 = 0.1;

/// Grab driven by touch and release events
#[derive(Debug, Clone, Default)]
pub struct ExplicitGrab {
    grabbed: bool,
}

impl ExplicitGrab {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GrabDetector for ExplicitGrab {
    fn on_touch(&mut self, angle: f32) -> Option<GrabSignal> {
        if self.grabbed {
            return None;
        }
        self.grabbed = true;
        Some(GrabSignal::Begin { angle })
    }

    fn on_release(&mut self) -> Option<GrabSignal> {
        if !self.grabbed {
            return None;
        }
        self.grabbed = false;
        Some(GrabSignal::End {
            release_velocity: None,
        })
    }

    fn on_angle(&mut self, angle: f32, dt: f32) -> Option<GrabSignal> {
        self.grabbed.then_some(GrabSignal::Move { angle, dt })
    }

    fn is_grabbed(&self) -> bool {
        self.grabbed
    }

    fn name(&self) -> &'static str {
        "explicit"
    }
}

/// Grab inferred from how fast the platter turns.
///
/// Hand motion faster than the grab threshold starts a scratch; slower than
/// the release threshold ends it. The platter's own free spin after a
/// release is tracked and subtracted, so a coasting platter does not read
/// as a new grab.
#[derive(Debug, Clone)]
pub struct MotionGrab {
    grab_threshold: f32,
    release_threshold: f32,
    momentum_multiplier: f32,
    release_friction: f32,

    last_angle: Option<f32>,
    /// Hand speed on the last moving sample (deg/s)
    hand_velocity: f32,
    /// Free-spin speed left over from the last release (deg/s)
    spin_velocity: f32,
    grabbed: bool,
}

impl MotionGrab {
    pub fn new(
        grab_threshold: f32,
        release_threshold: f32,
        momentum_multiplier: f32,
        release_friction: f32,
    ) -> Self {
        Self {
            grab_threshold,
            release_threshold,
            momentum_multiplier,
            release_friction,
            last_angle: None,
            hand_velocity: 0.0,
            spin_velocity: 0.0,
            grabbed: false,
        }
    }

    pub fn from_config(config: &DeckConfig) -> Self {
        Self::new(
            config.grab_threshold,
            config.release_threshold,
            config.release_momentum,
            config.release_friction,
        )
    }

    /// Current free-spin speed (deg/s)
    pub fn spin_velocity(&self) -> f32 {
        self.spin_velocity
    }

    fn decay_spin(&mut self, dt: f32) {
        if self.spin_velocity.abs() > SPIN_FLOOR {
            let t = (dt * self.release_friction).clamp(0.0, 1.0);
            self.spin_velocity -= self.spin_velocity * t;
        } else {
            self.spin_velocity = 0.0;
        }
    }
}

impl GrabDetector for MotionGrab {
    // Touch events carry no information here; motion decides
    fn on_touch(&mut self, angle: f32) -> Option<GrabSignal> {
        self.last_angle.get_or_insert(angle);
        None
    }

    fn on_release(&mut self) -> Option<GrabSignal> {
        None
    }

    fn on_angle(&mut self, angle: f32, dt: f32) -> Option<GrabSignal> {
        let last = self.last_angle.replace(angle)?;
        if dt <= 0.0 {
            return None;
        }

        let observed = angle_delta(last, angle);
        let hand = if self.grabbed {
            observed
        } else {
            observed - self.spin_velocity * dt
        };
        let speed = hand / dt;

        if !self.grabbed {
            if speed.abs() > self.grab_threshold {
                self.grabbed = true;
                self.spin_velocity = 0.0;
                self.hand_velocity = speed;
                tracing::debug!(speed, "motion grab");
                return Some(GrabSignal::Begin { angle });
            }
            self.decay_spin(dt);
            return None;
        }

        if speed.abs() < self.release_threshold {
            self.grabbed = false;
            let release = self.hand_velocity * self.momentum_multiplier;
            self.spin_velocity = release;
            self.hand_velocity = 0.0;
            tracing::debug!(release, "motion release");
            return Some(GrabSignal::End {
                release_velocity: Some(release),
            });
        }

        self.hand_velocity = speed;
        Some(GrabSignal::Move { angle, dt })
    }

    fn is_grabbed(&self) -> bool {
        self.grabbed
    }

    fn name(&self) -> &'static str {
        "motion"
    }
}
