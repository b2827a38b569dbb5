//! Momentum scratching
//!
//! Models:
//! - Hand drag: platter rotation moves the playhead by samples-per-degree
//! - Release: the platter keeps spinning and slows under constant friction
//! - Settle: below a small speed the motor takes over again

use super::{angle_delta, Coast, ScratchModel};
use crate::config::DeckConfig;

/// Velocity-driven scratch model with coasting after release
#[derive(Debug, Clone)]
pub struct MomentumScratch {
    // Physics parameters
    max_velocity: f32, // deg/s while touched
    friction: f32,     // deg/s² while coasting
    epsilon: f32,      // deg/s, coasting ends below this

    // Calibration, taken once per play
    samples_per_degree: f64,
    sample_rate: f64,
    total_samples: f64,

    // State
    position_samples: f64,
    last_angle: f32,
    velocity: f32,
    touched: bool,
    coasting: bool,
}

impl MomentumScratch {
    pub fn new(max_velocity: f32, friction: f32, epsilon: f32) -> Self {
        Self {
            max_velocity: max_velocity.abs(),
            friction: friction.abs(),
            epsilon: epsilon.abs(),
            samples_per_degree: 0.0,
            sample_rate: 0.0,
            total_samples: 0.0,
            position_samples: 0.0,
            last_angle: 0.0,
            velocity: 0.0,
            touched: false,
            coasting: false,
        }
    }

    pub fn from_config(config: &DeckConfig) -> Self {
        Self::new(
            config.scratch_max_velocity,
            config.scratch_friction,
            config.scratch_epsilon,
        )
    }

    /// Samples of audio per degree of rotation
    pub fn samples_per_degree(&self) -> f64 {
        self.samples_per_degree
    }

    pub fn is_coasting(&self) -> bool {
        self.coasting
    }

    fn advance_degrees(&mut self, degrees: f64) {
        self.position_samples = (self.position_samples + degrees * self.samples_per_degree)
            .clamp(0.0, self.total_samples);
    }
}

impl ScratchModel for MomentumScratch {
    fn calibrate(&mut self, length_ms: f64, sample_rate: u32) {
        self.sample_rate = sample_rate as f64;
        self.total_samples = (length_ms.max(0.0) * self.sample_rate / 1000.0).max(0.0);
        // One revolution spans the whole track
        self.samples_per_degree = self.total_samples / 360.0;
    }

    fn begin(&mut self, angle: f32, position_ms: f64) {
        self.position_samples =
            (position_ms * self.sample_rate / 1000.0).clamp(0.0, self.total_samples);
        self.last_angle = angle;
        self.velocity = 0.0;
        self.touched = true;
        self.coasting = false;
    }

    fn update(&mut self, angle: f32, dt: f32) -> f64 {
        if !self.touched {
            return self.position_ms();
        }
        let delta = angle_delta(self.last_angle, angle);
        self.last_angle = angle;
        if dt > 0.0 {
            self.velocity = (delta / dt).clamp(-self.max_velocity, self.max_velocity);
        }
        self.advance_degrees(delta as f64);
        self.position_ms()
    }

    fn end(&mut self, release_velocity: Option<f32>) {
        if let Some(v) = release_velocity.filter(|v| v.is_finite()) {
            self.velocity = v.clamp(-self.max_velocity, self.max_velocity);
        }
        self.touched = false;
        self.coasting = true;
    }

    fn coast(&mut self, dt: f32) -> Coast {
        if !self.coasting {
            return Coast::Idle;
        }
        if self.velocity.abs() <= self.epsilon {
            self.coasting = false;
            self.velocity = 0.0;
            return Coast::Settled {
                position_ms: self.position_ms(),
            };
        }

        self.advance_degrees(self.velocity as f64 * dt.max(0.0) as f64);

        // Linear friction, never past zero
        let slowdown = self.friction * dt.max(0.0);
        self.velocity = if self.velocity.abs() <= slowdown {
            0.0
        } else {
            self.velocity - slowdown * self.velocity.signum()
        };

        Coast::Spinning {
            position_ms: self.position_ms(),
        }
    }

    fn cancel(&mut self) {
        self.velocity = 0.0;
        self.touched = false;
        self.coasting = false;
    }

    fn position_ms(&self) -> f64 {
        if self.sample_rate <= 0.0 {
            return 0.0;
        }
        self.position_samples * 1000.0 / self.sample_rate
    }

    fn velocity(&self) -> f32 {
        self.velocity
    }

    fn name(&self) -> &'static str {
        "momentum"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 36 s at 10 kHz: 1000 samples (100 ms) per degree
    fn scratch() -> MomentumScratch {
        let mut s = MomentumScratch::new(2000.0, 720.0, 1.0);
        s.calibrate(36_000.0, 10_000);
        s
    }

    #[test]
    fn test_calibration() {
        assert_eq!(scratch().samples_per_degree(), 1000.0);
    }

    #[test]
    fn test_touched_moves_by_samples_per_degree() {
        let mut s = scratch();
        s.begin(0.0, 1000.0);
        assert!((s.update(2.0, 0.01) - 1200.0).abs() < 1e-9);
        assert!((s.velocity() - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_velocity_is_clamped() {
        let mut s = scratch();
        s.begin(0.0, 10_000.0);
        s.update(90.0, 0.001);
        assert_eq!(s.velocity(), 2000.0);
        s.update(0.0, 0.001);
        assert_eq!(s.velocity(), -2000.0);
    }

    #[test]
    fn test_coast_decays_without_overshoot() {
        let mut s = scratch();
        s.begin(0.0, 10_000.0);
        s.end(Some(100.0));

        let mut last = f64::MIN;
        let mut settled = None;
        for _ in 0..100 {
            match s.coast(0.05) {
                Coast::Spinning { position_ms } => {
                    assert!(position_ms >= last);
                    assert!(s.velocity() >= 0.0);
                    last = position_ms;
                }
                Coast::Settled { position_ms } => {
                    settled = Some(position_ms);
                    break;
                }
                Coast::Idle => unreachable!(),
            }
        }
        assert!(settled.is_some());
        assert_eq!(s.velocity(), 0.0);
        assert_eq!(s.coast(0.05), Coast::Idle);
    }

    #[test]
    fn test_negative_spin_slows_toward_zero() {
        let mut s = scratch();
        s.begin(0.0, 30_000.0);
        s.end(Some(-50.0));
        s.coast(0.05);
        assert!((s.velocity() + 14.0).abs() < 1e-3);
        s.coast(0.05);
        assert_eq!(s.velocity(), 0.0);
    }

    #[test]
    fn test_release_keeps_measured_velocity() {
        let mut s = scratch();
        s.begin(0.0, 1000.0);
        s.update(3.0, 0.01);
        s.end(None);
        assert!((s.velocity() - 300.0).abs() < 1e-3);
        assert!(s.is_coasting());
    }

    #[test]
    fn test_position_clamped_to_track() {
        let mut s = scratch();
        s.begin(0.0, 100.0);
        assert_eq!(s.update(-10.0, 0.01), 0.0);
    }
}
