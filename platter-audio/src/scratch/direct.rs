//! Direct-angle scratching: platter rotation maps straight onto time

use super::{angle_delta, Coast, ScratchModel};

/// Platter angle to playback offset, anchored at the grab point
#[derive(Debug, Clone)]
pub struct DirectScratch {
    /// Milliseconds per degree (5 ms/° is roughly 33⅓ rpm)
    sensitivity_ms: f32,
    length_ms: f64,
    /// Position when the grab began (or after the last release)
    anchor_ms: f64,
    /// Offset accumulated since the grab began
    accumulated_ms: f64,
    last_angle: f32,
    velocity: f32,
    held: bool,
}

impl DirectScratch {
    pub fn new(sensitivity_ms: f32) -> Self {
        Self {
            sensitivity_ms,
            length_ms: 0.0,
            anchor_ms: 0.0,
            accumulated_ms: 0.0,
            last_angle: 0.0,
            velocity: 0.0,
            held: false,
        }
    }

    pub fn anchor_ms(&self) -> f64 {
        self.anchor_ms
    }

    pub fn accumulated_ms(&self) -> f64 {
        self.accumulated_ms
    }

    fn position(&self) -> f64 {
        (self.anchor_ms + self.accumulated_ms).clamp(0.0, self.length_ms.max(0.0))
    }
}

impl ScratchModel for DirectScratch {
    fn calibrate(&mut self, length_ms: f64, _sample_rate: u32) {
        self.length_ms = length_ms;
    }

    fn begin(&mut self, angle: f32, position_ms: f64) {
        self.anchor_ms = position_ms.clamp(0.0, self.length_ms.max(0.0));
        self.accumulated_ms = 0.0;
        self.last_angle = angle;
        self.velocity = 0.0;
        self.held = true;
    }

    fn update(&mut self, angle: f32, dt: f32) -> f64 {
        if !self.held {
            return self.position();
        }
        let delta = angle_delta(self.last_angle, angle);
        self.last_angle = angle;
        if dt > 0.0 {
            self.velocity = delta / dt;
        }
        self.accumulated_ms += delta as f64 * self.sensitivity_ms as f64;

        // Keep the accumulator from running past either end of the track
        let position = self.position();
        self.accumulated_ms = position - self.anchor_ms;
        position
    }

    fn end(&mut self, _release_velocity: Option<f32>) {
        self.anchor_ms = self.position();
        self.accumulated_ms = 0.0;
        self.velocity = 0.0;
        self.held = false;
    }

    fn coast(&mut self, _dt: f32) -> Coast {
        Coast::Idle
    }

    fn cancel(&mut self) {
        self.accumulated_ms = 0.0;
        self.velocity = 0.0;
        self.held = false;
    }

    fn position_ms(&self) -> f64 {
        self.position()
    }

    fn velocity(&self) -> f32 {
        self.velocity
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_at(position_ms: f64) -> DirectScratch {
        let mut scratch = DirectScratch::new(5.0);
        scratch.calibrate(10_000.0, 44100);
        scratch.begin(90.0, position_ms);
        scratch
    }

    #[test]
    fn test_forward_ten_degrees() {
        let mut scratch = scratch_at(1000.0);
        assert_eq!(scratch.update(100.0, 0.016), 1050.0);
    }

    #[test]
    fn test_backward_across_zero() {
        let mut scratch = DirectScratch::new(5.0);
        scratch.calibrate(10_000.0, 44100);
        scratch.begin(5.0, 1000.0);
        assert_eq!(scratch.update(355.0, 0.016), 950.0);
    }

    #[test]
    fn test_clamped_at_both_ends() {
        let mut scratch = scratch_at(20.0);
        assert_eq!(scratch.update(80.0, 0.016), 0.0);
        // The clamp does not bank overshoot: moving forward again leaves 0 at once
        assert_eq!(scratch.update(82.0, 0.016), 10.0);

        let mut scratch = scratch_at(9_990.0);
        assert_eq!(scratch.update(100.0, 0.016), 10_000.0);
    }

    #[test]
    fn test_release_folds_offset_into_anchor() {
        let mut scratch = scratch_at(1000.0);
        scratch.update(110.0, 0.016);
        scratch.end(None);
        assert_eq!(scratch.anchor_ms(), 1100.0);
        assert_eq!(scratch.accumulated_ms(), 0.0);
        assert_eq!(scratch.coast(0.016), Coast::Idle);
    }

    #[test]
    fn test_accumulates_over_many_updates() {
        let mut scratch = scratch_at(1000.0);
        let mut angle = 90.0;
        for _ in 0..36 {
            angle += 10.0;
            scratch.update(angle % 360.0, 0.016);
        }
        // A full forward revolution
        assert!((scratch.update(angle % 360.0, 0.016) - 2800.0).abs() < 1e-3);
    }
}
