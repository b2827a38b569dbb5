//! Control value to engine parameter mapping
//!
//! Pure functions: every input is a normalized control value and is clamped
//! to [0, 1] before use.

/// EQ range in dB at either end of a knob
pub const EQ_RANGE_DB: f32 = 12.0;

/// Filter sweep corner frequencies (Hz)
pub const FILTER_MIN_HZ: f32 = 80.0;
pub const LOW_PASS_MAX_HZ: f32 = 22000.0;
pub const HIGH_PASS_MAX_HZ: f32 = 4000.0;

/// EQ band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EqBand {
    Low,
    Mid,
    High,
}

impl EqBand {
    /// Array index for per-band storage
    pub fn index(self) -> usize {
        match self {
            EqBand::Low => 0,
            EqBand::Mid => 1,
            EqBand::High => 2,
        }
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp a control value into [0, 1]; NaN maps to 0
#[inline]
pub fn normalize(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// EQ gain for a knob value: 0 → -12 dB, 0.5 → 0 dB, 1 → +12 dB
pub fn eq_gain_db(knob: f32) -> f32 {
    lerp(-EQ_RANGE_DB, EQ_RANGE_DB, normalize(knob))
}

/// State of the two sweep filters for one knob position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSweep {
    /// Low-pass cutoff when active
    pub low_pass: Option<f32>,
    /// High-pass cutoff when active
    pub high_pass: Option<f32>,
}

impl FilterSweep {
    pub const BYPASSED: Self = Self {
        low_pass: None,
        high_pass: None,
    };

    /// Map a filter knob: centre bypasses both filters, left of centre
    /// sweeps the low-pass, right of centre sweeps the high-pass.
    pub fn from_knob(knob: f32) -> Self {
        let v = normalize(knob);
        if v < 0.5 {
            let t = v / 0.5;
            Self {
                low_pass: Some(lerp(FILTER_MIN_HZ, LOW_PASS_MAX_HZ, t * t)),
                high_pass: None,
            }
        } else if v > 0.5 {
            let t = (v - 0.5) / 0.5;
            Self {
                low_pass: None,
                high_pass: Some(lerp(FILTER_MIN_HZ, HIGH_PASS_MAX_HZ, t * t)),
            }
        } else {
            Self::BYPASSED
        }
    }

    pub fn is_bypassed(&self) -> bool {
        self.low_pass.is_none() && self.high_pass.is_none()
    }
}

/// Linear gain for a ReplayGain value in dB; non-finite input is neutral
pub fn replay_gain_factor(db: f32) -> f32 {
    if !db.is_finite() {
        return 1.0;
    }
    10f32.powf(db / 20.0)
}

/// Volume sent to the engine: base and crossfade are clamped, replaygain
/// may boost above unity
pub fn final_volume(base: f32, crossfade: f32, replay_gain: f32) -> f32 {
    normalize(base) * normalize(crossfade) * replay_gain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq_gain_range() {
        assert_eq!(eq_gain_db(0.0), -12.0);
        assert_eq!(eq_gain_db(0.5), 0.0);
        assert_eq!(eq_gain_db(1.0), 12.0);
        assert_eq!(eq_gain_db(-3.0), -12.0);
        assert_eq!(eq_gain_db(7.0), 12.0);
    }

    #[test]
    fn test_filter_centre_bypasses_both() {
        assert!(FilterSweep::from_knob(0.5).is_bypassed());
    }

    #[test]
    fn test_filter_exactly_one_active() {
        for i in 0..=100 {
            let v = i as f32 / 100.0;
            let sweep = FilterSweep::from_knob(v);
            if v == 0.5 {
                assert!(sweep.is_bypassed());
            } else {
                assert!(sweep.low_pass.is_some() ^ sweep.high_pass.is_some(), "v={}", v);
            }
        }
    }

    #[test]
    fn test_filter_sweep_endpoints() {
        assert_eq!(FilterSweep::from_knob(0.0).low_pass, Some(80.0));
        assert_eq!(FilterSweep::from_knob(1.0).high_pass, Some(4000.0));

        // Quadratic: a quarter of the way in is 1/16th of the range
        let lp = FilterSweep::from_knob(0.125).low_pass.unwrap();
        assert!((lp - (80.0 + 21920.0 / 16.0)).abs() < 0.01);

        // Just below centre the low-pass is nearly wide open
        let lp = FilterSweep::from_knob(0.499).low_pass.unwrap();
        assert!(lp > 21000.0);
    }

    #[test]
    fn test_replay_gain_factor() {
        assert_eq!(replay_gain_factor(0.0), 1.0);
        assert!((replay_gain_factor(-6.0) - 0.501).abs() < 0.001);
        assert!((replay_gain_factor(6.0) - 1.995).abs() < 0.001);
        assert_eq!(replay_gain_factor(f32::NAN), 1.0);
    }

    #[test]
    fn test_final_volume_chain() {
        assert_eq!(final_volume(0.5, 0.5, 1.0), 0.25);
        assert_eq!(final_volume(2.0, 1.0, 1.0), 1.0);
        assert_eq!(final_volume(1.0, -1.0, 1.0), 0.0);
        // ReplayGain boost is not clamped
        assert!(final_volume(1.0, 1.0, 2.0) > 1.0);
    }
}
