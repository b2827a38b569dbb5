//! Crossfader laws and the console crossfader

/// Smallest exponent accepted by the power law
pub const MIN_EXPONENT: f32 = 0.01;

/// Crossfader law: how one fader position splits into per-deck factors
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CrossfaderLaw {
    /// Both decks at full level in the middle; each side ramps down only
    /// over its own half of the throw
    #[default]
    LinearDualRamp,
    /// `t = v^p`, left = 1 - t, right = t
    PowerCurve { exponent: f32 },
}

impl CrossfaderLaw {
    /// Power law with the exponent floored to [`MIN_EXPONENT`]
    pub fn power(exponent: f32) -> Self {
        let exponent = if exponent.is_finite() {
            exponent.max(MIN_EXPONENT)
        } else {
            1.0
        };
        CrossfaderLaw::PowerCurve { exponent }
    }

    /// Parse a config name (`linear` or `power`)
    pub fn from_name(name: &str, exponent: f32) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "linear" => Some(CrossfaderLaw::LinearDualRamp),
            "power" => Some(CrossfaderLaw::power(exponent)),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CrossfaderLaw::LinearDualRamp => "linear",
            CrossfaderLaw::PowerCurve { .. } => "power",
        }
    }

    /// Split a fader position into (left, right) factors
    pub fn factors(&self, value: f32) -> (f32, f32) {
        let v = crate::params::normalize(value);
        match *self {
            CrossfaderLaw::LinearDualRamp => {
                if v < 0.5 {
                    (1.0, 2.0 * v)
                } else {
                    (2.0 * (1.0 - v), 1.0)
                }
            }
            CrossfaderLaw::PowerCurve { exponent } => {
                let t = v.powf(exponent.max(MIN_EXPONENT));
                (1.0 - t, t)
            }
        }
    }
}

/// Console crossfader feeding the two decks' crossfade factors
#[derive(Debug, Clone)]
pub struct Crossfader {
    /// Fader position (0.0 = full left deck, 1.0 = full right deck)
    position: f32,
    law: CrossfaderLaw,
}

impl Default for Crossfader {
    fn default() -> Self {
        Self {
            position: 0.5,
            law: CrossfaderLaw::default(),
        }
    }
}

impl Crossfader {
    pub fn new(law: CrossfaderLaw) -> Self {
        Self {
            law,
            ..Self::default()
        }
    }

    /// Set fader position (0.0 to 1.0)
    pub fn set_position(&mut self, position: f32) {
        self.position = crate::params::normalize(position);
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    /// Center the crossfader
    pub fn center(&mut self) {
        self.position = 0.5;
    }

    pub fn set_law(&mut self, law: CrossfaderLaw) {
        self.law = law;
    }

    pub fn law(&self) -> CrossfaderLaw {
        self.law
    }

    /// Current (left, right) factors
    pub fn factors(&self) -> (f32, f32) {
        self.law.factors(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAWS: [CrossfaderLaw; 3] = [
        CrossfaderLaw::LinearDualRamp,
        CrossfaderLaw::PowerCurve { exponent: 1.0 },
        CrossfaderLaw::PowerCurve { exponent: 2.0 },
    ];

    #[test]
    fn test_endpoints() {
        for law in LAWS {
            assert_eq!(law.factors(0.0), (1.0, 0.0), "{:?}", law);
            assert_eq!(law.factors(1.0), (0.0, 1.0), "{:?}", law);
        }
    }

    #[test]
    fn test_midpoints() {
        assert_eq!(CrossfaderLaw::LinearDualRamp.factors(0.5), (1.0, 1.0));
        assert_eq!(CrossfaderLaw::power(1.0).factors(0.5), (0.5, 0.5));
        let (l, r) = CrossfaderLaw::power(2.0).factors(0.5);
        assert!((l - 0.75).abs() < 1e-6 && (r - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_linear_ramps() {
        assert_eq!(CrossfaderLaw::LinearDualRamp.factors(0.25), (1.0, 0.5));
        assert_eq!(CrossfaderLaw::LinearDualRamp.factors(0.75), (0.5, 1.0));
    }

    #[test]
    fn test_continuity() {
        for law in LAWS {
            let mut prev = law.factors(0.0);
            for i in 1..=1000 {
                let next = law.factors(i as f32 / 1000.0);
                assert!((next.0 - prev.0).abs() < 0.01, "{:?} left jump at {}", law, i);
                assert!((next.1 - prev.1).abs() < 0.01, "{:?} right jump at {}", law, i);
                prev = next;
            }
        }
    }

    #[test]
    fn test_exponent_floor() {
        assert_eq!(
            CrossfaderLaw::power(0.0),
            CrossfaderLaw::PowerCurve { exponent: MIN_EXPONENT }
        );
        assert_eq!(
            CrossfaderLaw::power(-4.0),
            CrossfaderLaw::PowerCurve { exponent: MIN_EXPONENT }
        );
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            CrossfaderLaw::from_name("Linear", 3.0),
            Some(CrossfaderLaw::LinearDualRamp)
        );
        assert_eq!(
            CrossfaderLaw::from_name("power", 3.0),
            Some(CrossfaderLaw::PowerCurve { exponent: 3.0 })
        );
        assert_eq!(CrossfaderLaw::from_name("cut", 1.0), None);
    }

    #[test]
    fn test_crossfader_clamps() {
        let mut xf = Crossfader::default();
        assert_eq!(xf.factors(), (1.0, 1.0));
        xf.set_position(3.0);
        assert_eq!(xf.position(), 1.0);
        xf.center();
        assert_eq!(xf.position(), 0.5);
    }
}
