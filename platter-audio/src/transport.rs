//! Transport state and tempo control
//!
//! [`Transport`] tracks Stopped/Playing/Paused plus the two hold modifiers
//! (scratching, cue held) that temporarily take over the channel and hand it
//! back to the state they interrupted. [`PitchControl`] owns the tempo fader
//! target, its smoothed value and key-lock.

/// Playback state for a deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Temporary takeover of the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hold {
    Scratch,
    Cue,
}

/// Transport state machine
#[derive(Debug, Clone, Default)]
pub struct Transport {
    state: PlaybackState,
    scratching: bool,
    cue_held: bool,
    /// State to return to when the last hold ends
    resume_to: PlaybackState,
    /// Start requested while the track was still loading
    pending_start: bool,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_scratching(&self) -> bool {
        self.scratching
    }

    pub fn is_cue_held(&self) -> bool {
        self.cue_held
    }

    /// Whether a hold currently owns the channel
    pub fn is_held(&self) -> bool {
        self.scratching || self.cue_held
    }

    pub fn pending_start(&self) -> bool {
        self.pending_start
    }

    pub fn set_pending_start(&mut self, pending: bool) {
        self.pending_start = pending;
    }

    /// Move to a base state. Ignored while a hold is active, except Stopped,
    /// which also clears the holds.
    pub fn set_state(&mut self, state: PlaybackState) {
        if state == PlaybackState::Stopped {
            self.reset();
            return;
        }
        if self.is_held() {
            self.resume_to = state;
            return;
        }
        if self.state != state {
            tracing::debug!(from = ?self.state, to = ?state, "transport");
        }
        self.state = state;
    }

    /// Enter a hold. Only Playing or Paused can be interrupted, and only one
    /// hold at a time. Returns whether the hold began.
    pub fn enter(&mut self, hold: Hold) -> bool {
        if self.is_held() || self.state == PlaybackState::Stopped {
            return false;
        }
        self.resume_to = self.state;
        match hold {
            Hold::Scratch => self.scratching = true,
            Hold::Cue => self.cue_held = true,
        }
        tracing::debug!(?hold, resume_to = ?self.resume_to, "hold begins");
        true
    }

    /// Leave a hold, returning the state to restore. `None` if that hold
    /// was not active.
    pub fn exit(&mut self, hold: Hold) -> Option<PlaybackState> {
        let flag = match hold {
            Hold::Scratch => &mut self.scratching,
            Hold::Cue => &mut self.cue_held,
        };
        if !*flag {
            return None;
        }
        *flag = false;
        self.state = self.resume_to;
        tracing::debug!(?hold, state = ?self.state, "hold ends");
        Some(self.state)
    }

    /// Stopped, no holds, nothing pending
    pub fn reset(&mut self) {
        if self.state != PlaybackState::Stopped {
            tracing::debug!(from = ?self.state, "transport stopped");
        }
        *self = Self::default();
    }
}

/// Tempo fader with exponential smoothing and key-lock
#[derive(Debug, Clone)]
pub struct PitchControl {
    min: f32,
    max: f32,
    /// Smoothing rate k (1/s)
    smoothing: f32,
    target: f32,
    current: f32,
    key_lock: bool,
    /// Pitch frozen when key-lock was enabled
    base: f32,
}

impl PitchControl {
    /// A reversed range is put in order; a non-finite one collapses to
    /// unity
    pub fn new(min: f32, max: f32, smoothing: f32) -> Self {
        let (min, max) = match (min.is_finite() && max.is_finite(), min <= max) {
            (true, true) => (min, max),
            (true, false) => (max, min),
            (false, _) => (1.0, 1.0),
        };
        Self {
            min,
            max,
            smoothing,
            target: 1.0_f32.clamp(min, max),
            current: 1.0_f32.clamp(min, max),
            key_lock: false,
            base: 1.0,
        }
    }

    pub fn range(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    /// Set the target ratio, clamped to the pitch range
    pub fn set_target(&mut self, ratio: f32) {
        if ratio.is_nan() {
            return;
        }
        self.target = ratio.clamp(self.min, self.max);
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Smoothed ratio
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Move the smoothed ratio toward the target: `current += (target -
    /// current) * (1 - e^(-k dt))`
    pub fn tick(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let alpha = 1.0 - (-self.smoothing * dt).exp();
        self.current += (self.target - self.current) * alpha;
        self.current = self.current.clamp(self.min, self.max);
    }

    pub fn key_lock(&self) -> bool {
        self.key_lock
    }

    pub fn base(&self) -> f32 {
        self.base
    }

    /// Enable or disable key-lock. Enabling freezes the current ratio as the
    /// base; disabling forgets it.
    pub fn set_key_lock(&mut self, enabled: bool) {
        if enabled == self.key_lock {
            return;
        }
        self.key_lock = enabled;
        self.base = if enabled { self.current } else { 1.0 };
    }

    /// Playback rate for the channel: 1.0 under key-lock
    pub fn channel_pitch(&self) -> f32 {
        if self.key_lock {
            1.0
        } else {
            self.current
        }
    }

    /// Shift for the pitch-shift unit; 0 when key-lock is off
    pub fn semitone_shift(&self) -> f32 {
        if !self.key_lock || self.base <= 0.0 {
            return 0.0;
        }
        12.0 * (self.current / self.base).log2()
    }
}
