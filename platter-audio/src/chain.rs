//! DSP units inserted on a deck's channel
//!
//! One three-band EQ, a low-pass and a high-pass for the filter sweep, and a
//! pitch shifter for key-lock. Units are created when a channel starts and
//! released when it stops. A unit the engine fails to create is skipped; the
//! rest of the chain keeps working.

use crate::backend::{log_write, AudioBackend, ChannelHandle, DspHandle, DspKind, DspParam};
use crate::params::FilterSweep;

/// Fixed filter resonance (Butterworth Q)
pub const FILTER_RESONANCE: f32 = 0.707;

/// DSP units owned by one channel
#[derive(Debug, Default)]
pub struct DspChain {
    eq: Option<DspHandle>,
    low_pass: Option<DspHandle>,
    high_pass: Option<DspHandle>,
    pitch_shift: Option<DspHandle>,
}

impl DspChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create every unit and insert it on `channel`
    pub fn attach(&mut self, engine: &mut dyn AudioBackend, channel: ChannelHandle) {
        self.release(engine);
        self.eq = Self::insert(engine, channel, DspKind::ThreeBandEq);
        self.low_pass = Self::insert(engine, channel, DspKind::LowPass);
        self.high_pass = Self::insert(engine, channel, DspKind::HighPass);
        self.pitch_shift = Self::insert(engine, channel, DspKind::PitchShift);

        for dsp in [self.low_pass, self.high_pass].into_iter().flatten() {
            log_write(
                "filter resonance",
                engine.set_dsp_parameter(dsp, DspParam::Resonance, FILTER_RESONANCE),
            );
        }
    }

    fn insert(
        engine: &mut dyn AudioBackend,
        channel: ChannelHandle,
        kind: DspKind,
    ) -> Option<DspHandle> {
        let dsp = match engine.create_dsp(kind) {
            Ok(dsp) => dsp,
            Err(e) => {
                tracing::warn!(?kind, error = %e, "skipping DSP unit");
                return None;
            }
        };
        if let Err(e) = engine.add_dsp(channel, dsp) {
            tracing::warn!(?kind, error = %e, "could not insert DSP unit");
            engine.release_dsp(dsp);
            return None;
        }
        Some(dsp)
    }

    /// Release every unit
    pub fn release(&mut self, engine: &mut dyn AudioBackend) {
        for dsp in [
            self.eq.take(),
            self.low_pass.take(),
            self.high_pass.take(),
            self.pitch_shift.take(),
        ]
        .into_iter()
        .flatten()
        {
            engine.release_dsp(dsp);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.eq.is_some()
            || self.low_pass.is_some()
            || self.high_pass.is_some()
            || self.pitch_shift.is_some()
    }

    /// Write low/mid/high gains in dB
    pub fn apply_eq(&self, engine: &mut dyn AudioBackend, gains_db: [f32; 3]) {
        let Some(eq) = self.eq else {
            return;
        };
        let params = [DspParam::LowGainDb, DspParam::MidGainDb, DspParam::HighGainDb];
        for (param, gain) in params.into_iter().zip(gains_db) {
            log_write("eq gain", engine.set_dsp_parameter(eq, param, gain));
        }
    }

    /// Write a filter sweep: cutoffs for active filters, bypass for the rest
    pub fn apply_filter(&self, engine: &mut dyn AudioBackend, sweep: FilterSweep) {
        for (dsp, cutoff) in [(self.low_pass, sweep.low_pass), (self.high_pass, sweep.high_pass)] {
            let Some(dsp) = dsp else {
                continue;
            };
            if let Some(hz) = cutoff {
                log_write("filter cutoff", engine.set_dsp_parameter(dsp, DspParam::Cutoff, hz));
            }
            log_write("filter bypass", engine.set_dsp_bypass(dsp, cutoff.is_none()));
        }
    }

    /// Write the key-lock pitch shift; 0 semitones bypasses the shifter
    pub fn apply_pitch_shift(&self, engine: &mut dyn AudioBackend, semitones: f32) {
        let Some(dsp) = self.pitch_shift else {
            return;
        };
        log_write(
            "pitch shift",
            engine.set_dsp_parameter(dsp, DspParam::PitchSemitones, semitones),
        );
        log_write("pitch shift bypass", engine.set_dsp_bypass(dsp, semitones == 0.0));
    }

    pub fn eq(&self) -> Option<DspHandle> {
        self.eq
    }

    pub fn low_pass(&self) -> Option<DspHandle> {
        self.low_pass
    }

    pub fn high_pass(&self) -> Option<DspHandle> {
        self.high_pass
    }

    pub fn pitch_shift(&self) -> Option<DspHandle> {
        self.pitch_shift
    }
}
