/*
 *  source.rs
 *
 *  LyMeter - worth the squeeze
 *	(c) 2020-25 Stuart Hunter
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */
//! where the raw levels come from
//!
//! The audio engine implements `LevelSource`; the monitor only ever holds a
//! weak handle to it so tearing the engine down never waits on the meter.

use std::time::Instant;
use rand::Rng;

/// Already-analysed levels exposed by an audio engine.
pub trait LevelSource: Send + Sync {
    /// Linear peak amplitude for channel 0 (left) or 1 (right).
    fn peak(&self, channel: usize) -> f32;

    /// Linear magnitude interpolated at `frequency_hz`.
    fn spectrum_magnitude(&self, frequency_hz: f32) -> f32;
}

/// Same reading every time. Handy for tests and calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantSource {
    pub peak: f32,
    pub magnitude: f32,
}

impl ConstantSource {
    pub fn new(peak: f32, magnitude: f32) -> Self {
        Self { peak, magnitude }
    }
}

impl LevelSource for ConstantSource {
    fn peak(&self, _channel: usize) -> f32 { self.peak }
    fn spectrum_magnitude(&self, _frequency_hz: f32) -> f32 { self.magnitude }
}

/// Fake program material: a kick on every beat, hats on the off-beat,
/// a pink-ish tilt across the spectrum and a little noise on top.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    started: Instant,
    beats_per_sec: f32,
}

impl SyntheticSource {
    pub fn new(bpm: f32) -> Self {
        Self { started: Instant::now(), beats_per_sec: bpm.max(1.0) / 60.0 }
    }

    fn beat_phase(&self) -> f32 {
        (self.started.elapsed().as_secs_f32() * self.beats_per_sec).fract()
    }
}

impl LevelSource for SyntheticSource {
    fn peak(&self, channel: usize) -> f32 {
        let phase = self.beat_phase();
        let kick = (-phase * 6.0).exp();
        // right channel a touch quieter so the meters don't move in lockstep
        let pan = if channel == 0 { 1.0 } else { 0.85 };
        let jitter: f32 = rand::rng().random_range(-0.04..0.04);
        ((0.12 + 0.8 * kick) * pan + jitter).max(0.0)
    }

    fn spectrum_magnitude(&self, frequency_hz: f32) -> f32 {
        let phase = self.beat_phase();
        let f = frequency_hz.max(20.0);
        let tilt = (125.0 / f).sqrt().min(1.0);
        let kick = if f < 250.0 { (-phase * 5.0).exp() } else { 0.0 };
        let off = (phase - 0.5).abs();
        let hats = if f > 3000.0 { (-off * 12.0).exp() * 0.4 } else { 0.0 };
        let noise: f32 = rand::rng().random_range(0.0..0.05);
        (0.08 * tilt + 0.7 * kick + hats + noise).max(0.0)
    }
}
