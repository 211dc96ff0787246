/*
 *  engine.rs
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
//! render-side smoothing of raw samples, one state machine per bar

use std::time::Instant;

use crate::band::{BandState, DecaySettings};
use crate::sample::{MonitorSample, METER_CHANNELS};

/// What a renderer needs for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BandLevel {
    pub value: f32,
    pub peak: f32,
    pub peak_highlight_alpha: f32,
}

impl BandLevel {
    fn of(state: &BandState) -> Self {
        Self {
            value: state.value(),
            peak: state.peak(),
            peak_highlight_alpha: state.peak_highlight_alpha(),
        }
    }
}

/// Owned copy of every bar, for renderers living elsewhere.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeterFrame {
    pub scale_max: f32,
    pub channels: [BandLevel; METER_CHANNELS],
    pub bands: Vec<BandLevel>,
}

#[derive(Debug, Clone)]
pub struct DecayEngine {
    settings: DecaySettings,
    channels: [BandState; METER_CHANNELS],
    bands: Vec<BandState>,
    scale_max: f32,
}

impl DecayEngine {
    pub fn new(band_count: usize, settings: DecaySettings) -> Self {
        let fresh = BandState::new(settings.max_alpha);
        Self {
            settings,
            channels: [fresh.clone(), fresh.clone()],
            bands: vec![fresh; band_count],
            scale_max: 0.0,
        }
    }

    #[inline]
    pub fn band_count(&self) -> usize { self.bands.len() }

    /// One refresh tick. Missing bands in `sample` read as silence.
    pub fn process(&mut self, sample: &MonitorSample, scale_max: f32, now: Instant) {
        self.scale_max = scale_max;
        for (state, &signal) in self.channels.iter_mut().zip(sample.channel_peaks.iter()) {
            state.process_signal(signal, scale_max, now, &self.settings);
        }
        for (i, state) in self.bands.iter_mut().enumerate() {
            let signal = sample.band_magnitudes.get(i).copied().unwrap_or(0.0);
            state.process_signal(signal, scale_max, now, &self.settings);
        }
    }

    /// Zero every bar in place; nothing is reallocated.
    pub fn reset(&mut self) {
        let max_alpha = self.settings.max_alpha;
        for state in self.channels.iter_mut().chain(self.bands.iter_mut()) {
            state.reset(max_alpha);
        }
    }

    pub fn channel(&self, channel: usize) -> Option<&BandState> {
        self.channels.get(channel)
    }

    pub fn band(&self, band: usize) -> Option<&BandState> {
        self.bands.get(band)
    }

    pub fn frame(&self) -> MeterFrame {
        MeterFrame {
            scale_max: self.scale_max,
            channels: [BandLevel::of(&self.channels[0]), BandLevel::of(&self.channels[1])],
            bands: self.bands.iter().map(BandLevel::of).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings() -> DecaySettings {
        DecaySettings {
            value_fade: Duration::from_millis(35),
            peak_fade: Duration::from_millis(1000),
            floor_db: -70.0,
            ceil_db: 4.0,
            max_alpha: 0.4,
        }
    }

    #[test]
    fn every_bar_gets_its_own_state() {
        let mut eng = DecayEngine::new(3, settings());
        let sample = MonitorSample {
            channel_peaks: [1.0, 0.0],
            band_magnitudes: vec![0.0, 0.5, 1.0],
        };
        eng.process(&sample, 64.0, Instant::now());

        let f = eng.frame();
        assert_eq!(f.scale_max, 64.0);
        assert!((f.channels[0].value - 64.0).abs() < 1e-4);
        assert_eq!(f.channels[1].value, 0.0);
        assert_eq!(f.bands[0].value, 0.0);
        assert!(f.bands[1].value > 0.0 && f.bands[1].value < f.bands[2].value);
        assert!(eng.band(3).is_none());
        assert!(eng.channel(1).is_some());
    }

    #[test]
    fn short_sample_reads_as_silence() {
        let mut eng = DecayEngine::new(4, settings());
        let sample = MonitorSample { channel_peaks: [0.0; 2], band_magnitudes: vec![1.0] };
        eng.process(&sample, 10.0, Instant::now());
        assert!(eng.band(0).map_or(0.0, |b| b.value()) > 0.0);
        assert_eq!(eng.band(3).map(|b| b.value()), Some(0.0));
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut eng = DecayEngine::new(2, settings());
        let t0 = Instant::now();
        let loud = MonitorSample { channel_peaks: [1.0, 1.0], band_magnitudes: vec![1.0, 1.0] };
        eng.process(&loud, 32.0, t0);
        eng.process(&MonitorSample::silent(2), 32.0, t0 + Duration::from_millis(200));

        eng.reset();
        let f = eng.frame();
        for b in f.channels.iter().chain(f.bands.iter()) {
            assert_eq!(b.value, 0.0);
            assert_eq!(b.peak, 0.0);
            assert_eq!(b.peak_highlight_alpha, 0.4);
        }
        assert_eq!(eng.band_count(), 2);
    }
}
