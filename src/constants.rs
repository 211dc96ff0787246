/*
 *  constants.rs
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

/// Center frequencies of the spectrum bars, roughly third-octave spaced.
pub const BAND_FREQUENCIES_HZ: [f32; 11] = [
    63.0,
    125.0, 200.0,
    315.0, 500.0,
    800.0, 1250.0,
    2000.0, 3150.0,
    5000.0, 8000.0,
];

/// Meter floor; anything quieter reads as this.
pub const LEVEL_FLOOR_DB: f32 = -70.0;
/// Meter ceiling; a few dB of headroom above 0 dBFS for clipping.
pub const LEVEL_CEIL_DB: f32 = 4.0;

/// Time for a bar to fall from where it was to nothing.
pub const VALUE_FADE_MS: u64 = 35;
/// Time for a peak marker to fall from where it was to nothing.
pub const PEAK_FADE_MS: u64 = 1000;
/// Highlight alpha a fully aged peak marker reaches.
pub const MAX_HIGHLIGHT_ALPHA: f32 = 0.4;

// sampler pacing
pub const SAMPLER_MIN_SLEEP_MS: u64 = 10;
pub const SAMPLER_MAX_SLEEP_MS: u64 = 100;
pub const SAMPLER_TARGET_CYCLE_MS: u64 = 100;
pub const SAMPLER_STOP_TIMEOUT_MS: u64 = 1000;

pub const SAMPLER_THREAD_NAME: &str = "lymeter-sampler";
