/*
 *  dbfs.rs
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

/// Linear amplitude → dB, clamped into `[floor_db, ceil_db]`.
/// Silence, negative and non-finite input land on the floor; log10 never sees them.
#[inline]
pub fn linear_to_db_clamped(signal: f32, floor_db: f32, ceil_db: f32) -> f32 {
    if !(signal.is_finite() && signal > 0.0) {
        return floor_db;
    }
    (20.0 * signal.log10()).clamp(floor_db, ceil_db)
}

/// IEC 268-18 meter deflection for a dB reading, 0..=1.
/// Piecewise linear, so the low end stays visible without a gamma curve.
/// Readings above 0 dB would deflect past full scale; those are pinned at 1.0.
#[inline]
pub fn iec_level(db: f32) -> f32 {
    let level = if db < -70.0 {
        0.0
    } else if db < -60.0 {
        (db + 70.0) * 0.0025
    } else if db < -50.0 {
        (db + 60.0) * 0.005 + 0.025
    } else if db < -40.0 {
        (db + 50.0) * 0.0075 + 0.075
    } else if db < -30.0 {
        (db + 40.0) * 0.015 + 0.15
    } else if db < -20.0 {
        (db + 30.0) * 0.02 + 0.3
    } else {
        (db + 20.0) * 0.025 + 0.5
    };
    level.clamp(0.0, 1.0)
}

/// Signal → visual units: clamp to dB, run through the meter curve, scale.
#[inline]
pub fn visual_level(signal: f32, floor_db: f32, ceil_db: f32, scale_max: f32) -> f32 {
    iec_level(linear_to_db_clamped(signal, floor_db, ceil_db)) * scale_max.max(0.0)
}
