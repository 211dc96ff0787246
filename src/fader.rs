/*
 *  fader.rs
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

// speeds at start, middle and end of the fade, in distance per unit time
const START_SPEED: f32 = 0.0;
const MID_SPEED: f32 = 2.0;
const END_SPEED: f32 = 0.0;

/// Fade curve: linear time progress 0..1 → distance travelled 0..1.
/// Accelerates from rest, peaks at twice linear speed mid-way, settles at 1.
/// Input outside 0..1 is clamped.
#[inline]
pub fn time_to_distance(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        t * (START_SPEED + t * (MID_SPEED - START_SPEED))
    } else {
        let h = t - 0.5;
        0.5 * (START_SPEED + 0.5 * (MID_SPEED - START_SPEED))
            + h * (MID_SPEED + h * (END_SPEED - MID_SPEED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints() {
        assert_eq!(time_to_distance(0.0), 0.0);
        assert!((time_to_distance(0.5) - 0.5).abs() < 1e-6);
        assert!((time_to_distance(1.0) - 1.0).abs() < 1e-6);
        assert_eq!(time_to_distance(-2.0), 0.0);
        assert!((time_to_distance(7.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn never_goes_backwards() {
        let mut last = 0.0;
        for i in 0..=1000 {
            let d = time_to_distance(i as f32 / 1000.0);
            assert!(d >= last);
            assert!((0.0..=1.0).contains(&d));
            last = d;
        }
    }

    #[test]
    fn slow_start() {
        // quadratic launch: well behind linear early on
        assert!(time_to_distance(0.1) < 0.1);
        assert!((time_to_distance(0.25) - 0.125).abs() < 1e-6);
    }
}
