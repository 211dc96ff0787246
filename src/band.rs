/*
 *  band.rs
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
//! per-bar decay: instant attack, eased release, and a slower peak marker
//! whose highlight fades out as it ages.

use std::time::{Duration, Instant};

use crate::dbfs::visual_level;
use crate::fader::time_to_distance;

/// Where a curve is in its attack/release cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Resting at zero, nothing pending.
    Idle,
    /// Just jumped up to a louder reading this tick.
    Attack,
    /// Fading toward zero along the fade curve.
    Release,
}

/// Outcome of a release step.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ReleaseStep {
    Fading(f32),
    Expired,
}

/// Timing and scaling knobs shared by every bar of one engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecaySettings {
    pub value_fade: Duration,
    pub peak_fade: Duration,
    pub floor_db: f32,
    pub ceil_db: f32,
    pub max_alpha: f32,
}

/// One eased decay: a level, how far along the fade it is, and when the fade began.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayCurve {
    level: f32,
    progress: f32,
    started: Option<Instant>,
    phase: Phase,
}

impl Default for DecayCurve {
    fn default() -> Self {
        Self { level: 0.0, progress: 1.0, started: None, phase: Phase::Idle }
    }
}

impl DecayCurve {
    #[inline]
    pub fn level(&self) -> f32 { self.level }

    #[inline]
    pub fn progress(&self) -> f32 { self.progress }

    #[inline]
    pub fn phase(&self) -> Phase { self.phase }

    fn attack(&mut self, level: f32, now: Instant) {
        self.level = level;
        self.progress = 0.0;
        self.started = Some(now);
        self.phase = Phase::Attack;
    }

    fn release(&mut self, now: Instant, fade: Duration) -> ReleaseStep {
        let Some(started) = self.started else {
            self.settle();
            return ReleaseStep::Expired;
        };

        let fade_ms = fade.as_secs_f32() * 1000.0;
        let elapsed_ms = now.saturating_duration_since(started).as_secs_f32() * 1000.0;
        let t = if fade_ms > 0.0 { elapsed_ms / fade_ms } else { 1.0 };

        if t < 1.0 {
            let eased = time_to_distance(t);
            debug_assert!(
                eased >= self.progress,
                "decay went backwards: {eased} < {}",
                self.progress
            );
            let eased = eased.max(self.progress);
            // fraction of what is left that this step removes
            let delta = (eased - self.progress) / (1.0 - self.progress);
            self.progress = eased;
            self.level = (self.level - self.level * delta).max(0.0);
            self.phase = Phase::Release;
            ReleaseStep::Fading(self.progress)
        } else {
            self.settle();
            ReleaseStep::Expired
        }
    }

    fn settle(&mut self) {
        self.level = 0.0;
        self.progress = 1.0;
        self.started = None;
        self.phase = Phase::Idle;
    }
}

/// Decay state for one visual bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BandState {
    value: DecayCurve,
    peak: DecayCurve,
    peak_highlight_alpha: f32,
}

impl BandState {
    pub fn new(max_alpha: f32) -> Self {
        Self {
            value: DecayCurve::default(),
            peak: DecayCurve::default(),
            peak_highlight_alpha: max_alpha,
        }
    }

    #[inline]
    pub fn value(&self) -> f32 { self.value.level }

    #[inline]
    pub fn peak(&self) -> f32 { self.peak.level }

    #[inline]
    pub fn peak_highlight_alpha(&self) -> f32 { self.peak_highlight_alpha }

    pub fn value_curve(&self) -> &DecayCurve { &self.value }

    pub fn peak_curve(&self) -> &DecayCurve { &self.peak }

    /// Drop everything back to rest. Used when the view geometry changes.
    pub fn reset(&mut self, max_alpha: f32) {
        self.value.settle();
        self.peak.settle();
        self.peak_highlight_alpha = max_alpha;
    }

    /// Feed one raw linear reading, scaled into `0..=scale_max`.
    ///
    /// `now` must not go backwards between calls. A `now` before the last
    /// attack counts as zero elapsed; one between the attack and the previous
    /// tick trips the debug assertion in the release step.
    pub fn process_signal(&mut self, signal: f32, scale_max: f32, now: Instant, cfg: &DecaySettings) {
        let target = visual_level(signal, cfg.floor_db, cfg.ceil_db, scale_max);

        if target > self.value.level {
            self.value.attack(target, now);
        } else {
            self.value.release(now, cfg.value_fade);
        }

        let value = self.value.level;
        if value > self.peak.level {
            self.peak.attack(value, now);
            // fresh marker shows at full brightness from this frame, not the next release tick
            self.peak_highlight_alpha = 0.0;
            return;
        }

        match self.peak.release(now, cfg.peak_fade) {
            ReleaseStep::Fading(progress) => {
                self.peak_highlight_alpha = progress * progress * progress * cfg.max_alpha;
            }
            ReleaseStep::Expired => {
                // back to full so the next hold starts bright
                self.peak_highlight_alpha = cfg.max_alpha;
            }
        }

        // the marker may not sink under a bar that is still standing
        if self.peak.level < value {
            self.peak.attack(value, now);
            self.peak_highlight_alpha = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn settings() -> DecaySettings {
        DecaySettings {
            value_fade: Duration::from_millis(35),
            peak_fade: Duration::from_millis(1000),
            floor_db: -70.0,
            ceil_db: 4.0,
            max_alpha: 0.4,
        }
    }

    fn ms(t0: Instant, ms: u64) -> Instant {
        t0 + Duration::from_millis(ms)
    }

    #[test]
    fn attack_lands_on_the_meter_curve() {
        let cfg = settings();
        let t0 = Instant::now();
        for &s in &[0.0f32, 1e-6, 0.001, 0.03, 0.25, 0.5, 1.0, 1.6, 40.0] {
            let mut band = BandState::new(cfg.max_alpha);
            band.process_signal(s, 64.0, t0, &cfg);
            let want = visual_level(s, cfg.floor_db, cfg.ceil_db, 64.0);
            assert!((band.value() - want).abs() < 1e-5, "signal {s}");
            assert!(band.value() >= 0.0 && band.value() <= 64.0);
        }
    }

    #[test]
    fn burst_then_silence() {
        let cfg = settings();
        let t0 = Instant::now();
        let mut band = BandState::new(cfg.max_alpha);

        band.process_signal(1.0, 100.0, ms(t0, 0), &cfg);
        let top = visual_level(1.0, cfg.floor_db, cfg.ceil_db, 100.0);
        assert_eq!(band.value(), top);
        assert_eq!(band.value_curve().phase(), Phase::Attack);

        band.process_signal(0.0, 100.0, ms(t0, 10), &cfg);
        let v10 = band.value();
        assert!(v10 < top && v10 > 0.0);
        assert_eq!(band.value_curve().phase(), Phase::Release);

        band.process_signal(0.0, 100.0, ms(t0, 20), &cfg);
        let v20 = band.value();
        assert!(v20 < v10 && v20 > 0.0);

        band.process_signal(0.0, 100.0, ms(t0, 40), &cfg);
        assert_eq!(band.value(), 0.0);
        assert_eq!(band.value_curve().phase(), Phase::Idle);
        assert_eq!(band.value_curve().progress(), 1.0);
    }

    #[test]
    fn clock_before_attack_counts_as_no_time() {
        let cfg = settings();
        let t0 = Instant::now();
        let mut band = BandState::new(cfg.max_alpha);
        band.process_signal(1.0, 100.0, ms(t0, 100), &cfg);
        let top = band.value();

        band.process_signal(0.0, 100.0, t0, &cfg);
        assert_eq!(band.value(), top);
        assert_eq!(band.value_curve().progress(), 0.0);
        assert_eq!(band.peak(), top);
        assert_eq!(band.peak_curve().progress(), 0.0);

        // time resumes from the attack, not from the stale tick
        band.process_signal(0.0, 100.0, ms(t0, 110), &cfg);
        assert!(band.value() < top && band.value() > 0.0);
    }

    #[test]
    fn release_is_monotonic() {
        let cfg = settings();
        let t0 = Instant::now();
        let mut band = BandState::new(cfg.max_alpha);
        band.process_signal(0.8, 50.0, t0, &cfg);

        let mut last_value = band.value();
        let mut last_progress = band.value_curve().progress();
        for step in 1..=40u64 {
            band.process_signal(0.0, 50.0, ms(t0, step), &cfg);
            assert!(band.value() <= last_value);
            let p = band.value_curve().progress();
            assert!(p >= last_progress);
            last_value = band.value();
            last_progress = p;
        }
        assert_eq!(band.value(), 0.0);
        assert_eq!(last_progress, 1.0);
    }

    #[test]
    fn quieter_input_does_not_interrupt_release() {
        let cfg = settings();
        let t0 = Instant::now();
        let mut band = BandState::new(cfg.max_alpha);
        band.process_signal(1.0, 100.0, t0, &cfg);
        band.process_signal(0.5, 100.0, ms(t0, 5), &cfg);
        assert_eq!(band.value_curve().phase(), Phase::Release);
        assert!(band.value_curve().progress() > 0.0);
    }

    #[test]
    fn peak_outlives_value() {
        let cfg = settings();
        let t0 = Instant::now();
        let mut band = BandState::new(cfg.max_alpha);
        band.process_signal(1.0, 100.0, t0, &cfg);
        assert_eq!(band.peak(), band.value());
        assert_eq!(band.peak_highlight_alpha(), 0.0);

        band.process_signal(0.0, 100.0, ms(t0, 100), &cfg);
        assert_eq!(band.value(), 0.0);
        assert!(band.peak() > 0.0);
        assert_eq!(band.peak_curve().phase(), Phase::Release);

        let a1 = band.peak_highlight_alpha();
        band.process_signal(0.0, 100.0, ms(t0, 600), &cfg);
        let a2 = band.peak_highlight_alpha();
        assert!(a2 > a1);
        assert!(a2 < cfg.max_alpha);
        let p = band.peak_curve().progress();
        assert!((a2 - p * p * p * cfg.max_alpha).abs() < 1e-6);
    }

    #[test]
    fn expired_peak_restores_full_highlight() {
        // intentional: an expired marker goes back to max alpha, not zero
        let cfg = settings();
        let t0 = Instant::now();
        let mut band = BandState::new(cfg.max_alpha);
        band.process_signal(1.0, 100.0, t0, &cfg);
        band.process_signal(0.0, 100.0, ms(t0, 500), &cfg);
        assert!(band.peak_highlight_alpha() < cfg.max_alpha);

        band.process_signal(0.0, 100.0, ms(t0, 1000), &cfg);
        assert_eq!(band.peak(), 0.0);
        assert_eq!(band.peak_highlight_alpha(), cfg.max_alpha);
        assert_eq!(band.peak_curve().phase(), Phase::Idle);
    }

    #[test]
    fn silence_is_stable() {
        let cfg = settings();
        let t0 = Instant::now();
        let mut band = BandState::new(cfg.max_alpha);
        band.process_signal(0.9, 100.0, t0, &cfg);
        band.process_signal(0.0, 100.0, ms(t0, 2000), &cfg);
        assert_eq!((band.value(), band.peak()), (0.0, 0.0));

        for i in 1..50u64 {
            band.process_signal(0.0, 100.0, ms(t0, 2000 + i * 16), &cfg);
            assert_eq!(band.value(), 0.0);
            assert_eq!(band.peak(), 0.0);
            assert_eq!(band.value_curve().phase(), Phase::Idle);
        }
    }

    #[test]
    fn reset_is_deterministic() {
        let cfg = settings();
        let t0 = Instant::now();
        let mut band = BandState::new(cfg.max_alpha);
        band.process_signal(1.0, 100.0, t0, &cfg);
        band.process_signal(0.0, 100.0, ms(t0, 300), &cfg);

        band.reset(cfg.max_alpha);
        assert_eq!(band.value(), 0.0);
        assert_eq!(band.peak(), 0.0);
        assert_eq!(band.value_curve().progress(), 1.0);
        assert_eq!(band.peak_curve().progress(), 1.0);
        assert_eq!(band.value_curve().phase(), Phase::Idle);
        assert_eq!(band.peak_highlight_alpha(), cfg.max_alpha);
        assert_eq!(band, BandState::new(cfg.max_alpha));
    }

    #[test]
    fn peak_never_below_value() {
        let cfg = settings();
        let t0 = Instant::now();
        let mut rng = StdRng::seed_from_u64(0x1E7E_4D);

        for _run in 0..50 {
            let mut band = BandState::new(cfg.max_alpha);
            let mut t = 0u64;
            for _ in 0..400 {
                t += rng.random_range(1..60);
                let signal = if rng.random_bool(0.3) {
                    rng.random_range(0.0f32..1.5)
                } else {
                    0.0
                };
                band.process_signal(signal, 64.0, ms(t0, t), &cfg);
                assert!(band.value() >= 0.0);
                assert!(band.peak() >= band.value(), "peak {} < value {}", band.peak(), band.value());
                assert!(band.peak() <= 64.0);
            }
        }
    }
}
