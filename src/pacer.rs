/*
 *  pacer.rs
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
use std::time::{Duration, Instant};

/// Self-throttling nap length for the sampler loop.
///
/// The sleep is `target - last cycle cost`, held inside `[min, max]`.
/// The cost of the previous cycle is the only state carried forward.
#[derive(Debug, Clone)]
pub struct AdaptivePacer {
    min: Duration,
    max: Duration,
    target: Duration,
    last_cost: Duration,
}

impl AdaptivePacer {
    pub fn new(min: Duration, max: Duration, target: Duration) -> Self {
        let max = max.max(min);
        Self { min, max, target, last_cost: Duration::ZERO }
    }

    /// How long to sleep before the next cycle.
    #[inline]
    pub fn next_sleep(&self) -> Duration {
        self.target.saturating_sub(self.last_cost).clamp(self.min, self.max)
    }

    /// Call with the measured wall-clock cost of the cycle just finished.
    #[inline]
    pub fn record_cycle(&mut self, cost: Duration) {
        self.last_cost = cost;
    }

    pub fn last_cost(&self) -> Duration { self.last_cost }
}

/// Stopwatch for one sampler cycle.
pub struct CycleTimer {
    start: Instant,
}

impl CycleTimer {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pacer() -> AdaptivePacer {
        AdaptivePacer::new(
            Duration::from_millis(10),
            Duration::from_millis(100),
            Duration::from_millis(100),
        )
    }

    #[test]
    fn idle_cycles_sleep_the_full_budget() {
        let p = pacer();
        assert_eq!(p.next_sleep(), Duration::from_millis(100));
    }

    #[test]
    fn cost_shortens_the_nap() {
        let mut p = pacer();
        p.record_cycle(Duration::from_millis(30));
        assert_eq!(p.next_sleep(), Duration::from_millis(70));
        assert_eq!(p.last_cost(), Duration::from_millis(30));
    }

    #[test]
    fn nap_is_clamped() {
        let mut p = pacer();
        p.record_cycle(Duration::from_millis(95));
        assert_eq!(p.next_sleep(), Duration::from_millis(10));
        p.record_cycle(Duration::from_secs(3));
        assert_eq!(p.next_sleep(), Duration::from_millis(10));

        let wide = AdaptivePacer::new(
            Duration::from_millis(10),
            Duration::from_millis(50),
            Duration::from_millis(100),
        );
        assert_eq!(wide.next_sleep(), Duration::from_millis(50));
    }

    #[test]
    fn timer_moves_forward() {
        let t = CycleTimer::start();
        std::thread::sleep(Duration::from_millis(2));
        assert!(t.elapsed() >= Duration::from_millis(2));
    }
}
