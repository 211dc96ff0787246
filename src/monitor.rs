/*
 *  monitor.rs
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
//! spectrum monitor component - owns the sampler, the shared buffer, the
//! doorbell and the decay engine, and ties their lifetimes together
//!
//! Threading: `set_source` starts a sampler thread; everything else here is
//! called from the render side. Decay state never leaves the render side.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::band::DecaySettings;
use crate::bridge::UpdateBridge;
use crate::constants::*;
use crate::engine::{DecayEngine, MeterFrame};
use crate::error::MonitorError;
use crate::sample::{MonitorSample, SampleBuffer};
use crate::sampler::Sampler;
use crate::source::LevelSource;

/// Resolved settings for one monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub band_frequencies: Vec<f32>,
    pub value_fade: Duration,
    pub peak_fade: Duration,
    pub floor_db: f32,
    pub ceil_db: f32,
    pub max_alpha: f32,
    pub min_sleep: Duration,
    pub max_sleep: Duration,
    pub target_cycle: Duration,
    pub stop_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            band_frequencies: BAND_FREQUENCIES_HZ.to_vec(),
            value_fade: Duration::from_millis(VALUE_FADE_MS),
            peak_fade: Duration::from_millis(PEAK_FADE_MS),
            floor_db: LEVEL_FLOOR_DB,
            ceil_db: LEVEL_CEIL_DB,
            max_alpha: MAX_HIGHLIGHT_ALPHA,
            min_sleep: Duration::from_millis(SAMPLER_MIN_SLEEP_MS),
            max_sleep: Duration::from_millis(SAMPLER_MAX_SLEEP_MS),
            target_cycle: Duration::from_millis(SAMPLER_TARGET_CYCLE_MS),
            stop_timeout: Duration::from_millis(SAMPLER_STOP_TIMEOUT_MS),
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), MonitorError> {
        let bad = |msg: &str| -> Result<(), MonitorError> {
            Err(MonitorError::InvalidConfig(msg.to_string()))
        };

        if self.band_frequencies.is_empty() {
            return bad("at least one band frequency is required");
        }
        if self.band_frequencies.iter().any(|f| !f.is_finite() || *f <= 0.0) {
            return bad("band frequencies must be finite and > 0");
        }
        if self.value_fade.is_zero() || self.peak_fade.is_zero() {
            return bad("fade durations must be > 0");
        }
        if !(self.floor_db.is_finite() && self.ceil_db.is_finite()) || self.floor_db >= self.ceil_db {
            return bad("floor_db must be below ceil_db");
        }
        if !(0.0..=1.0).contains(&self.max_alpha) {
            return bad("max_alpha must be within 0..=1");
        }
        if self.min_sleep.is_zero() || self.min_sleep > self.max_sleep {
            return bad("sampler sleep bounds must satisfy 0 < min <= max");
        }
        if self.stop_timeout.is_zero() {
            return bad("stop timeout must be > 0");
        }
        Ok(())
    }

    pub fn decay_settings(&self) -> DecaySettings {
        DecaySettings {
            value_fade: self.value_fade,
            peak_fade: self.peak_fade,
            floor_db: self.floor_db,
            ceil_db: self.ceil_db,
            max_alpha: self.max_alpha,
        }
    }
}

pub struct SpectrumMonitor {
    config: MonitorConfig,
    buffer: Arc<SampleBuffer>,
    bridge: Arc<UpdateBridge>,
    visible: Arc<AtomicBool>,
    engine: DecayEngine,
    scratch: MonitorSample,
    source: Option<Weak<dyn LevelSource>>,
    sampler: Option<Sampler>,
}

impl SpectrumMonitor {
    /// A monitor with no source attached. It renders silence until one is.
    pub fn new(config: MonitorConfig) -> Result<Self, MonitorError> {
        config.validate()?;
        let bands = config.band_frequencies.len();
        Ok(Self {
            buffer: Arc::new(SampleBuffer::new(bands)),
            bridge: Arc::new(UpdateBridge::new()),
            visible: Arc::new(AtomicBool::new(true)),
            engine: DecayEngine::new(bands, config.decay_settings()),
            scratch: MonitorSample::silent(bands),
            source: None,
            sampler: None,
            config,
        })
    }

    /// Attach a source and start sampling it. A dead handle is ignored.
    pub fn set_source(&mut self, source: Weak<dyn LevelSource>) -> Result<(), MonitorError> {
        if source.strong_count() == 0 {
            debug!("monitor: ignoring a level source that is already gone");
            return Ok(());
        }

        self.stop_sampler()?;
        let sampler = Sampler::spawn(
            source.clone(),
            Arc::clone(&self.buffer),
            Arc::clone(&self.bridge),
            Arc::clone(&self.visible),
            &self.config,
        )?;
        self.source = Some(source);
        self.sampler = Some(sampler);
        info!("monitor: level source attached");
        Ok(())
    }

    /// Stop sampling and forget the source. Bars fall back to silence even
    /// when the sampler was too busy to stop in time; that is still reported.
    pub fn detach_source(&mut self) -> Result<(), MonitorError> {
        let stopped = self.stop_sampler();
        self.source = None;
        self.buffer.clear();
        stopped
    }

    fn stop_sampler(&mut self) -> Result<(), MonitorError> {
        match self.sampler.take() {
            Some(sampler) => sampler.stop(),
            None => Ok(()),
        }
    }

    pub fn has_source(&self) -> bool {
        self.source.as_ref().is_some_and(|s| s.strong_count() > 0)
    }

    pub fn is_sampling(&self) -> bool {
        self.sampler.as_ref().is_some_and(Sampler::is_running)
    }

    /// Hidden monitors keep their thread but skip the reads.
    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Relaxed);
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    /// Geometry changed; every bar restarts from rest.
    pub fn resized(&mut self) {
        self.engine.reset();
    }

    /// One render tick: pull the latest sample and advance every bar.
    /// Returns whether the sampler had published since the last tick.
    pub fn refresh(&mut self, scale_max: f32, now: Instant) -> bool {
        let fresh = self.bridge.take_pending();
        self.buffer.snapshot_into(&mut self.scratch);
        self.engine.process(&self.scratch, scale_max, now);
        fresh
    }

    /// Shared doorbell, for consumers that want to `await` fresh data.
    pub fn bridge(&self) -> Arc<UpdateBridge> {
        Arc::clone(&self.bridge)
    }

    pub fn engine(&self) -> &DecayEngine { &self.engine }

    pub fn frame(&self) -> MeterFrame { self.engine.frame() }

    pub fn config(&self) -> &MonitorConfig { &self.config }

    /// Stop the sampler, reporting a timeout instead of logging it from `Drop`.
    pub fn shutdown(mut self) -> Result<(), MonitorError> {
        self.stop_sampler()
    }
}
