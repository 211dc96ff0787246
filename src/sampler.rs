/*
 *  sampler.rs
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
//! background sampler - polls the level source on its own thread and
//! publishes into the shared sample buffer
//!

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info, trace, warn};

use crate::bridge::UpdateBridge;
use crate::constants::SAMPLER_THREAD_NAME;
use crate::error::MonitorError;
use crate::monitor::MonitorConfig;
use crate::pacer::{AdaptivePacer, CycleTimer};
use crate::sample::{MonitorSample, SampleBuffer, METER_CHANNELS};
use crate::source::LevelSource;

/// Everything the sampler thread owns or shares.
struct SamplerLoop {
    source: Weak<dyn LevelSource>,
    buffer: Arc<SampleBuffer>,
    bridge: Arc<UpdateBridge>,
    visible: Arc<AtomicBool>,
    exit: Arc<AtomicBool>,
    frequencies: Vec<f32>,
    pacer: AdaptivePacer,
}

/// Tells the owner the loop is gone, even if it went by panic.
struct ExitSignal(mpsc::Sender<()>);

impl Drop for ExitSignal {
    fn drop(&mut self) {
        let _ = self.0.send(());
    }
}

/// Handle to a running sampler thread.
pub struct Sampler {
    exit: Arc<AtomicBool>,
    done_rx: mpsc::Receiver<()>,
    join: Option<JoinHandle<()>>,
    stop_timeout: Duration,
}

impl Sampler {
    /// Start polling `source`. Samples are taken only while `visible` is set.
    pub fn spawn(
        source: Weak<dyn LevelSource>,
        buffer: Arc<SampleBuffer>,
        bridge: Arc<UpdateBridge>,
        visible: Arc<AtomicBool>,
        config: &MonitorConfig,
    ) -> Result<Self, MonitorError> {
        let exit = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = mpsc::channel::<()>();

        let mut frequencies = config.band_frequencies.clone();
        frequencies.truncate(buffer.band_count());

        let ctx = SamplerLoop {
            source,
            buffer,
            bridge,
            visible,
            exit: Arc::clone(&exit),
            frequencies,
            pacer: AdaptivePacer::new(config.min_sleep, config.max_sleep, config.target_cycle),
        };

        let join = thread::Builder::new()
            .name(SAMPLER_THREAD_NAME.into())
            .spawn(move || {
                let _done = ExitSignal(done_tx);
                sampler_loop(ctx);
            })
            .map_err(MonitorError::Spawn)?;

        Ok(Self { exit, done_rx, join: Some(join), stop_timeout: config.stop_timeout })
    }

    pub fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|j| !j.is_finished())
    }

    /// Ask the loop to finish and wait up to the configured timeout.
    pub fn stop(mut self) -> Result<(), MonitorError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), MonitorError> {
        let Some(join) = self.join.take() else {
            return Ok(());
        };

        self.exit.store(true, Ordering::Release);
        join.thread().unpark();

        match self.done_rx.recv_timeout(self.stop_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                join.join().map_err(|_| MonitorError::SamplerPanicked)
            }
            Err(RecvTimeoutError::Timeout) => {
                // dropping the handle detaches the thread; it exits once the source returns
                warn!("sampler still busy after {:?}; detaching", self.stop_timeout);
                Err(MonitorError::StopTimeout(self.stop_timeout))
            }
        }
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("sampler teardown failed: {e}");
            if !thread::panicking() {
                debug_assert!(false, "sampler teardown failed: {e}");
            }
        }
    }
}

fn sampler_loop(mut ctx: SamplerLoop) {
    info!("sampler started ({} bands)", ctx.frequencies.len());
    let mut source_lost = false;
    let mut scratch = MonitorSample::silent(ctx.frequencies.len());

    while !ctx.exit.load(Ordering::Acquire) {
        let timer = CycleTimer::start();

        if ctx.visible.load(Ordering::Relaxed) {
            match ctx.source.upgrade() {
                Some(source) => {
                    if source_lost {
                        debug!("sampler: level source is back");
                        source_lost = false;
                    }
                    read_source(source.as_ref(), &ctx.frequencies, &mut scratch);
                }
                None => {
                    if !source_lost {
                        debug!("sampler: level source went away, publishing silence");
                        source_lost = true;
                    }
                    scratch.channel_peaks = [0.0; METER_CHANNELS];
                    scratch.band_magnitudes.fill(0.0);
                }
            }
            // a slow read may outlive stop(); the owner has moved on by now
            if ctx.exit.load(Ordering::Acquire) {
                break;
            }
            publish(&scratch, &ctx.buffer);
            ctx.bridge.signal();
        }

        ctx.pacer.record_cycle(timer.elapsed());
        let nap = ctx.pacer.next_sleep();
        trace!("sampler: cycle {:?}, napping {:?}", ctx.pacer.last_cost(), nap);
        nap_until(Instant::now() + nap, &ctx.exit);
    }

    info!("sampler stopped");
}

/// Read every channel and band once.
fn read_source(source: &dyn LevelSource, frequencies: &[f32], out: &mut MonitorSample) {
    for (channel, slot) in out.channel_peaks.iter_mut().enumerate() {
        *slot = sanitize(source.peak(channel));
    }
    for (slot, &hz) in out.band_magnitudes.iter_mut().zip(frequencies) {
        *slot = sanitize(source.spectrum_magnitude(hz));
    }
}

fn publish(sample: &MonitorSample, buffer: &SampleBuffer) {
    for (channel, &v) in sample.channel_peaks.iter().enumerate() {
        buffer.store_peak(channel, v);
    }
    for (band, &v) in sample.band_magnitudes.iter().enumerate() {
        buffer.store_band(band, v);
    }
}

#[inline]
fn sanitize(v: f32) -> f32 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

/// Sleep until `deadline`, waking early if asked to exit.
fn nap_until(deadline: Instant, exit: &AtomicBool) {
    loop {
        if exit.load(Ordering::Acquire) {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        thread::park_timeout(deadline - now);
    }
}
