/*
 *  visualizer.rs
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
//! render-side driver - ticks the monitor and hands finished frames to
//! whoever draws them
//!

use tokio::sync::mpsc::{self, Sender, Receiver};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval, Duration, MissedTickBehavior};
use std::time::Instant;

use log::{info, debug, error};

use crate::engine::{BandLevel, MeterFrame};
use crate::error::MonitorError;
use crate::monitor::SpectrumMonitor;

/// Commands sent to the render worker.
#[derive(Debug, Clone)]
pub enum VizCommand {
    Enable(bool),   // show/hide; hidden monitors skip sampling
    Resize(u32),    // new bar height, resets decay state
    Shutdown,       // stop worker
}

/// Handle to the render worker.
pub struct Visualizer {
    cmd_tx: Sender<VizCommand>,
    join: Option<JoinHandle<Result<(), MonitorError>>>,
    /// Consumer takes frames from here.
    pub rx: Receiver<MeterFrame>,
}

impl Visualizer {
    /// Spawn the worker onto the current tokio runtime. It owns `monitor`
    /// from here on and stops its sampler on the way out.
    pub fn spawn(monitor: SpectrumMonitor, height: u32, fps: u32) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<VizCommand>(16);
        // small queue; a slow consumer loses frames rather than lagging
        let (out_tx, out_rx) = mpsc::channel::<MeterFrame>(4);

        let frame = Duration::from_micros(1_000_000u64 / u64::from(fps.max(1)));
        let join = tokio::spawn(visualizer_worker(monitor, cmd_rx, out_tx, height, frame));

        Self { cmd_tx, join: Some(join), rx: out_rx }
    }

    // Keep caller-side simple (no .await); best-effort send.
    pub fn enable(&self, on: bool) {
        let _ = self.cmd_tx.try_send(VizCommand::Enable(on));
    }

    pub fn resize(&self, height: u32) {
        let _ = self.cmd_tx.try_send(VizCommand::Resize(height));
    }

    /// Stop the worker and wait for the sampler behind it to wind down.
    pub async fn shutdown(mut self) -> Result<(), MonitorError> {
        let _ = self.cmd_tx.send(VizCommand::Shutdown).await;
        match self.join.take() {
            Some(handle) => worker_outcome(handle.await),
            None => Ok(()),
        }
    }
}

impl Drop for Visualizer {
    fn drop(&mut self) {
        // worker sees the closed channel and shuts down on its own
        let _ = self.cmd_tx.try_send(VizCommand::Shutdown);
    }
}

/// Flatten the worker's join result, keeping a worker crash apart from a
/// sampler one.
fn worker_outcome(joined: Result<Result<(), MonitorError>, JoinError>) -> Result<(), MonitorError> {
    match joined {
        Ok(res) => res,
        Err(e) => {
            error!("visualizer worker died: {e}");
            Err(MonitorError::WorkerPanicked(e.to_string()))
        }
    }
}

async fn visualizer_worker(
    mut monitor: SpectrumMonitor,
    mut cmd_rx: Receiver<VizCommand>,
    out_tx: Sender<MeterFrame>,
    mut height: u32,
    frame: Duration,
) -> Result<(), MonitorError> {
    let bridge = monitor.bridge();
    let mut tick = interval(frame);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last: Option<MeterFrame> = None;

    info!("visualizer worker started ({}px, {:?}/frame)", height, frame);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(VizCommand::Enable(on)) => {
                    debug!("visualizer: {}", if on { "shown" } else { "hidden" });
                    monitor.set_visible(on);
                }
                Some(VizCommand::Resize(h)) => {
                    height = h;
                    monitor.resized();
                    last = None;
                }
                Some(VizCommand::Shutdown) | None => break,
            },
            // fresh samples: repaint now rather than on the next tick
            _ = bridge.wait() => {
                publish(&mut monitor, &out_tx, height, &mut last);
            }
            // no new samples: keep the decay animating
            _ = tick.tick() => {
                publish(&mut monitor, &out_tx, height, &mut last);
            }
        }
    }

    info!("visualizer worker stopping");
    // stopping the sampler may block up to its timeout
    match tokio::task::spawn_blocking(move || monitor.shutdown()).await {
        Ok(res) => res.inspect_err(|e| error!("visualizer: {e}")),
        Err(_) => Err(MonitorError::SamplerPanicked),
    }
}

#[inline]
fn publish(
    monitor: &mut SpectrumMonitor,
    tx: &Sender<MeterFrame>,
    height: u32,
    last: &mut Option<MeterFrame>,
) {
    if !monitor.is_visible() {
        return;
    }
    // pending flag may already have been taken by bridge.wait(); that is fine
    monitor.refresh(height as f32, Instant::now());
    let frame = monitor.frame();
    if last.as_ref() == Some(&frame) {
        return;
    }
    // Best-effort, non-blocking; if the queue is full, drop the frame.
    let _ = tx.try_send(frame.clone());
    *last = Some(frame);
}

/// Draw a frame as text rows, top row first: two channel bars, a gap, then
/// the spectrum bands. `#` is the bar, `=` a fresh peak cap, `-` an aged one.
pub fn render_rows(frame: &MeterFrame, max_alpha: f32) -> Vec<String> {
    let rows = frame.scale_max.max(0.0).round() as usize;
    let columns: Vec<Option<&BandLevel>> = frame.channels.iter().map(Some)
        .chain(std::iter::once(None))
        .chain(frame.bands.iter().map(Some))
        .collect();

    (0..rows)
        .map(|r| {
            // row index counted from the bottom, 1-based
            let y = (rows - r) as f32;
            columns.iter().map(|col| match col {
                None => ' ',
                Some(b) => cell(b, y, max_alpha),
            }).collect()
        })
        .collect()
}

#[inline]
fn cell(b: &BandLevel, y: f32, max_alpha: f32) -> char {
    if b.peak > 0.0 && b.peak.ceil() == y && b.peak > b.value {
        // fade alpha grows as the peak ages; brightness goes the other way
        let brightness = if max_alpha > 0.0 { 1.0 - b.peak_highlight_alpha / max_alpha } else { 1.0 };
        if brightness > 0.5 { '=' } else { '-' }
    } else if b.value >= y - 0.5 {
        '#'
    } else {
        ' '
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::MonitorConfig;
    use crate::source::{ConstantSource, LevelSource};
    use std::sync::Arc;

    fn level(value: f32, peak: f32, alpha: f32) -> BandLevel {
        BandLevel { value, peak, peak_highlight_alpha: alpha }
    }

    #[test]
    fn rows_draw_bars_and_caps() {
        let frame = MeterFrame {
            scale_max: 4.0,
            channels: [level(4.0, 4.0, 0.0), level(0.0, 0.0, 0.4)],
            bands: vec![level(1.0, 3.0, 0.0), level(2.0, 3.0, 0.39)],
        };
        let rows = render_rows(&frame, 0.4);
        assert_eq!(rows, vec![
            "#    ".to_string(),
            "#  =-".to_string(),
            "#   #".to_string(),
            "#  ##".to_string(),
        ]);
    }

    #[test]
    fn empty_scale_draws_nothing() {
        let frame = MeterFrame { scale_max: 0.0, ..MeterFrame::default() };
        assert!(render_rows(&frame, 0.4).is_empty());
    }

    #[tokio::test]
    async fn worker_crash_is_not_blamed_on_the_sampler() {
        let handle = tokio::spawn(async {
            if Instant::now().elapsed() < Duration::from_secs(3600) {
                panic!("render worker blew up");
            }
            Ok::<(), MonitorError>(())
        });
        match worker_outcome(handle.await) {
            Err(MonitorError::WorkerPanicked(msg)) => assert!(msg.contains("panic")),
            other => panic!("unexpected outcome: {other:?}"),
        }

        assert!(worker_outcome(Ok(Ok(()))).is_ok());
        assert!(matches!(
            worker_outcome(Ok(Err(MonitorError::SamplerPanicked))),
            Err(MonitorError::SamplerPanicked)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn worker_streams_frames() {
        let source: Arc<dyn LevelSource> = Arc::new(ConstantSource::new(0.5, 0.5));
        let mut monitor = SpectrumMonitor::new(MonitorConfig::default()).expect("monitor");
        monitor.set_source(Arc::downgrade(&source)).expect("source");

        let mut viz = Visualizer::spawn(monitor, 32, 60);
        let frame = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                match viz.rx.recv().await {
                    Some(f) if f.channels[0].value > 0.0 => break f,
                    Some(_) => continue,
                    None => panic!("worker went away"),
                }
            }
        })
        .await
        .expect("no frame in time");

        assert_eq!(frame.scale_max, 32.0);
        assert_eq!(frame.bands.len(), 11);
        assert!(frame.bands.iter().all(|b| b.peak >= b.value));

        viz.resize(16);
        viz.enable(false);
        viz.shutdown().await.expect("clean shutdown");
    }
}
