/*
 *  error.rs
 *
 *  LyMeter - worth the squeeze
 *	(c) 2020-25 Stuart Hunter
 *
 *  Errors surfaced by the monitor. Numeric trouble is never one of them;
 *  that is clamped where it happens.
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

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// OS refused to start the sampler thread
    #[error("failed to spawn sampler thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// Sampler did not wind down in time; the thread is left detached
    #[error("sampler did not stop within {0:?}")]
    StopTimeout(Duration),

    /// Sampler thread died by panic
    #[error("sampler thread panicked")]
    SamplerPanicked,

    /// Render worker task died by panic or was cancelled
    #[error("visualizer worker failed: {0}")]
    WorkerPanicked(String),

    #[error("invalid monitor configuration: {0}")]
    InvalidConfig(String),
}
