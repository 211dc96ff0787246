/*
 *  lib.rs
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
//! Level meter engine: a background sampler pulls peak and spectrum levels
//! from an audio engine, the render side turns them into bars that rise
//! instantly and fall smoothly, with a slower peak marker on top.
//!
//! ```text
//! LevelSource -> Sampler -> SampleBuffer -> UpdateBridge -> DecayEngine -> renderer
//! ```

pub mod band;
pub mod bridge;
pub mod config;
pub mod constants;
pub mod dbfs;
pub mod engine;
pub mod error;
pub mod fader;
pub mod monitor;
pub mod pacer;
pub mod sample;
pub mod sampler;
pub mod source;
pub mod visualizer;

pub use band::{BandState, DecayCurve, DecaySettings, Phase};
pub use bridge::UpdateBridge;
pub use engine::{BandLevel, DecayEngine, MeterFrame};
pub use error::MonitorError;
pub use monitor::{MonitorConfig, SpectrumMonitor};
pub use sample::{MonitorSample, SampleBuffer};
pub use sampler::Sampler;
pub use source::{ConstantSource, LevelSource, SyntheticSource};
pub use visualizer::{Visualizer, VizCommand};
