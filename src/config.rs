/*
 *  config.rs
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
use serde::{Deserialize, Serialize};
use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use std::{fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;

use crate::monitor::MonitorConfig;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level configuration. Every field optional so layers can be merged.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub meter: Option<MeterConfig>,
    pub sampler: Option<SamplerConfig>,
    pub demo: Option<DemoConfig>,
}

/// Decay and scaling of the bars.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MeterConfig {
    pub bands_hz: Option<Vec<f32>>,
    pub value_fade_ms: Option<u64>,
    pub peak_fade_ms: Option<u64>,
    pub floor_db: Option<f32>,
    pub ceil_db: Option<f32>,
    pub max_alpha: Option<f32>,
}

/// Background sampler pacing.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SamplerConfig {
    pub min_sleep_ms: Option<u64>,
    pub max_sleep_ms: Option<u64>,
    pub target_cycle_ms: Option<u64>,
    pub stop_timeout_ms: Option<u64>,
}

/// Knobs for the bundled text demo only.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DemoConfig {
    pub height: Option<u32>,        // bar height in rows
    pub fps: Option<u32>,
    pub bpm: Option<f32>,
    pub duration_secs: Option<u64>, // 0 or unset: run until Ctrl-C
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "lymeter", about = "LyMeter level monitor", disable_help_flag = false)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Comma separated band center frequencies in Hz
    #[arg(long, value_delimiter = ',')]
    pub bands: Option<Vec<f32>>,
    #[arg(long)]
    pub value_fade_ms: Option<u64>,
    #[arg(long)]
    pub peak_fade_ms: Option<u64>,
    #[arg(long)]
    pub height: Option<u32>,
    #[arg(long)]
    pub fps: Option<u32>,
    #[arg(long)]
    pub bpm: Option<f32>,
    #[arg(long)]
    pub duration_secs: Option<u64>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Read YAML, merge CLI, validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    if let Some(home) = home_dir() {
        let p = home.join(".config/lymeter/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/lymeter.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["lymeter.yaml", "config/lymeter.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

pub fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
pub fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some() { dst.log_level = src.log_level; }
    match (&mut dst.meter, src.meter) {
        (None, Some(m)) => dst.meter = Some(m),
        (Some(d), Some(s)) => merge_meter(d, s),
        _ => {}
    }
    match (&mut dst.sampler, src.sampler) {
        (None, Some(m)) => dst.sampler = Some(m),
        (Some(d), Some(s)) => merge_sampler(d, s),
        _ => {}
    }
    match (&mut dst.demo, src.demo) {
        (None, Some(m)) => dst.demo = Some(m),
        (Some(d), Some(s)) => merge_demo(d, s),
        _ => {}
    }
}

fn merge_meter(dst: &mut MeterConfig, src: MeterConfig) {
    if src.bands_hz.is_some()      { dst.bands_hz = src.bands_hz; }
    if src.value_fade_ms.is_some() { dst.value_fade_ms = src.value_fade_ms; }
    if src.peak_fade_ms.is_some()  { dst.peak_fade_ms = src.peak_fade_ms; }
    if src.floor_db.is_some()      { dst.floor_db = src.floor_db; }
    if src.ceil_db.is_some()       { dst.ceil_db = src.ceil_db; }
    if src.max_alpha.is_some()     { dst.max_alpha = src.max_alpha; }
}

fn merge_sampler(dst: &mut SamplerConfig, src: SamplerConfig) {
    if src.min_sleep_ms.is_some()    { dst.min_sleep_ms = src.min_sleep_ms; }
    if src.max_sleep_ms.is_some()    { dst.max_sleep_ms = src.max_sleep_ms; }
    if src.target_cycle_ms.is_some() { dst.target_cycle_ms = src.target_cycle_ms; }
    if src.stop_timeout_ms.is_some() { dst.stop_timeout_ms = src.stop_timeout_ms; }
}

fn merge_demo(dst: &mut DemoConfig, src: DemoConfig) {
    if src.height.is_some()        { dst.height = src.height; }
    if src.fps.is_some()           { dst.fps = src.fps; }
    if src.bpm.is_some()           { dst.bpm = src.bpm; }
    if src.duration_secs.is_some() { dst.duration_secs = src.duration_secs; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some() { cfg.log_level = cli.log_level.clone(); }

    let any_meter = cli.bands.is_some() || cli.value_fade_ms.is_some() || cli.peak_fade_ms.is_some();
    if any_meter && cfg.meter.is_none() {
        cfg.meter = Some(MeterConfig::default());
    }
    if let Some(meter) = cfg.meter.as_mut() {
        if cli.bands.is_some()         { meter.bands_hz = cli.bands.clone(); }
        if cli.value_fade_ms.is_some() { meter.value_fade_ms = cli.value_fade_ms; }
        if cli.peak_fade_ms.is_some()  { meter.peak_fade_ms = cli.peak_fade_ms; }
    }

    let any_demo = cli.height.is_some() || cli.fps.is_some()
        || cli.bpm.is_some() || cli.duration_secs.is_some();
    if any_demo && cfg.demo.is_none() {
        cfg.demo = Some(DemoConfig::default());
    }
    if let Some(demo) = cfg.demo.as_mut() {
        if cli.height.is_some()        { demo.height = cli.height; }
        if cli.fps.is_some()           { demo.fps = cli.fps; }
        if cli.bpm.is_some()           { demo.bpm = cli.bpm; }
        if cli.duration_secs.is_some() { demo.duration_secs = cli.duration_secs; }
    }
}

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    cfg.monitor_config()
        .validate()
        .map_err(|e| ConfigError::Validation(e.to_string()))?;

    if let Some(demo) = cfg.demo.as_ref() {
        if demo.height == Some(0) {
            return Err(ConfigError::Validation("demo height must be > 0".into()));
        }
        if let Some(fps) = demo.fps {
            if fps == 0 || fps > 240 {
                return Err(ConfigError::Validation("demo fps must be 1..=240".into()));
            }
        }
    }
    Ok(())
}

impl Config {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// Resolve against built-in defaults.
    pub fn monitor_config(&self) -> MonitorConfig {
        let mut out = MonitorConfig::default();
        if let Some(m) = self.meter.as_ref() {
            if let Some(b) = m.bands_hz.as_ref() { out.band_frequencies = b.clone(); }
            if let Some(v) = m.value_fade_ms      { out.value_fade = Duration::from_millis(v); }
            if let Some(v) = m.peak_fade_ms       { out.peak_fade = Duration::from_millis(v); }
            if let Some(v) = m.floor_db           { out.floor_db = v; }
            if let Some(v) = m.ceil_db            { out.ceil_db = v; }
            if let Some(v) = m.max_alpha          { out.max_alpha = v; }
        }
        if let Some(s) = self.sampler.as_ref() {
            if let Some(v) = s.min_sleep_ms    { out.min_sleep = Duration::from_millis(v); }
            if let Some(v) = s.max_sleep_ms    { out.max_sleep = Duration::from_millis(v); }
            if let Some(v) = s.target_cycle_ms { out.target_cycle = Duration::from_millis(v); }
            if let Some(v) = s.stop_timeout_ms { out.stop_timeout = Duration::from_millis(v); }
        }
        out
    }

    pub fn demo_height(&self) -> u32 {
        self.demo.as_ref().and_then(|d| d.height).unwrap_or(16)
    }

    pub fn demo_fps(&self) -> u32 {
        self.demo.as_ref().and_then(|d| d.fps).unwrap_or(30)
    }

    pub fn demo_bpm(&self) -> f32 {
        self.demo.as_ref().and_then(|d| d.bpm).unwrap_or(120.0)
    }

    pub fn demo_duration(&self) -> Option<Duration> {
        self.demo.as_ref()
            .and_then(|d| d.duration_secs)
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
    }
}
