/*
 *  main.rs
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

// Terminal demo: a synthetic source feeding the meter, drawn as text.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use lymeter::config::{self, Cli};
use lymeter::visualizer::render_rows;
use lymeter::{LevelSource, SpectrumMonitor, SyntheticSource, Visualizer};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

const CLEAR_HOME: &str = "\x1b[2J\x1b[H";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli).context("loading configuration")?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        println!("{}", serde_yaml::to_string(&cfg)?);
        return Ok(());
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_level()))
        .format_timestamp_secs()
        .init();

    info!("This {} worth the Squeeze", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let monitor_cfg = cfg.monitor_config();
    let max_alpha = monitor_cfg.max_alpha;
    let source: Arc<dyn LevelSource> = Arc::new(SyntheticSource::new(cfg.demo_bpm()));

    let mut monitor = SpectrumMonitor::new(monitor_cfg).context("building monitor")?;
    monitor.set_source(Arc::downgrade(&source)).context("starting sampler")?;

    let mut viz = Visualizer::spawn(monitor, cfg.demo_height(), cfg.demo_fps());

    let run_for = async {
        match cfg.demo_duration() {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(run_for);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut out = std::io::stdout().lock();
    loop {
        tokio::select! {
            frame = viz.rx.recv() => {
                let Some(frame) = frame else {
                    warn!("visualizer stopped unexpectedly");
                    break;
                };
                let mut screen = String::from(CLEAR_HOME);
                for row in render_rows(&frame, max_alpha) {
                    screen.push_str(&row);
                    screen.push('\n');
                }
                screen.push_str("LR ");
                screen.push_str(&"^".repeat(frame.bands.len()));
                screen.push('\n');
                out.write_all(screen.as_bytes())?;
                out.flush()?;
            }
            _ = &mut ctrl_c => {
                info!("Ctrl-C received. Initiating graceful shutdown.");
                break;
            }
            _ = &mut run_for => {
                info!("demo duration reached");
                break;
            }
        }
    }
    drop(out);

    viz.shutdown().await.context("stopping visualizer")?;
    drop(source);
    Ok(())
}
