/*
 *  bridge.rs
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
//! "fresh data" doorbell between the sampler and the renderer
//!
//! However many times the sampler rings before the renderer looks, the
//! renderer sees one pending refresh.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct UpdateBridge {
    pending: AtomicBool,
    notify: Notify,
    signals: AtomicU64,
    coalesced: AtomicU64,
}

impl UpdateBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sampler side. Only the first signal since the last take wakes anyone.
    pub fn signal(&self) {
        self.signals.fetch_add(1, Ordering::Relaxed);
        if self.pending.swap(true, Ordering::AcqRel) {
            self.coalesced.fetch_add(1, Ordering::Relaxed);
        } else {
            self.notify.notify_one();
        }
    }

    /// Consumer side. True if something was published since the last take.
    #[inline]
    pub fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Wait for the next refresh request and consume it.
    pub async fn wait(&self) {
        loop {
            if self.take_pending() {
                return;
            }
            self.notify.notified().await;
        }
    }

    /// Total signals received.
    pub fn signals(&self) -> u64 {
        self.signals.load(Ordering::Relaxed)
    }

    /// Signals folded into one already pending.
    pub fn coalesced(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }
}
