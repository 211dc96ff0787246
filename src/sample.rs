/*
 *  sample.rs
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
//! latest raw readings, shared between the sampler thread and the renderer
//!
//! Every field is its own atomic. A reader may see band 3 from this cycle and
//! band 4 from the last one; levels move smoothly frame to frame so nobody
//! can tell. What a reader never sees is half a float.

use std::sync::atomic::Ordering;
use atomic_float::AtomicF32;

pub const METER_CHANNELS: usize = 2;    // left, right

/// One owned raw reading.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonitorSample {
    pub channel_peaks: [f32; METER_CHANNELS],
    pub band_magnitudes: Vec<f32>,
}

impl MonitorSample {
    pub fn silent(bands: usize) -> Self {
        Self { channel_peaks: [0.0; METER_CHANNELS], band_magnitudes: vec![0.0; bands] }
    }
}

#[derive(Debug)]
pub struct SampleBuffer {
    peaks: [AtomicF32; METER_CHANNELS],
    bands: Box<[AtomicF32]>,
}

impl SampleBuffer {
    pub fn new(bands: usize) -> Self {
        Self {
            peaks: [AtomicF32::new(0.0), AtomicF32::new(0.0)],
            bands: (0..bands).map(|_| AtomicF32::new(0.0)).collect(),
        }
    }

    #[inline]
    pub fn band_count(&self) -> usize { self.bands.len() }

    /// Out-of-range channels are ignored.
    #[inline]
    pub fn store_peak(&self, channel: usize, value: f32) {
        if let Some(slot) = self.peaks.get(channel) {
            slot.store(value, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn store_band(&self, band: usize, value: f32) {
        if let Some(slot) = self.bands.get(band) {
            slot.store(value, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn peak(&self, channel: usize) -> f32 {
        self.peaks.get(channel).map_or(0.0, |a| a.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn band(&self, band: usize) -> f32 {
        self.bands.get(band).map_or(0.0, |a| a.load(Ordering::Relaxed))
    }

    /// Copy the current contents out; see module notes on consistency.
    pub fn snapshot(&self) -> MonitorSample {
        let mut out = MonitorSample::silent(self.bands.len());
        self.snapshot_into(&mut out);
        out
    }

    /// Like `snapshot`, reusing `out`'s allocation.
    pub fn snapshot_into(&self, out: &mut MonitorSample) {
        for (dst, src) in out.channel_peaks.iter_mut().zip(self.peaks.iter()) {
            *dst = src.load(Ordering::Relaxed);
        }
        out.band_magnitudes.clear();
        out.band_magnitudes.extend(self.bands.iter().map(|a| a.load(Ordering::Relaxed)));
    }

    pub fn clear(&self) {
        for a in self.peaks.iter().chain(self.bands.iter()) {
            a.store(0.0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn stores_and_reads_back() {
        let buf = SampleBuffer::new(3);
        buf.store_peak(0, 0.25);
        buf.store_peak(1, 0.75);
        buf.store_band(2, 0.5);
        buf.store_peak(7, 1.0); // ignored
        buf.store_band(9, 1.0); // ignored

        assert_eq!(buf.peak(0), 0.25);
        assert_eq!(buf.peak(1), 0.75);
        assert_eq!(buf.peak(7), 0.0);
        assert_eq!(buf.band(2), 0.5);

        let snap = buf.snapshot();
        assert_eq!(snap.channel_peaks, [0.25, 0.75]);
        assert_eq!(snap.band_magnitudes, vec![0.0, 0.0, 0.5]);

        buf.clear();
        assert_eq!(buf.snapshot(), MonitorSample::silent(3));
    }

    #[test]
    fn no_torn_values_across_threads() {
        // writer only ever stores one of two bit patterns per field
        let buf = Arc::new(SampleBuffer::new(8));
        let writer = {
            let buf = Arc::clone(&buf);
            thread::spawn(move || {
                for i in 0..20_000 {
                    let v = if i % 2 == 0 { 0.123_456_7 } else { 98_765.43 };
                    for b in 0..8 { buf.store_band(b, v); }
                    buf.store_peak(0, v);
                }
            })
        };

        let mut snap = MonitorSample::silent(8);
        for _ in 0..20_000 {
            buf.snapshot_into(&mut snap);
            for v in snap.band_magnitudes.iter().chain(snap.channel_peaks.iter().take(1)) {
                assert!(*v == 0.0 || *v == 0.123_456_7 || *v == 98_765.43);
            }
        }
        writer.join().expect("writer panicked");
    }
}
