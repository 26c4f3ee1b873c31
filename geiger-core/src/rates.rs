//! Count-rate and dose-rate computation over fixed measurement windows.
//!
//! The main loop drains the pulse counter as often as it likes and feeds
//! every [`PulseDrain`] into a [`RateWindow`]. Once the window has elapsed
//! the accumulated counts are turned into a [`RateSample`].

use core::time::Duration;

use crate::pulse::PulseDrain;
use crate::tube::TubeType;

/// Rates for one completed measurement window.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RateSample {
    pub counts: u32,
    pub elapsed_ms: u32,
    pub cps: f32,
    pub cpm: f32,
    pub dose_usvh: f32,
}

impl RateSample {
    #[allow(clippy::cast_precision_loss)]
    pub fn new(counts: u32, elapsed_ms: u32, tube: TubeType) -> Self {
        let cps = if elapsed_ms == 0 {
            0.0
        } else {
            counts as f32 * 1_000.0 / elapsed_ms as f32
        };
        Self {
            counts,
            elapsed_ms,
            cps,
            cpm: cps * 60.0,
            dose_usvh: tube.dose_usvh(cps),
        }
    }
}

/// Accumulates drained counts until a window completes.
#[derive(Copy, Clone, Debug)]
pub struct RateWindow {
    window_ms: u32,
    started_ms: u32,
    counts: u32,
    total_counts: u64,
    total_ms: u64,
    last: Option<RateSample>,
}

impl RateWindow {
    /// Starts the first window at `now_ms`.
    pub fn new(window: Duration, now_ms: u32) -> Self {
        let window_ms = u32::try_from(window.as_millis()).unwrap_or(u32::MAX);
        Self {
            window_ms: window_ms.max(1),
            started_ms: now_ms,
            counts: 0,
            total_counts: 0,
            total_ms: 0,
            last: None,
        }
    }

    pub fn window_ms(&self) -> u32 {
        self.window_ms
    }

    /// Adds `drain.count` to the open window. Returns the finished sample
    /// and restarts the window once `window_ms` has passed since it opened.
    pub fn record(&mut self, drain: &PulseDrain, now_ms: u32, tube: TubeType) -> Option<RateSample> {
        self.counts = self.counts.wrapping_add(drain.count);

        let elapsed_ms = now_ms.wrapping_sub(self.started_ms);
        if elapsed_ms < self.window_ms {
            return None;
        }

        let sample = RateSample::new(self.counts, elapsed_ms, tube);
        self.total_counts += u64::from(self.counts);
        self.total_ms += u64::from(elapsed_ms);
        self.counts = 0;
        self.started_ms = now_ms;
        self.last = Some(sample);
        Some(sample)
    }

    /// Most recent completed window.
    pub fn last(&self) -> Option<RateSample> {
        self.last
    }

    /// Counts in completed windows since start-up.
    pub fn total_counts(&self) -> u64 {
        self.total_counts
    }

    /// Length of all completed windows since start-up.
    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    /// Average count rate over all completed windows.
    #[allow(clippy::cast_precision_loss)]
    pub fn accumulated_cps(&self) -> f32 {
        if self.total_ms == 0 {
            return 0.0;
        }
        self.total_counts as f32 * 1_000.0 / self.total_ms as f32
    }

    pub fn accumulated_dose_usvh(&self, tube: TubeType) -> f32 {
        tube.dose_usvh(self.accumulated_cps())
    }
}
