#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Shared status storage for the firmware target.
//!
//! The telemetry task publishes each finished measurement window here so the
//! console can build a [`StatusSnapshot`] without draining the pulse counter
//! or owning the rate window itself.

use core::cell::Cell;
use core::time::Duration;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use geiger_core::periodic::TickPeriod;
use geiger_core::rates::RateSample;
use geiger_core::repl::status::StatusSnapshot;
use portable_atomic::{AtomicU64, Ordering};

use crate::acquisition::{HV, PULSES, SOUND};
use crate::board;

/// Latest completed measurement window.
static LAST_RATE: Mutex<CriticalSectionRawMutex, Cell<Option<RateSample>>> =
    Mutex::new(Cell::new(None));
/// Counts accumulated over every finished window.
static TOTAL_COUNTS: AtomicU64 = AtomicU64::new(0);
/// Milliseconds covered by every finished window.
static TOTAL_MS: AtomicU64 = AtomicU64::new(0);

/// Publishes a finished window and the lifetime totals after it.
pub fn record_rate(sample: RateSample, total_counts: u64, total_ms: u64) {
    LAST_RATE.lock(|cell| cell.set(Some(sample)));
    TOTAL_COUNTS.store(total_counts, Ordering::Relaxed);
    TOTAL_MS.store(total_ms, Ordering::Relaxed);
}

/// Returns the most recently published window, if any.
pub fn last_rate() -> Option<RateSample> {
    LAST_RATE.lock(Cell::get)
}

/// Builds a [`StatusSnapshot`] from the shared acquisition state.
pub fn snapshot(uptime: Duration, hv_period: TickPeriod) -> StatusSnapshot {
    StatusSnapshot {
        uptime,
        dead_time_us: PULSES.dead_time_us(),
        rejected_edges: PULSES.rejected_edges(),
        tube: board::CONFIG.tube,
        rate: last_rate(),
        total_counts: TOTAL_COUNTS.load(Ordering::Relaxed),
        total_ms: TOTAL_MS.load(Ordering::Relaxed),
        hv: HV.snapshot(),
        hv_period,
        ticks: SOUND.tick_options(),
    }
}
