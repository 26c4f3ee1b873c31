//! GM tube pulse counting with dead-time debounce.
//!
//! The sense input has no hysteresis, so the rising edge that ends a real
//! discharge pulse can re-trigger the falling-edge interrupt. Any edge that
//! arrives less than the dead time after the last *accepted* edge is treated
//! as such an artifact and dropped.
//!
//! [`PulseCounter::on_edge`] is the edge callback; [`PulseCounter::drain`] is
//! the main-loop accessor. Both touch the counters only inside one short
//! critical section.

use crate::pins::OutputLine;
use crate::sync::Shared;

/// Default dead time in microseconds; covers the full pulse width on the
/// sense pin.
pub const DEFAULT_DEAD_TIME_US: u32 = 190;

/// Clock readings taken when an edge fired.
///
/// Both counters are free-running and allowed to wrap.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct EdgeTimestamp {
    pub micros: u32,
    pub millis: u32,
}

impl EdgeTimestamp {
    pub const fn new(micros: u32, millis: u32) -> Self {
        Self { micros, millis }
    }

    /// Derives both counters from a single microsecond reading.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_micros(micros: u64) -> Self {
        Self {
            micros: micros as u32,
            millis: (micros / 1_000) as u32,
        }
    }
}

/// Result of [`PulseCounter::drain`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PulseDrain {
    /// Pulses accepted since the previous drain.
    pub count: u32,
    /// Coarse time of the latest accepted pulse (ms).
    pub last_timestamp_ms: u32,
    /// Spacing between the latest two accepted pulses (µs); 0 until two
    /// pulses have been seen.
    pub last_interval_us: u32,
}

/// What the edge callback decided.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EdgeVerdict {
    /// Counted. `interval_us` is `None` for the first pulse after init.
    Accepted { interval_us: Option<u32> },
    /// Inside the dead-time window of the previous accepted pulse.
    Rejected { interval_us: u32 },
}

impl EdgeVerdict {
    pub const fn is_accepted(self) -> bool {
        matches!(self, EdgeVerdict::Accepted { .. })
    }
}

#[derive(Copy, Clone, Debug)]
struct PulseState {
    dead_time_us: u32,
    count: u32,
    last_timestamp_ms: u32,
    last_interval_us: u32,
    last_accepted_us: Option<u32>,
    rejected: u32,
}

impl PulseState {
    const fn new(dead_time_us: u32) -> Self {
        Self {
            dead_time_us,
            count: 0,
            last_timestamp_ms: 0,
            last_interval_us: 0,
            last_accepted_us: None,
            rejected: 0,
        }
    }

    fn accept_or_reject(&mut self, now: EdgeTimestamp) -> EdgeVerdict {
        let interval = self
            .last_accepted_us
            .map(|last| now.micros.wrapping_sub(last));

        match interval {
            Some(interval_us) if interval_us < self.dead_time_us => {
                self.rejected = self.rejected.wrapping_add(1);
                EdgeVerdict::Rejected { interval_us }
            }
            _ => {
                self.count = self.count.wrapping_add(1);
                self.last_timestamp_ms = now.millis;
                if let Some(interval_us) = interval {
                    self.last_interval_us = interval_us;
                }
                self.last_accepted_us = Some(now.micros);
                EdgeVerdict::Accepted {
                    interval_us: interval,
                }
            }
        }
    }
}

/// Debounced running pulse count shared between the edge callback and the
/// main program.
pub struct PulseCounter {
    state: Shared<PulseState>,
}

impl PulseCounter {
    /// Creates a counter using [`DEFAULT_DEAD_TIME_US`].
    pub const fn new() -> Self {
        Self::with_dead_time(DEFAULT_DEAD_TIME_US)
    }

    pub const fn with_dead_time(dead_time_us: u32) -> Self {
        Self {
            state: Shared::new(PulseState::new(dead_time_us)),
        }
    }

    /// Resets all counters and applies `dead_time_us`.
    ///
    /// `now` seeds the reported timestamp so a drain before the first pulse
    /// reports the start-up time rather than zero.
    pub fn init(&self, dead_time_us: u32, now: EdgeTimestamp) {
        self.state.with(|state| {
            *state = PulseState::new(dead_time_us);
            state.last_timestamp_ms = now.millis;
        });
    }

    /// Currently configured dead time.
    pub fn dead_time_us(&self) -> u32 {
        self.state.with(|state| state.dead_time_us)
    }

    /// Edge callback. Bounded, non-blocking, allocation free.
    pub fn on_edge(&self, now: EdgeTimestamp) -> EdgeVerdict {
        self.state.with(|state| state.accept_or_reject(now))
    }

    /// Edge callback that holds `probe` high while the edge is processed.
    pub fn on_edge_probed<P: OutputLine>(&self, now: EdgeTimestamp, probe: &mut P) -> EdgeVerdict {
        self.state.with(|state| {
            probe.set_high();
            let verdict = state.accept_or_reject(now);
            probe.set_low();
            verdict
        })
    }

    /// Reads and zeroes the running count.
    ///
    /// Timestamp and interval describe the latest accepted pulse and are left
    /// untouched.
    pub fn drain(&self) -> PulseDrain {
        self.state.with(|state| {
            let drained = PulseDrain {
                count: state.count,
                last_timestamp_ms: state.last_timestamp_ms,
                last_interval_us: state.last_interval_us,
            };
            state.count = 0;
            drained
        })
    }

    /// Edges discarded by the dead-time filter since init. Never drained.
    pub fn rejected_edges(&self) -> u32 {
        self.state.with(|state| state.rejected)
    }
}

impl Default for PulseCounter {
    fn default() -> Self {
        Self::new()
    }
}
