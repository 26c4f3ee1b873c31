#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Interrupt-side state shared by every firmware task.
//!
//! The pulse counter, HV status and sound requests live in statics so the
//! edge tasks, the periodic tickers and the console all reach the same
//! instances. Each one guards itself with a critical section.

use geiger_core::hv::HvShared;
use geiger_core::pins::OutputLine;
use geiger_core::pulse::{EdgeTimestamp, EdgeVerdict, PulseCounter, PulseDrain};
use geiger_core::sound::SoundRequests;
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use crate::board;

pub static PULSES: PulseCounter = PulseCounter::with_dead_time(board::CONFIG.dead_time_us);
pub static HV: HvShared = HvShared::new();
pub static SOUND: SoundRequests = SoundRequests::new();

/// Pitch of the next per-pulse tick; flips on every accepted pulse.
static NEXT_TICK_HIGH: AtomicBool = AtomicBool::new(true);

/// Pulses drained by the console that telemetry has not counted yet.
static CONSOLE_DRAINED: AtomicU32 = AtomicU32::new(0);

#[cfg(test)]
pub(crate) static TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Converts a microsecond uptime reading to the counter timestamp.
pub const fn timestamp(uptime_us: u64) -> EdgeTimestamp {
    EdgeTimestamp::from_micros(uptime_us)
}

/// Re-arms the pulse counter at boot.
pub fn init(uptime_us: u64) {
    PULSES.init(board::CONFIG.dead_time_us, timestamp(uptime_us));
}

/// Pulse-sense edge handler: counts the edge and queues an alternating
/// high/low tick when it is accepted.
pub fn on_pulse_edge<P: OutputLine>(uptime_us: u64, probe: &mut P) -> EdgeVerdict {
    let verdict = PULSES.on_edge_probed(timestamp(uptime_us), probe);
    if verdict.is_accepted() {
        let high = NEXT_TICK_HIGH.fetch_xor(true, Ordering::Relaxed);
        SOUND.tick(high);
    }
    verdict
}

/// Console-side drain. The count is carried over to the next telemetry
/// drain so the rate window still sees these pulses.
pub fn drain_for_console() -> PulseDrain {
    let drained = PULSES.drain();
    CONSOLE_DRAINED.fetch_add(drained.count, Ordering::Relaxed);
    drained
}

/// Telemetry-side drain, including pulses the console took since the
/// previous poll.
pub fn drain_for_telemetry() -> PulseDrain {
    let mut drained = PULSES.drain();
    let carried = CONSOLE_DRAINED.swap(0, Ordering::Relaxed);
    drained.count = drained.count.wrapping_add(carried);
    drained
}
