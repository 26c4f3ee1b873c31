#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Console target backed by the live firmware state.

use core::time::Duration;

use geiger_core::hv::HvShared;
use geiger_core::periodic::TickPeriod;
use geiger_core::pulse::{PulseCounter, PulseDrain};
use geiger_core::repl::commands::ConsoleTarget;
use geiger_core::repl::status::StatusSnapshot;
use geiger_core::sound::SoundRequests;

use crate::acquisition::{self, HV, PULSES, SOUND};
use crate::status;

/// Runs console commands against the acquisition statics.
///
/// `clock` returns the time since boot. Simulation commands keep their
/// default `Unsupported` behaviour.
pub struct FirmwareConsole<C> {
    clock: C,
    hv_period: TickPeriod,
}

impl<C: Fn() -> Duration> FirmwareConsole<C> {
    pub const fn new(clock: C, hv_period: TickPeriod) -> Self {
        Self { clock, hv_period }
    }
}

impl<C: Fn() -> Duration> ConsoleTarget for FirmwareConsole<C> {
    fn pulses(&self) -> &PulseCounter {
        &PULSES
    }

    fn hv(&self) -> &HvShared {
        &HV
    }

    fn sound(&self) -> &SoundRequests {
        &SOUND
    }

    fn drain(&mut self) -> PulseDrain {
        acquisition::drain_for_console()
    }

    fn status(&mut self) -> StatusSnapshot {
        status::snapshot((self.clock)(), self.hv_period)
    }
}
