//! HV capacitor recharge controller.
//!
//! The charge pump is a FET switched by a GPIO. Each charge pulse holds the
//! FET on for a fixed time and then off for a fixed time; a burst repeats
//! pulses until the "capacitor full" comparator fires or the burst length
//! limit is hit. Pin transitions happen one per step so the timer callback
//! never busy-waits.
//!
//! ```text
//! Init -> PulseHigh -> PulseLow -> CheckFull -+-> Full -> Init   (adaptive wait)
//!             ^                               |
//!             +------------- not full --------+-> Fail -> Init   (long cooldown)
//! ```
//!
//! [`HvShared`] holds the two pieces of state other contexts can see: the
//! capacitor-full latch (set from its own edge callback) and the
//! [`HvReading`] surfaced to the main loop. Each sits behind its own
//! critical section.

pub mod schedule;

use crate::config::{ConfigError, HvConfig, HvTiming};
use crate::periodic::StepMachine;
use crate::pins::OutputLine;
use crate::sync::Shared;

use schedule::RechargeSchedule;

/// Result of [`HvShared::read`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct HvReading {
    /// Charge pulses emitted since start-up. Wraps at `u32::MAX`.
    pub cumulative_pulses: u32,
    /// Set when the latest burst hit the length limit without the capacitor
    /// reporting full.
    pub error: bool,
}

/// Extended HV status for diagnostics.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct HvSnapshot {
    pub reading: HvReading,
    /// Completed bursts (full or failed). Wraps.
    pub bursts: u32,
    /// Pulses used by the most recent burst.
    pub last_burst_pulses: u32,
    /// Ticks the controller waits before the next burst.
    pub next_wait_ticks: u32,
}

/// HV state visible outside the recharge callback.
pub struct HvShared {
    cap_full: Shared<bool>,
    status: Shared<HvSnapshot>,
}

impl HvShared {
    pub const fn new() -> Self {
        Self {
            cap_full: Shared::new(false),
            status: Shared::new(HvSnapshot {
                reading: HvReading {
                    cumulative_pulses: 0,
                    error: false,
                },
                bursts: 0,
                last_burst_pulses: 0,
                next_wait_ticks: 0,
            }),
        }
    }

    /// Rising-edge callback for the capacitor-full comparator.
    pub fn on_capacitor_full(&self) {
        self.cap_full.set(true);
    }

    /// Cumulative pulse count and error flag; does not reset anything.
    pub fn read(&self) -> HvReading {
        self.status.with(|status| status.reading)
    }

    pub fn snapshot(&self) -> HvSnapshot {
        self.status.get()
    }

    fn capacitor_full(&self) -> bool {
        self.cap_full.get()
    }

    fn clear_capacitor_full(&self) {
        self.cap_full.set(false);
    }

    fn record_burst(&self, pulses: u32, error: bool, next_wait_ticks: u32) {
        self.status.with(|status| {
            status.reading.error = error;
            status.reading.cumulative_pulses =
                status.reading.cumulative_pulses.wrapping_add(pulses);
            status.bursts = status.bursts.wrapping_add(1);
            status.last_burst_pulses = pulses;
            status.next_wait_ticks = next_wait_ticks;
        });
    }
}

impl Default for HvShared {
    fn default() -> Self {
        Self::new()
    }
}

/// Recharge state machine phases.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RechargeState {
    Init,
    PulseHigh,
    PulseLow,
    CheckFull,
    Full,
    Fail,
}

/// How the most recent burst ended.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BurstOutcome {
    Full { pulses: u32 },
    Failed { pulses: u32 },
}

impl BurstOutcome {
    pub const fn pulses(self) -> u32 {
        match self {
            BurstOutcome::Full { pulses } | BurstOutcome::Failed { pulses } => pulses,
        }
    }
}

/// Periodic-callback side of the HV regulator. Owns the charge pump pin.
pub struct RechargeController<'a, P> {
    shared: &'a HvShared,
    pump: P,
    timing: HvTiming,
    schedule: RechargeSchedule,
    state: RechargeState,
    burst_pulses: u32,
    last_outcome: Option<BurstOutcome>,
}

impl<'a, P: OutputLine> RechargeController<'a, P> {
    /// Validates `config`, drives the pump low and arms the first burst.
    pub fn new(shared: &'a HvShared, mut pump: P, config: &HvConfig) -> Result<Self, ConfigError> {
        let timing = config.timing()?;
        pump.set_low();
        Ok(Self {
            shared,
            pump,
            timing,
            schedule: RechargeSchedule::new(
                timing.initial_interval_ticks,
                timing.min_interval_ticks,
                timing.max_interval_ticks,
                timing.law,
            ),
            state: RechargeState::Init,
            burst_pulses: 0,
            last_outcome: None,
        })
    }

    pub fn state(&self) -> RechargeState {
        self.state
    }

    pub fn schedule(&self) -> &RechargeSchedule {
        &self.schedule
    }

    /// Pulses emitted so far in the running burst.
    pub fn burst_pulses(&self) -> u32 {
        self.burst_pulses
    }

    pub fn last_outcome(&self) -> Option<BurstOutcome> {
        self.last_outcome
    }

    pub fn pump(&self) -> &P {
        &self.pump
    }

    fn finish_full(&mut self) -> u32 {
        let pulses = self.burst_pulses;
        let wait = self.schedule.adapt(pulses);
        self.shared.record_burst(pulses, false, wait);
        self.last_outcome = Some(BurstOutcome::Full { pulses });
        self.state = RechargeState::Init;
        wait
    }

    fn finish_fail(&mut self) -> u32 {
        let pulses = self.burst_pulses;
        let wait = self.timing.fail_cooldown_ticks;
        self.schedule.reset();
        self.shared.record_burst(pulses, true, wait);
        self.last_outcome = Some(BurstOutcome::Failed { pulses });
        self.state = RechargeState::Init;
        wait
    }
}

impl<P: OutputLine> StepMachine for RechargeController<'_, P> {
    fn step(&mut self) -> u32 {
        // Transitions that do not touch the pump fall through within the
        // same step; every pin transition ends the step.
        loop {
            match self.state {
                RechargeState::Init => {
                    self.burst_pulses = 0;
                    self.shared.clear_capacitor_full();
                    self.state = RechargeState::PulseHigh;
                }
                RechargeState::PulseHigh => {
                    self.pump.set_high();
                    self.state = RechargeState::PulseLow;
                    return self.timing.pulse_high_ticks;
                }
                RechargeState::PulseLow => {
                    self.pump.set_low();
                    self.state = RechargeState::CheckFull;
                    return self.timing.pulse_low_ticks;
                }
                RechargeState::CheckFull => {
                    self.burst_pulses += 1;
                    self.state = if self.shared.capacitor_full() {
                        RechargeState::Full
                    } else if self.burst_pulses < self.timing.max_burst_pulses {
                        RechargeState::PulseHigh
                    } else {
                        RechargeState::Fail
                    };
                }
                RechargeState::Full => return self.finish_full(),
                RechargeState::Fail => return self.finish_fail(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use super::*;
    use crate::periodic::PeriodicStepper;

    #[derive(Default)]
    struct Pump {
        high: bool,
        rising_edges: u32,
    }

    impl OutputLine for Pump {
        fn set_high(&mut self) {
            if !self.high {
                self.rising_edges += 1;
            }
            self.high = true;
        }

        fn set_low(&mut self) {
            self.high = false;
        }
    }

    #[test]
    fn first_step_starts_a_pulse() {
        let shared = HvShared::new();
        let mut controller =
            RechargeController::new(&shared, Pump::default(), &HvConfig::DEFAULT).unwrap();

        assert_eq!(controller.step(), 15);
        assert!(controller.pump().high);
        assert_eq!(controller.state(), RechargeState::PulseLow);

        assert_eq!(controller.step(), 10);
        assert!(!controller.pump().high);
        assert_eq!(controller.state(), RechargeState::CheckFull);
    }

    #[test]
    fn full_after_two_pulses_keeps_interval() {
        let shared = HvShared::new();
        let mut controller =
            RechargeController::new(&shared, Pump::default(), &HvConfig::DEFAULT).unwrap();

        controller.step();
        controller.step();
        // CheckFull (not full) falls through to the second pulse.
        assert_eq!(controller.step(), 15);
        controller.step();
        shared.on_capacitor_full();

        assert_eq!(controller.step(), 10_000);
        assert_eq!(controller.last_outcome(), Some(BurstOutcome::Full { pulses: 2 }));
        assert_eq!(controller.pump().rising_edges, 2);
        assert_eq!(
            shared.read(),
            HvReading {
                cumulative_pulses: 2,
                error: false
            }
        );
    }

    #[test]
    fn init_clears_a_stale_capacitor_full_signal() {
        let shared = HvShared::new();
        shared.on_capacitor_full();
        let mut controller =
            RechargeController::new(&shared, Pump::default(), &HvConfig::DEFAULT).unwrap();

        controller.step();
        controller.step();
        controller.step();
        assert_eq!(controller.burst_pulses(), 1);
        assert_eq!(controller.state(), RechargeState::PulseLow);
    }

    #[test]
    fn failed_burst_sets_error_and_cools_down() {
        let shared = HvShared::new();
        let config = HvConfig::new(
            Duration::from_millis(1),
            Duration::from_secs(10),
            3,
            Duration::from_secs(600),
        );
        let mut stepper =
            PeriodicStepper::new(RechargeController::new(&shared, Pump::default(), &config).unwrap());

        let mut waits = heapless::Vec::<u32, 8>::new();
        while stepper.machine().last_outcome().is_none() {
            let _ = waits.push(stepper.machine_mut().step());
        }

        assert_eq!(waits.as_slice(), &[15, 10, 15, 10, 15, 10, 6_000_000]);
        assert_eq!(
            stepper.machine().last_outcome(),
            Some(BurstOutcome::Failed { pulses: 3 })
        );
        assert_eq!(
            shared.read(),
            HvReading {
                cumulative_pulses: 3,
                error: true
            }
        );
        assert_eq!(stepper.machine().schedule().interval(), 10_000);
    }

    #[test]
    fn successful_burst_clears_previous_error() {
        let shared = HvShared::new();
        shared.record_burst(5, true, 6_000_000);
        let mut controller =
            RechargeController::new(&shared, Pump::default(), &HvConfig::DEFAULT).unwrap();

        controller.step();
        shared.on_capacitor_full();
        controller.step();
        controller.step();

        let snapshot = shared.snapshot();
        assert!(!snapshot.reading.error);
        assert_eq!(snapshot.reading.cumulative_pulses, 6);
        assert_eq!(snapshot.bursts, 2);
        assert_eq!(snapshot.last_burst_pulses, 1);
        assert_eq!(snapshot.next_wait_ticks, 12_500);
    }

    #[test]
    fn cumulative_and_burst_counters_wrap() {
        let shared = HvShared::new();
        shared.status.with(|status| {
            status.reading.cumulative_pulses = u32::MAX - 1;
            status.bursts = u32::MAX;
        });
        let mut controller =
            RechargeController::new(&shared, Pump::default(), &HvConfig::DEFAULT).unwrap();

        controller.step();
        controller.step();
        controller.step();
        controller.step();
        shared.on_capacitor_full();
        controller.step();

        assert_eq!(controller.last_outcome(), Some(BurstOutcome::Full { pulses: 2 }));
        let snapshot = shared.snapshot();
        assert_eq!(snapshot.reading.cumulative_pulses, 0);
        assert_eq!(snapshot.bursts, 0);
        assert_eq!(snapshot.last_burst_pulses, 2);
    }
}
