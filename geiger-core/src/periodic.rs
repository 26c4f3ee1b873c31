//! Fixed-period timer callbacks that drive variable-period state machines.
//!
//! The hardware timer fires at one constant rate and is never reprogrammed
//! from its own callback. Instead each [`StepMachine`] reports how many timer
//! ticks it wants to wait before its next step, and [`PeriodicStepper`]
//! counts those ticks down. The HV recharge controller and the tone
//! sequencer both run on top of this.

use core::time::Duration;

/// State machine advanced by a [`PeriodicStepper`].
pub trait StepMachine {
    /// Executes one step and returns the number of ticks until the next one.
    ///
    /// A return value of `0` is treated as `1`.
    fn step(&mut self) -> u32;
}

/// Timer period shared by every machine driven from the same callback.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TickPeriod {
    micros: u32,
}

impl TickPeriod {
    /// Creates a period from a microsecond count.
    pub const fn from_micros(micros: u32) -> Self {
        Self { micros }
    }

    /// Returns the period in microseconds.
    pub const fn as_micros(self) -> u32 {
        self.micros
    }

    /// Returns the period as a [`Duration`].
    pub const fn as_duration(self) -> Duration {
        Duration::from_micros(self.micros as u64)
    }

    /// Converts `duration` to whole ticks.
    ///
    /// Rounds down, except that any non-zero duration takes at least one
    /// tick. Saturates at `u32::MAX`.
    pub fn ticks(self, duration: Duration) -> u32 {
        if self.micros == 0 || duration.is_zero() {
            return 0;
        }
        let ticks = duration.as_micros() / u128::from(self.micros);
        u32::try_from(ticks).unwrap_or(u32::MAX).max(1)
    }
}

impl TryFrom<Duration> for TickPeriod {
    type Error = ();

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        match u32::try_from(value.as_micros()) {
            Ok(0) | Err(_) => Err(()),
            Ok(micros) => Ok(Self::from_micros(micros)),
        }
    }
}

/// Gates a [`StepMachine`] behind a countdown of timer ticks.
///
/// After a step that requested `n` ticks, the next step runs on the `n`-th
/// following call to [`tick`](Self::tick). The very first tick always steps.
#[derive(Debug)]
pub struct PeriodicStepper<M> {
    machine: M,
    remaining: u32,
}

impl<M> PeriodicStepper<M> {
    /// Wraps `machine`; the next tick executes its first step.
    pub const fn new(machine: M) -> Self {
        Self {
            machine,
            remaining: 0,
        }
    }

    /// Returns the wrapped machine.
    pub fn machine(&self) -> &M {
        &self.machine
    }

    /// Returns the wrapped machine mutably.
    pub fn machine_mut(&mut self) -> &mut M {
        &mut self.machine
    }
}

impl<M: StepMachine> PeriodicStepper<M> {
    /// Timer callback body. Returns `true` when the machine stepped.
    pub fn tick(&mut self) -> bool {
        if self.remaining > 1 {
            self.remaining -= 1;
            return false;
        }
        self.remaining = self.machine.step().max(1);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        wait: u32,
        steps: u32,
    }

    impl StepMachine for Fixed {
        fn step(&mut self) -> u32 {
            self.steps += 1;
            self.wait
        }
    }

    #[test]
    fn first_tick_steps_immediately() {
        let mut stepper = PeriodicStepper::new(Fixed { wait: 5, steps: 0 });
        assert!(stepper.tick());
        assert_eq!(stepper.machine().steps, 1);
    }

    #[test]
    fn steps_again_on_the_requested_tick() {
        let mut stepper = PeriodicStepper::new(Fixed { wait: 3, steps: 0 });
        let fired: heapless::Vec<bool, 8> = (0..7).map(|_| stepper.tick()).collect();
        assert_eq!(
            fired.as_slice(),
            &[true, false, false, true, false, false, true]
        );
    }

    #[test]
    fn zero_wait_is_treated_as_one_tick() {
        let mut stepper = PeriodicStepper::new(Fixed { wait: 0, steps: 0 });
        assert!(stepper.tick());
        assert!(stepper.tick());
        assert_eq!(stepper.machine().steps, 2);
    }

    #[test]
    fn tick_period_rounds_down_but_never_to_zero() {
        let period = TickPeriod::from_micros(100);
        assert_eq!(period.ticks(Duration::from_micros(1_500)), 15);
        assert_eq!(period.ticks(Duration::from_micros(150)), 1);
        assert_eq!(period.ticks(Duration::from_micros(40)), 1);
        assert_eq!(period.ticks(Duration::ZERO), 0);
        assert_eq!(period.ticks(Duration::from_secs(600)), 6_000_000);
    }

    #[test]
    fn tick_period_rejects_zero_duration() {
        assert!(TickPeriod::try_from(Duration::ZERO).is_err());
        assert_eq!(
            TickPeriod::try_from(Duration::from_millis(1)),
            Ok(TickPeriod::from_micros(1_000))
        );
    }
}
