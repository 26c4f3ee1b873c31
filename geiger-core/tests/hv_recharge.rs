use core::time::Duration;

use geiger_core::config::HvConfig;
use geiger_core::hv::schedule::{ChargeLaw, RechargeSchedule};
use geiger_core::hv::{BurstOutcome, HvShared, RechargeController};
use geiger_core::periodic::{PeriodicStepper, StepMachine};
use geiger_core::pins::OutputLine;

#[derive(Default)]
struct Pump {
    high: bool,
    pulses: u32,
}

impl OutputLine for Pump {
    fn set_high(&mut self) {
        self.high = true;
    }

    fn set_low(&mut self) {
        if self.high {
            self.pulses += 1;
        }
        self.high = false;
    }
}

/// Steps through one burst, raising the capacitor-full signal once
/// `full_after` pulses have been emitted (never if `None`).
fn run_burst(
    controller: &mut RechargeController<'_, Pump>,
    shared: &HvShared,
    full_after: Option<u32>,
) -> BurstOutcome {
    let bursts = shared.snapshot().bursts;
    let start_pulses = controller.pump().pulses;
    loop {
        controller.step();
        if shared.snapshot().bursts != bursts {
            return controller.last_outcome().expect("burst finished");
        }
        let emitted = controller.pump().pulses - start_pulses;
        if full_after.is_some_and(|limit| emitted >= limit) {
            shared.on_capacitor_full();
        }
    }
}

fn config(max_burst: u32) -> HvConfig {
    HvConfig::new(
        Duration::from_millis(1),
        Duration::from_secs(10),
        max_burst,
        Duration::from_secs(600),
    )
}

#[test]
fn burst_length_stays_within_bounds() {
    let shared = HvShared::new();
    let mut controller = RechargeController::new(&shared, Pump::default(), &config(50)).unwrap();

    for full_after in [Some(1), Some(2), Some(7), Some(50), None] {
        let outcome = run_burst(&mut controller, &shared, full_after);
        assert!((1..=50).contains(&outcome.pulses()), "{outcome:?}");
    }
}

#[test]
fn error_flag_iff_limit_reached_without_full_signal() {
    let shared = HvShared::new();
    let mut controller = RechargeController::new(&shared, Pump::default(), &config(20)).unwrap();

    let outcome = run_burst(&mut controller, &shared, None);
    assert_eq!(outcome, BurstOutcome::Failed { pulses: 20 });
    assert!(shared.read().error);

    // Full on exactly the last allowed pulse is still a success.
    let outcome = run_burst(&mut controller, &shared, Some(20));
    assert_eq!(outcome, BurstOutcome::Full { pulses: 20 });
    assert!(!shared.read().error);

    assert_eq!(shared.read().cumulative_pulses, 40);
}

#[test]
fn stepper_honours_requested_waits() {
    let shared = HvShared::new();
    let controller = RechargeController::new(&shared, Pump::default(), &HvConfig::DEFAULT).unwrap();
    let mut stepper = PeriodicStepper::new(controller);

    // First tick raises the pump for 15 ticks.
    assert!(stepper.tick());
    assert!(stepper.machine().pump().high);
    for _ in 0..14 {
        assert!(!stepper.tick());
        assert!(stepper.machine().pump().high);
    }
    assert!(stepper.tick());
    assert!(!stepper.machine().pump().high);
}

/// Deterministic xorshift32 so the property test is reproducible.
struct XorShift(u32);

impl XorShift {
    fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }
}

#[test]
fn adaptive_interval_never_leaves_its_bounds() {
    let (min, max) = (10, 100_000);
    let mut schedule = RechargeSchedule::new(10_000, min, max, ChargeLaw::DEFAULT);
    let mut rng = XorShift(0x9e37_79b9);

    for _ in 0..100_000 {
        let roll = rng.next();
        if roll % 97 == 0 {
            schedule.reset();
        } else {
            // Mostly short bursts with the occasional long one.
            let pulses = match roll % 4 {
                0 => 1 + rng.next() % 3_333,
                _ => 1 + rng.next() % 4,
            };
            schedule.adapt(pulses);
        }
        let interval = schedule.interval();
        assert!((min..=max).contains(&interval), "interval {interval} escaped");
    }
}

#[test]
fn interval_shape_follows_burst_length() {
    let mut schedule = RechargeSchedule::new(10_000, 10, 100_000, ChargeLaw::DEFAULT);
    let steady = schedule.adapt(2);
    let longer = schedule.adapt(1);
    let shorter = schedule.adapt(5);

    assert_eq!(steady, 10_000);
    assert!(longer > steady);
    assert!(shorter < longer);
}
