//! Adaptive recharge interval.
//!
//! How often the HV capacitor needs topping up depends on radiation level,
//! humidity, diode leakage (temperature) and tube type. The controller aims
//! for bursts of [`ChargeLaw::target_pulses`]: a single pulse does not prove
//! the capacitor needed charge at all, two pulses show it needed a little.
//! Fewer pulses than the target stretch the interval by the backoff ratio,
//! more pulses shrink it in proportion to the excess.

/// Control law constants.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ChargeLaw {
    /// Burst length treated as the operating point.
    pub target_pulses: u32,
    pub backoff_numerator: u32,
    pub backoff_denominator: u32,
}

impl ChargeLaw {
    /// Target of two pulses, stretch by 5/4 when under target.
    pub const DEFAULT: Self = Self {
        target_pulses: 2,
        backoff_numerator: 5,
        backoff_denominator: 4,
    };

    pub const fn is_valid(&self) -> bool {
        self.target_pulses >= 1
            && self.backoff_denominator > 0
            && self.backoff_numerator >= self.backoff_denominator
    }
}

impl Default for ChargeLaw {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Ticks between the end of one burst and the start of the next.
///
/// Always within `[min, max]`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RechargeSchedule {
    interval: u32,
    default_interval: u32,
    min: u32,
    max: u32,
    law: ChargeLaw,
}

impl RechargeSchedule {
    /// Creates a schedule starting at `default_interval`, clamped to the
    /// bounds. Swapped bounds are reordered.
    pub fn new(default_interval: u32, min: u32, max: u32, law: ChargeLaw) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let default_interval = default_interval.clamp(min, max);
        Self {
            interval: default_interval,
            default_interval,
            min,
            max,
            law,
        }
    }

    /// Current interval in ticks.
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    /// `(min, max)` interval bounds in ticks.
    pub const fn bounds(&self) -> (u32, u32) {
        (self.min, self.max)
    }

    /// Adjusts the interval after a successful burst that used
    /// `pulses_used` charge pulses and returns the new interval.
    pub fn adapt(&mut self, pulses_used: u32) -> u32 {
        let current = u64::from(self.interval);
        let target = u64::from(self.law.target_pulses);
        let pulses = u64::from(pulses_used);

        let next = if pulses < target {
            let numerator = u64::from(self.law.backoff_numerator);
            let denominator = u64::from(self.law.backoff_denominator.max(1));
            let stretched = current * numerator / denominator;
            // Short intervals would otherwise round back to themselves.
            if numerator > denominator {
                stretched.max(current + 1)
            } else {
                stretched
            }
        } else {
            current * target / pulses.max(1)
        };

        self.interval = u32::try_from(next)
            .unwrap_or(u32::MAX)
            .clamp(self.min, self.max);
        self.interval
    }

    /// Returns to the default interval (after a failed burst).
    pub fn reset(&mut self) {
        self.interval = self.default_interval;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(interval: u32) -> RechargeSchedule {
        RechargeSchedule::new(interval, 10, 100_000, ChargeLaw::DEFAULT)
    }

    #[test]
    fn single_pulse_stretches_interval() {
        let mut schedule = schedule(10_000);
        assert_eq!(schedule.adapt(1), 12_500);
    }

    #[test]
    fn target_pulse_count_keeps_interval() {
        let mut schedule = schedule(10_000);
        assert_eq!(schedule.adapt(2), 10_000);
    }

    #[test]
    fn excess_pulses_shrink_proportionally() {
        let mut schedule = schedule(10_000);
        assert_eq!(schedule.adapt(4), 5_000);
        assert_eq!(schedule.adapt(10), 1_000);
    }

    #[test]
    fn interval_is_clamped_to_bounds() {
        let mut stretched = schedule(90_000);
        assert_eq!(stretched.adapt(1), 100_000);

        let mut shrunk = schedule(20);
        assert_eq!(shrunk.adapt(3_333), 10);
    }

    #[test]
    fn single_tick_interval_still_grows() {
        let mut schedule = RechargeSchedule::new(3, 1, 100_000, ChargeLaw::DEFAULT);
        let mut previous = schedule.interval();
        for _ in 0..30 {
            let next = schedule.adapt(1);
            assert!(next > previous, "interval stuck at {previous}");
            previous = next;
        }

        let mut floor = RechargeSchedule::new(1, 1, 100_000, ChargeLaw::DEFAULT);
        assert_eq!(floor.adapt(1), 2);
    }

    #[test]
    fn unit_backoff_leaves_interval_unchanged() {
        let law = ChargeLaw {
            backoff_numerator: 1,
            backoff_denominator: 1,
            ..ChargeLaw::DEFAULT
        };
        let mut schedule = RechargeSchedule::new(3, 1, 100, law);
        assert_eq!(schedule.adapt(1), 3);
    }

    #[test]
    fn reset_restores_default() {
        let mut schedule = schedule(10_000);
        schedule.adapt(5);
        schedule.reset();
        assert_eq!(schedule.interval(), 10_000);
    }

    #[test]
    fn swapped_bounds_are_reordered() {
        let schedule = RechargeSchedule::new(50, 100, 10, ChargeLaw::DEFAULT);
        assert_eq!(schedule.bounds(), (10, 100));
        assert_eq!(schedule.interval(), 50);
    }
}
