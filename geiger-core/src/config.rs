//! Tunable parameters for pulse acquisition, HV regulation and sound.
//!
//! Defaults reproduce the stock MultiGeiger board. Board-specific values
//! are passed in at start-up and checked once with
//! [`GeigerConfig::validate`]; the callbacks never re-validate.

use core::fmt;
use core::time::Duration;

use crate::hv::schedule::ChargeLaw;
use crate::periodic::TickPeriod;
use crate::pulse::DEFAULT_DEAD_TIME_US;
use crate::tube::TubeType;

/// Longest dead time accepted by [`GeigerConfig::validate`].
pub const MAX_DEAD_TIME_US: u32 = 10_000;

/// Rejected configuration values.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    DeadTimeOutOfRange(u32),
    TickPeriodZero,
    PulseShorterThanTick,
    IntervalBoundsInverted,
    IntervalBelowTick,
    InitialIntervalOutOfBounds,
    BurstLengthZero,
    CooldownBelowTick,
    InvalidChargeLaw,
    MeasurementWindowZero,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::DeadTimeOutOfRange(value) => {
                write!(f, "dead time {value}us outside 1-{MAX_DEAD_TIME_US}us")
            }
            ConfigError::TickPeriodZero => f.write_str("timer tick period must be non-zero"),
            ConfigError::PulseShorterThanTick => {
                f.write_str("charge pulse high/low time shorter than one tick")
            }
            ConfigError::IntervalBoundsInverted => {
                f.write_str("minimum recharge interval exceeds maximum")
            }
            ConfigError::IntervalBelowTick => {
                f.write_str("minimum recharge interval shorter than one tick")
            }
            ConfigError::InitialIntervalOutOfBounds => {
                f.write_str("initial recharge interval outside min/max")
            }
            ConfigError::BurstLengthZero => f.write_str("max burst pulses must be at least 1"),
            ConfigError::CooldownBelowTick => f.write_str("fail cooldown shorter than one tick"),
            ConfigError::InvalidChargeLaw => {
                f.write_str("charge law needs target >= 1 and backoff >= 1")
            }
            ConfigError::MeasurementWindowZero => f.write_str("measurement window must be non-zero"),
        }
    }
}

/// HV charge pump parameters.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HvConfig {
    pub tick_period: Duration,
    pub pulse_high: Duration,
    pub pulse_low: Duration,
    pub initial_interval: Duration,
    pub min_interval: Duration,
    pub max_interval: Duration,
    pub max_burst_pulses: u32,
    pub fail_cooldown: Duration,
    pub law: ChargeLaw,
}

impl HvConfig {
    pub const DEFAULT: Self = Self {
        tick_period: Duration::from_micros(100),
        pulse_high: Duration::from_micros(1_500),
        pulse_low: Duration::from_micros(1_000),
        initial_interval: Duration::from_secs(1),
        min_interval: Duration::from_millis(1),
        max_interval: Duration::from_secs(10),
        max_burst_pulses: 3_333,
        fail_cooldown: Duration::from_secs(10 * 60),
        law: ChargeLaw::DEFAULT,
    };

    /// Defaults with the externally tunable limits replaced.
    pub const fn new(
        min_interval: Duration,
        max_interval: Duration,
        max_burst_pulses: u32,
        fail_cooldown: Duration,
    ) -> Self {
        Self {
            min_interval,
            max_interval,
            max_burst_pulses,
            fail_cooldown,
            ..Self::DEFAULT
        }
    }

    /// Converts every duration to ticks of `tick_period`.
    pub fn timing(&self) -> Result<HvTiming, ConfigError> {
        let period =
            TickPeriod::try_from(self.tick_period).map_err(|()| ConfigError::TickPeriodZero)?;

        if self.pulse_high < self.tick_period || self.pulse_low < self.tick_period {
            return Err(ConfigError::PulseShorterThanTick);
        }
        if self.min_interval > self.max_interval {
            return Err(ConfigError::IntervalBoundsInverted);
        }
        if self.min_interval < self.tick_period {
            return Err(ConfigError::IntervalBelowTick);
        }
        if self.initial_interval < self.min_interval || self.initial_interval > self.max_interval {
            return Err(ConfigError::InitialIntervalOutOfBounds);
        }
        if self.max_burst_pulses == 0 {
            return Err(ConfigError::BurstLengthZero);
        }
        if self.fail_cooldown < self.tick_period {
            return Err(ConfigError::CooldownBelowTick);
        }
        if !self.law.is_valid() {
            return Err(ConfigError::InvalidChargeLaw);
        }

        Ok(HvTiming {
            period,
            pulse_high_ticks: period.ticks(self.pulse_high),
            pulse_low_ticks: period.ticks(self.pulse_low),
            initial_interval_ticks: period.ticks(self.initial_interval),
            min_interval_ticks: period.ticks(self.min_interval),
            max_interval_ticks: period.ticks(self.max_interval),
            max_burst_pulses: self.max_burst_pulses,
            fail_cooldown_ticks: period.ticks(self.fail_cooldown),
            law: self.law,
        })
    }
}

impl Default for HvConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// [`HvConfig`] resolved to timer ticks.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HvTiming {
    pub period: TickPeriod,
    pub pulse_high_ticks: u32,
    pub pulse_low_ticks: u32,
    pub initial_interval_ticks: u32,
    pub min_interval_ticks: u32,
    pub max_interval_ticks: u32,
    pub max_burst_pulses: u32,
    pub fail_cooldown_ticks: u32,
    pub law: ChargeLaw,
}

/// Which outputs a per-pulse tick uses.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TickOptions {
    pub speaker: bool,
    pub led: bool,
}

impl TickOptions {
    pub const ALL: Self = Self {
        speaker: true,
        led: true,
    };

    /// `false` when ticks would produce neither sound nor light.
    pub const fn any(self) -> bool {
        self.speaker || self.led
    }
}

impl Default for TickOptions {
    fn default() -> Self {
        Self::ALL
    }
}

/// Tone sequencer parameters.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SoundConfig {
    /// Period of the audio timer; tone durations are counted in these ticks.
    pub tick_period: Duration,
    /// Ticks between checks for new requests while nothing plays.
    pub idle_ticks: u32,
    pub ticks: TickOptions,
    /// Play the start-up melody once at boot.
    pub start_sound: bool,
}

impl SoundConfig {
    pub const DEFAULT: Self = Self {
        tick_period: Duration::from_millis(1),
        idle_ticks: 1,
        ticks: TickOptions::ALL,
        start_sound: true,
    };
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Complete start-up configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeigerConfig {
    pub dead_time_us: u32,
    pub hv: HvConfig,
    pub sound: SoundConfig,
    pub tube: TubeType,
    /// Length of one count-rate measurement window.
    pub measurement_window: Duration,
}

impl GeigerConfig {
    pub const DEFAULT: Self = Self {
        dead_time_us: DEFAULT_DEAD_TIME_US,
        hv: HvConfig::DEFAULT,
        sound: SoundConfig::DEFAULT,
        tube: TubeType::Si22g,
        measurement_window: Duration::from_secs(1),
    };

    /// Checks every parameter and returns the resolved HV timing.
    pub fn validate(&self) -> Result<HvTiming, ConfigError> {
        if self.dead_time_us == 0 || self.dead_time_us > MAX_DEAD_TIME_US {
            return Err(ConfigError::DeadTimeOutOfRange(self.dead_time_us));
        }
        if self.sound.tick_period.is_zero() {
            return Err(ConfigError::TickPeriodZero);
        }
        if self.measurement_window.is_zero() {
            return Err(ConfigError::MeasurementWindowZero);
        }
        self.hv.timing()
    }
}

impl Default for GeigerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
