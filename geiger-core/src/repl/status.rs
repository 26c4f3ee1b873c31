//! `status` command surface.
//!
//! Targets fill in a [`StatusSnapshot`] from their live state without
//! draining anything; [`StatusFormatter`] renders it the same way on every
//! front-end.

use core::fmt;
use core::time::Duration;

use crate::config::TickOptions;
use crate::hv::HvSnapshot;
use crate::periodic::TickPeriod;
use crate::rates::RateSample;
use crate::tube::TubeType;

/// Point-in-time view of acquisition, HV and sound state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatusSnapshot {
    pub uptime: Duration,
    pub dead_time_us: u32,
    pub rejected_edges: u32,
    pub tube: TubeType,
    /// Latest completed measurement window, if any.
    pub rate: Option<RateSample>,
    pub total_counts: u64,
    pub total_ms: u64,
    pub hv: HvSnapshot,
    /// Recharge timer period, used to render HV waits.
    pub hv_period: TickPeriod,
    pub ticks: TickOptions,
}

/// Renders a [`StatusSnapshot`] as text lines.
#[derive(Clone, Copy, Debug)]
pub struct StatusFormatter<'a> {
    snapshot: &'a StatusSnapshot,
}

impl<'a> StatusFormatter<'a> {
    #[must_use]
    pub const fn new(snapshot: &'a StatusSnapshot) -> Self {
        Self { snapshot }
    }

    /// `pulses uptime=12.3s dead-time=190us rejected=4 tube=Radiation Si22G`
    pub fn write_pulse_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        writer.write_str("pulses uptime=")?;
        write_duration(writer, self.snapshot.uptime)?;
        write!(
            writer,
            " dead-time={}us rejected={} tube={}",
            self.snapshot.dead_time_us, self.snapshot.rejected_edges, self.snapshot.tube
        )
    }

    /// `rate counts=60 cps=60.00 cpm=3600.0 dose=4.886uSv/h total=600/10.0s`
    pub fn write_rate_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        writer.write_str("rate ")?;
        match self.snapshot.rate {
            Some(sample) => write!(
                writer,
                "counts={} cps={:.2} cpm={:.1} dose={:.3}uSv/h",
                sample.counts, sample.cps, sample.cpm, sample.dose_usvh
            )?,
            None => writer.write_str("n/a")?,
        }
        write!(writer, " total={}/", self.snapshot.total_counts)?;
        write_duration(writer, Duration::from_millis(self.snapshot.total_ms))
    }

    /// `hv pulses=1234 bursts=56 last-burst=2 next=1.0s error=no`
    pub fn write_hv_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        let hv = &self.snapshot.hv;
        write!(
            writer,
            "hv pulses={} bursts={} last-burst={} next=",
            hv.reading.cumulative_pulses, hv.bursts, hv.last_burst_pulses
        )?;
        let wait = self.snapshot.hv_period.as_duration() * hv.next_wait_ticks;
        write_duration(writer, wait)?;
        writer.write_str(if hv.reading.error {
            " error=yes"
        } else {
            " error=no"
        })
    }

    /// `sound speaker=on led=off`
    pub fn write_sound_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        write!(
            writer,
            "sound speaker={} led={}",
            on_off(self.snapshot.ticks.speaker),
            on_off(self.snapshot.ticks.led)
        )
    }
}

impl fmt::Display for StatusFormatter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_pulse_line(f)?;
        f.write_str("\n")?;
        self.write_rate_line(f)?;
        f.write_str("\n")?;
        self.write_hv_line(f)?;
        f.write_str("\n")?;
        self.write_sound_line(f)
    }
}

pub(crate) const fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

pub(crate) fn write_duration<W: fmt::Write>(writer: &mut W, duration: Duration) -> fmt::Result {
    if duration >= Duration::from_secs(1) {
        let millis = duration.as_millis();
        write!(writer, "{}.{}s", millis / 1_000, (millis % 1_000) / 100)
    } else if duration >= Duration::from_millis(1) {
        write!(writer, "{}ms", duration.as_millis())
    } else {
        write!(writer, "{}us", duration.as_micros())
    }
}

#[cfg(test)]
mod tests {
    use core::fmt::Write as _;

    use super::*;
    use crate::hv::HvReading;

    fn snapshot() -> StatusSnapshot {
        StatusSnapshot {
            uptime: Duration::from_millis(12_345),
            dead_time_us: 190,
            rejected_edges: 4,
            tube: TubeType::Si22g,
            rate: None,
            total_counts: 0,
            total_ms: 0,
            hv: HvSnapshot {
                reading: HvReading {
                    cumulative_pulses: 1_234,
                    error: false,
                },
                bursts: 56,
                last_burst_pulses: 2,
                next_wait_ticks: 10_000,
            },
            hv_period: TickPeriod::from_micros(100),
            ticks: TickOptions {
                speaker: true,
                led: false,
            },
        }
    }

    #[test]
    fn formats_hv_line() {
        let snapshot = snapshot();
        let mut line = heapless::String::<96>::new();
        StatusFormatter::new(&snapshot)
            .write_hv_line(&mut line)
            .unwrap();
        assert_eq!(
            line.as_str(),
            "hv pulses=1234 bursts=56 last-burst=2 next=1.0s error=no"
        );
    }

    #[test]
    fn formats_pulse_and_sound_lines() {
        let snapshot = snapshot();
        let formatter = StatusFormatter::new(&snapshot);

        let mut line = heapless::String::<96>::new();
        formatter.write_pulse_line(&mut line).unwrap();
        assert_eq!(
            line.as_str(),
            "pulses uptime=12.3s dead-time=190us rejected=4 tube=Radiation Si22G"
        );

        line.clear();
        formatter.write_sound_line(&mut line).unwrap();
        assert_eq!(line.as_str(), "sound speaker=on led=off");
    }

    #[test]
    fn missing_rate_renders_as_not_available() {
        let snapshot = snapshot();
        let mut line = heapless::String::<96>::new();
        StatusFormatter::new(&snapshot)
            .write_rate_line(&mut line)
            .unwrap();
        assert_eq!(line.as_str(), "rate n/a total=0/0us");

        let mut text = heapless::String::<256>::new();
        write!(text, "{}", StatusFormatter::new(&snapshot)).unwrap();
        assert_eq!(text.lines().count(), 4);
    }
}
