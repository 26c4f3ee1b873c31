#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Periodic rate reports and HV fault logging.
//!
//! [`TelemetryReporter`] turns each pulse drain into count-rate windows,
//! publishes finished windows to [`status`](crate::status), and logs one line
//! per window plus a line whenever the HV error flag changes. Messages go to
//! defmt on the target and to stdout on the host.

use geiger_core::config::{GeigerConfig, HvTiming};
use geiger_core::hv::HvReading;
use geiger_core::pulse::PulseDrain;
use geiger_core::rates::{RateSample, RateWindow};
use geiger_core::tube::TubeType;

use crate::status;

/// Change of the HV error flag between two reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HvTransition {
    Raised,
    Cleared,
}

/// What one call to [`TelemetryReporter::record`] produced.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Report {
    pub sample: Option<RateSample>,
    pub hv: Option<HvTransition>,
}

pub struct TelemetryReporter {
    window: RateWindow,
    tube: TubeType,
    hv_error: bool,
}

impl TelemetryReporter {
    pub fn new(config: &GeigerConfig, now_ms: u32) -> Self {
        Self {
            window: RateWindow::new(config.measurement_window, now_ms),
            tube: config.tube,
            hv_error: false,
        }
    }

    /// Feeds one drain and the current HV reading.
    pub fn record(&mut self, drain: &PulseDrain, hv: HvReading, now_ms: u32) -> Report {
        let mut report = Report::default();

        if let Some(sample) = self.window.record(drain, now_ms, self.tube) {
            status::record_rate(sample, self.window.total_counts(), self.window.total_ms());
            emit_rate(&sample, hv);
            report.sample = Some(sample);
        }

        if hv.error != self.hv_error {
            self.hv_error = hv.error;
            let transition = if hv.error {
                emit_hv_raised(hv.cumulative_pulses);
                HvTransition::Raised
            } else {
                emit_hv_cleared(hv.cumulative_pulses);
                HvTransition::Cleared
            };
            report.hv = Some(transition);
        }

        report
    }

    pub fn window(&self) -> &RateWindow {
        &self.window
    }
}

/// Logs the active configuration once at boot.
pub fn log_boot(config: &GeigerConfig, timing: &HvTiming) {
    emit_boot(
        config.tube.name(),
        config.dead_time_us,
        timing.period.as_micros(),
        timing.initial_interval_ticks,
        timing.max_burst_pulses,
    );
}

#[cfg(target_os = "none")]
fn emit_boot(tube: &'static str, dead_time_us: u32, hv_tick_us: u32, interval: u32, burst: u32) {
    defmt::info!(
        "multigeiger: tube={} dead-time={}us hv-tick={}us interval={}t max-burst={}",
        tube,
        dead_time_us,
        hv_tick_us,
        interval,
        burst
    );
}

#[cfg(not(target_os = "none"))]
fn emit_boot(tube: &'static str, dead_time_us: u32, hv_tick_us: u32, interval: u32, burst: u32) {
    println!(
        "multigeiger: tube={tube} dead-time={dead_time_us}us hv-tick={hv_tick_us}us interval={interval}t max-burst={burst}"
    );
}

#[cfg(target_os = "none")]
fn emit_rate(sample: &RateSample, hv: HvReading) {
    defmt::info!(
        "telemetry:rate counts={} cps={} cpm={} dose={}uSv/h hv-pulses={} hv-error={}",
        sample.counts,
        sample.cps,
        sample.cpm,
        sample.dose_usvh,
        hv.cumulative_pulses,
        hv.error
    );
}

#[cfg(not(target_os = "none"))]
fn emit_rate(sample: &RateSample, hv: HvReading) {
    println!(
        "telemetry:rate counts={} cps={:.2} cpm={:.1} dose={:.3}uSv/h hv-pulses={} hv-error={}",
        sample.counts,
        sample.cps,
        sample.cpm,
        sample.dose_usvh,
        hv.cumulative_pulses,
        hv.error
    );
}

#[cfg(target_os = "none")]
fn emit_hv_raised(pulses: u32) {
    defmt::warn!("telemetry:hv charge failed, pump idle (pulses={})", pulses);
}

#[cfg(not(target_os = "none"))]
fn emit_hv_raised(pulses: u32) {
    println!("telemetry:hv charge failed, pump idle (pulses={pulses})");
}

#[cfg(target_os = "none")]
fn emit_hv_cleared(pulses: u32) {
    defmt::info!("telemetry:hv charging again (pulses={})", pulses);
}

#[cfg(not(target_os = "none"))]
fn emit_hv_cleared(pulses: u32) {
    println!("telemetry:hv charging again (pulses={pulses})");
}
