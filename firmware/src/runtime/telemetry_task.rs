use embassy_time::{Duration, Instant, Ticker};

use crate::acquisition::{self, HV};
use crate::board;
use crate::telemetry::TelemetryReporter;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Drains the pulse counter and reports count rates.
#[embassy_executor::task]
pub async fn run() -> ! {
    let mut reporter = TelemetryReporter::new(&board::CONFIG, now_ms());
    let mut ticker = Ticker::every(POLL_INTERVAL);
    loop {
        ticker.next().await;
        let drain = acquisition::drain_for_telemetry();
        reporter.record(&drain, HV.read(), now_ms());
    }
}

#[allow(clippy::cast_possible_truncation)]
fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}
