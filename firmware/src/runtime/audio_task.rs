use embassy_time::{Duration, Ticker};
use geiger_core::periodic::PeriodicStepper;
use geiger_core::sound::ToneSequencer;

use crate::board;
use crate::hw::PiezoLed;

#[embassy_executor::task]
pub async fn run(sequencer: ToneSequencer<'static, PiezoLed<'static>>) -> ! {
    #[allow(clippy::cast_possible_truncation)]
    let period_us = board::CONFIG.sound.tick_period.as_micros() as u64;
    let mut stepper = PeriodicStepper::new(sequencer);
    let mut ticker = Ticker::every(Duration::from_micros(period_us));
    loop {
        ticker.next().await;
        stepper.tick();
    }
}
