use embassy_stm32::exti::ExtiInput;
use embassy_time::{Duration, Ticker};
use geiger_core::hv::RechargeController;
use geiger_core::periodic::{PeriodicStepper, TickPeriod};

use crate::acquisition::HV;
use crate::hw::GpioLine;

/// Latches the capacitor comparator for the running burst.
#[embassy_executor::task]
pub async fn capacitor_full(mut input: ExtiInput<'static>) -> ! {
    loop {
        input.wait_for_rising_edge().await;
        HV.on_capacitor_full();
    }
}

/// Fixed-period recharge timer.
#[embassy_executor::task]
pub async fn recharge(
    controller: RechargeController<'static, GpioLine<'static>>,
    period: TickPeriod,
) -> ! {
    let mut stepper = PeriodicStepper::new(controller);
    let mut ticker = Ticker::every(Duration::from_micros(u64::from(period.as_micros())));
    loop {
        ticker.next().await;
        stepper.tick();
    }
}
