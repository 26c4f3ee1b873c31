use embassy_stm32::exti::ExtiInput;
use embassy_time::Instant;

use crate::acquisition;
use crate::hw::GpioLine;

/// GM pulse sense: every falling edge goes through the dead-time filter.
#[embassy_executor::task]
pub async fn run(mut input: ExtiInput<'static>, mut probe: GpioLine<'static>) -> ! {
    loop {
        input.wait_for_falling_edge().await;
        acquisition::on_pulse_edge(Instant::now().as_micros(), &mut probe);
    }
}
