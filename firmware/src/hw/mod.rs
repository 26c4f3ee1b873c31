//! Embassy drivers behind the core's output traits.

use embassy_stm32::gpio::Output;
use embassy_stm32::peripherals::TIM3;
use embassy_stm32::time::hz;
use embassy_stm32::timer::simple_pwm::SimplePwm;
use geiger_core::pins::OutputLine;
use geiger_core::sound::{Tone, ToneOutput};

use crate::board;

/// GPIO push-pull output used for the charge pump and the ISR probe.
pub struct GpioLine<'d> {
    pin: Output<'d>,
}

impl<'d> GpioLine<'d> {
    pub fn new(pin: Output<'d>) -> Self {
        Self { pin }
    }
}

impl OutputLine for GpioLine<'_> {
    fn set_high(&mut self) {
        self.pin.set_high();
    }

    fn set_low(&mut self) {
        self.pin.set_low();
    }
}

/// Piezo on TIM3 channel 1 plus the tick LED.
pub struct PiezoLed<'d> {
    pwm: SimplePwm<'d, TIM3>,
    led: GpioLine<'d>,
}

impl<'d> PiezoLed<'d> {
    pub fn new(pwm: SimplePwm<'d, TIM3>, led: Output<'d>) -> Self {
        Self {
            pwm,
            led: GpioLine::new(led),
        }
    }
}

impl ToneOutput for PiezoLed<'_> {
    fn apply(&mut self, tone: &Tone) {
        self.led.set_level(tone.led);

        if !tone.is_audible() {
            self.pwm.ch1().disable();
            return;
        }

        let duty = board::PIEZO_DUTY_PERCENT
            .get(usize::from(tone.volume))
            .copied()
            .unwrap_or(0);
        self.pwm.set_frequency(hz(tone.frequency_hz));
        let mut channel = self.pwm.ch1();
        channel.set_duty_cycle_percent(duty);
        channel.enable();
    }

    fn silence(&mut self) {
        self.led.set_low();
        self.pwm.ch1().disable();
    }
}
