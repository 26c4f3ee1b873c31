use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32 as hal;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Level, Output, OutputType, Pull, Speed};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_stm32::time::hz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_time::Instant;
use geiger_core::hv::RechargeController;
use geiger_core::sound::{ToneSequencer, melodies};

use crate::acquisition::{self, HV, SOUND};
use crate::board;
use crate::hw::{GpioLine, PiezoLed};
use crate::telemetry;

mod audio_task;
mod console_task;
mod hv_task;
mod pulse_task;
mod telemetry_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        cortex_m::interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                cortex_m::interrupt::enable();
            }
        }
    }
}

/// Runs the pulse, recharge and audio tasks above thread mode so console
/// and telemetry formatting cannot delay them.
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

// USART1 is unused on this board; its vector only drives the executor.
#[interrupt]
unsafe fn USART1() {
    unsafe { EXECUTOR_HIGH.on_interrupt() }
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        PA1,
        PA5,
        PA6,
        PB0,
        PB1,
        PB3,
        PB4,
        EXTI0,
        EXTI1,
        TIM3,
        USART5,
        ..
    } = hal::init(config);

    let timing = board::CONFIG
        .validate()
        .expect("invalid board configuration");
    acquisition::init(Instant::now().as_micros());
    telemetry::log_boot(&board::CONFIG, &timing);

    let pulse_input = ExtiInput::new(PA0, EXTI0, Pull::None);
    let probe = GpioLine::new(Output::new(PB4, Level::Low, Speed::VeryHigh));

    let cap_full_input = ExtiInput::new(PA1, EXTI1, Pull::Down);
    let pump = GpioLine::new(Output::new(PB3, Level::Low, Speed::High));
    let recharge = RechargeController::new(&HV, pump, &board::CONFIG.hv)
        .expect("invalid HV configuration");

    let pwm = SimplePwm::new(
        TIM3,
        Some(PwmPin::new(PA6, OutputType::PushPull)),
        None,
        None,
        None,
        hz(board::PIEZO_IDLE_HZ),
        CountingMode::EdgeAlignedUp,
    );
    let speaker = PiezoLed::new(pwm, Output::new(PA5, Level::Low, Speed::Low));
    let sequencer = ToneSequencer::from_config(&SOUND, speaker, &board::CONFIG.sound);
    if board::CONFIG.sound.start_sound {
        SOUND.play(&melodies::START);
    }

    interrupt::USART1.set_priority(Priority::P1);
    let high = EXECUTOR_HIGH.start(interrupt::USART1);
    high.spawn(pulse_task::run(pulse_input, probe))
        .expect("failed to spawn pulse task");
    high.spawn(hv_task::capacitor_full(cap_full_input))
        .expect("failed to spawn capacitor-full task");
    high.spawn(hv_task::recharge(recharge, timing.period))
        .expect("failed to spawn recharge task");
    high.spawn(audio_task::run(sequencer))
        .expect("failed to spawn audio task");

    spawner
        .spawn(telemetry_task::run())
        .expect("failed to spawn telemetry task");
    spawner
        .spawn(console_task::run(USART5, PB0, PB1, timing.period))
        .expect("failed to spawn console task");

    core::future::pending::<()>().await;
}
