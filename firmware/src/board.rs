#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! MultiGeiger board wiring and start-up configuration.
//!
//! | Signal            | Pin  | Peripheral        |
//! |-------------------|------|-------------------|
//! | GM pulse sense    | PA0  | EXTI0, falling    |
//! | HV capacitor full | PA1  | EXTI1, rising     |
//! | charge pump FET   | PB3  | GPIO out          |
//! | ISR debug probe   | PB4  | GPIO out          |
//! | piezo             | PA6  | TIM3_CH1 PWM      |
//! | tick LED          | PA5  | GPIO out          |
//! | console TX / RX   | PB0 / PB1 | USART5       |

use core::time::Duration;

use geiger_core::config::{GeigerConfig, HvConfig};
use geiger_core::tube::TubeType;

/// Console UART baud rate.
pub const CONSOLE_BAUD: u32 = 115_200;

/// Idle frequency programmed into the piezo timer while silent.
pub const PIEZO_IDLE_HZ: u32 = 1_000;

/// PWM duty (percent) per volume level, indexed by `Tone::volume`.
pub const PIEZO_DUTY_PERCENT: [u8; 3] = [0, 10, 50];

/// Configuration applied at boot.
pub const CONFIG: GeigerConfig = GeigerConfig {
    tube: TubeType::Si22g,
    hv: HvConfig::new(
        Duration::from_millis(1),
        Duration::from_secs(10),
        3_333,
        Duration::from_secs(10 * 60),
    ),
    ..GeigerConfig::DEFAULT
};
