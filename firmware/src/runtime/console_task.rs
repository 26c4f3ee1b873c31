use core::fmt::Write as _;

use embassy_stm32 as hal;
use embassy_stm32::Peri;
use embassy_stm32::usart::{BufferedUart, Config as UartConfig, DataBits, Parity, StopBits};
use embassy_time::{Duration, Instant, Timer};
use embedded_io_async::{Read, Write};
use geiger_core::periodic::TickPeriod;
use geiger_core::repl::commands::CommandExecutor;
use geiger_core::repl::line::LineBuffer;
use heapless::String;
use static_cell::StaticCell;

use crate::board;
use crate::console::FirmwareConsole;

const UART_BUFFER_SIZE: usize = 256;
const REPLY_CAPACITY: usize = 1024;

static UART_TX_BUFFER: StaticCell<[u8; UART_BUFFER_SIZE]> = StaticCell::new();
static UART_RX_BUFFER: StaticCell<[u8; UART_BUFFER_SIZE]> = StaticCell::new();

embassy_stm32::bind_interrupts!(struct UartIrqs {
    USART3_4_5_6_LPUART1 => embassy_stm32::usart::BufferedInterruptHandler<hal::peripherals::USART5>;
});

fn uptime() -> core::time::Duration {
    core::time::Duration::from_micros(Instant::now().as_micros())
}

#[embassy_executor::task]
pub async fn run(
    usart: Peri<'static, hal::peripherals::USART5>,
    tx_pin: Peri<'static, hal::peripherals::PB0>,
    rx_pin: Peri<'static, hal::peripherals::PB1>,
    hv_period: TickPeriod,
) -> ! {
    let mut config = UartConfig::default();
    config.baudrate = board::CONSOLE_BAUD;
    config.data_bits = DataBits::DataBits8;
    config.stop_bits = StopBits::STOP1;
    config.parity = Parity::ParityNone;

    let uart = BufferedUart::new(
        usart,
        rx_pin,
        tx_pin,
        UART_TX_BUFFER.init([0; UART_BUFFER_SIZE]),
        UART_RX_BUFFER.init([0; UART_BUFFER_SIZE]),
        UartIrqs,
        config,
    )
    .expect("failed to initialize console UART");
    let (mut uart_tx, mut uart_rx) = uart.split();

    let mut executor = CommandExecutor::new(FirmwareConsole::new(uptime, hv_period));
    let mut line = LineBuffer::new();
    let mut reply: String<REPLY_CAPACITY> = String::new();
    let mut ingress = [0u8; 32];

    loop {
        let count = match uart_rx.read(&mut ingress).await {
            Ok(count) => count,
            Err(_) => {
                defmt::warn!("console: UART read error");
                Timer::after(Duration::from_millis(5)).await;
                continue;
            }
        };

        for &byte in &ingress[..count] {
            let Some(result) = line.push(byte) else {
                continue;
            };

            reply.clear();
            let rendered = match result {
                Ok(text) => match executor.execute(text) {
                    Ok(outcome) => write!(reply, "{outcome}\r\n"),
                    Err(error) => write!(reply, "{error}\r\n"),
                },
                Err(error) => {
                    defmt::warn!("console: dropped input line");
                    write!(reply, "error: {error}\r\n")
                }
            };
            if rendered.is_err() {
                defmt::warn!("console: reply truncated");
            }

            if uart_tx.write_all(reply.as_bytes()).await.is_err()
                || uart_tx.flush().await.is_err()
            {
                defmt::warn!("console: UART write error");
            }
        }
    }
}
