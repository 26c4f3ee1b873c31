#![no_std]

// Pulse acquisition and HV regulation logic shared by the MultiGeiger firmware
// and the host emulator.
//
// Everything in this crate is interrupt-safe plumbing or pure state machines.
// Hardware access is injected through the traits in `pins` and `sound`, so the
// same code runs on the MCU and under host tests.

pub mod config;
pub mod hv;
pub mod periodic;
pub mod pins;
pub mod pulse;
pub mod rates;
pub mod repl;
pub mod sound;
pub mod sync;
pub mod tube;
