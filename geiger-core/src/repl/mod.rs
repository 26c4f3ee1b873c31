//! Diagnostics console shared between the firmware UART and the emulator.
//!
//! Lines are assembled by [`line`], parsed by [`grammar`] with `winnow`
//! token parsers, and executed against a [`commands::ConsoleTarget`].
//! Outcomes render through `Display`, so both front-ends print the same text.

pub mod catalog;
pub mod commands;
pub mod grammar;
pub mod line;
pub mod status;
