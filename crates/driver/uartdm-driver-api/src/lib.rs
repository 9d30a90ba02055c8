//! Driver framework contracts for serial controllers.
//!
//! The driver crate implements these; the surrounding system (device
//! framework, buffer layer, console registration) calls through them.
//!
//! - [`Driver`]: identity and metadata.
//! - [`LowLevelUart`]: polling operations usable without interrupts.
//! - [`UartDevice`]: the interrupt-driven, buffered method table.
//! - [`ConsoleDevice`]: the boot console hooks.
//! - [`RxSink`]: where received bytes go.
//! - [`Delay`]: short busy delays between register polls.

#![cfg_attr(not(test), no_std)]

pub mod driver;
pub mod error;
pub mod hw;
pub mod serial;

pub use driver::{Driver, DriverInfo, DriverType};
pub use error::DriverError;
pub use hw::{Delay, SpinDelay};
pub use serial::{
    ConsoleDevice, ConsoleInfo, ConsolePriority, Flush, IntPending, LineParams, LowLevelUart, Parity,
    ProbeInfo, RxSink, Signals, UartDevice,
};
