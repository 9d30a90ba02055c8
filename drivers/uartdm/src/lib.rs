//! Qualcomm UART-DM serial controller driver (APQ8064 HSUART).
//!
//! Layers, bottom up:
//!
//! - [`regs`]: the register map, status and interrupt bits, command codes.
//! - [`line`]: MR2 character-format encoding.
//! - [`UartDm`]: one controller. Bring-up ([`UartDm::initialize`]) and polled
//!   single-byte transfer ([`UartDm::transmit_one`], [`UartDm::receive_one`]);
//!   implements [`LowLevelUart`](uartdm_driver_api::LowLevelUart).
//! - [`UartDmSession`]: the interrupt-driven path, with all register sequences
//!   serialized under one lock; implements
//!   [`UartDevice`](uartdm_driver_api::UartDevice).
//! - [`console`]: the lock-free boot console on UART0.
//!
//! Register access goes through [`uartdm_mmio::RegisterIo`], so everything
//! above [`regs`] runs unchanged against the recording mock in host tests.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod console;
mod init;
pub mod line;
pub mod mask;
mod port;
pub mod regs;
pub mod ring;
pub mod session;
mod xfer;

pub use config::UartDmConfig;
pub use console::{EARLY_CONSOLE, EarlyConsole, RelocatableBase, UART_BASE, early_print};
pub use line::LineMode;
pub use mask::InterruptMask;
pub use port::{DESCRIPTION, DRIVER_NAME, UartDm};
pub use ring::RxRing;
pub use session::UartDmSession;
