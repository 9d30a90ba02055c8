//! Core support library for the UART-DM driver stack.
//!
//! Holds the pieces every other crate in the workspace leans on: the leveled
//! logging facade in [`log`] and the lock types in [`sync`]. Nothing in here
//! touches hardware.

#![cfg_attr(not(test), no_std)]

pub mod log;
pub mod sync;
