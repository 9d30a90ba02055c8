//! Controller handle.
//!
//! A [`UartDm`] owns the register window of one controller together with its
//! reference clock and configuration. The init sequencer and the byte
//! transfer engine are implemented on it in [`init`](crate::init) and
//! [`xfer`](crate::xfer); the interrupt-driven session wraps it in a lock.

use core::sync::atomic::{AtomicU32, Ordering};

use uartdm_driver_api::{
    Delay, Driver, DriverError, DriverInfo, DriverType, LineParams, LowLevelUart, SpinDelay,
};
use uartdm_mmio::RegisterIo;

use crate::config::UartDmConfig;
use crate::regs::UartDmRegs;

/// Driver class name.
pub const DRIVER_NAME: &str = "apq8064";

/// Device description reported by probe.
pub const DESCRIPTION: &str = "Qualcomm HSUART";

/// One UART-DM controller.
#[derive(Debug)]
pub struct UartDm<IO, D = SpinDelay> {
    regs: UartDmRegs<IO>,
    rclk: u32,
    config: UartDmConfig,
    delay: D,
    tx_ready_timeouts: AtomicU32,
}

impl<IO: RegisterIo> UartDm<IO> {
    /// Creates a handle with default configuration. Does **not** touch
    /// hardware.
    ///
    /// `rclk` is the reference clock supplied by the bus attachment; zero
    /// means "unknown" and is replaced by [`UartDmConfig::default_rclk`] on
    /// the first [`initialize`](Self::initialize).
    #[must_use]
    pub fn new(io: IO, rclk: u32) -> Self {
        Self::with_config(io, rclk, UartDmConfig::DEFAULT, SpinDelay::default())
    }
}

impl<IO: RegisterIo, D: Delay> UartDm<IO, D> {
    /// Creates a handle with explicit configuration and poll delay.
    #[must_use]
    pub fn with_config(io: IO, rclk: u32, config: UartDmConfig, delay: D) -> Self {
        Self {
            regs: UartDmRegs::new(io),
            rclk,
            config,
            delay,
            tx_ready_timeouts: AtomicU32::new(0),
        }
    }

    /// The register block.
    #[must_use]
    pub fn regs(&self) -> &UartDmRegs<IO> {
        &self.regs
    }

    /// The reference clock; zero until the first initialization when the
    /// attachment supplied none.
    #[must_use]
    pub fn rclk(&self) -> u32 {
        self.rclk
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &UartDmConfig {
        &self.config
    }

    /// Number of transmits that went ahead after the TX-ready poll budget ran
    /// out.
    #[must_use]
    pub fn tx_ready_timeouts(&self) -> u32 {
        self.tx_ready_timeouts.load(Ordering::Relaxed)
    }

    /// Consumes the handle and returns the register backend.
    pub fn into_io(self) -> IO {
        self.regs.into_io()
    }

    pub(crate) fn delay(&self) {
        self.delay.delay_us(self.config.poll_delay_us);
    }

    pub(crate) fn record_tx_ready_timeout(&self) {
        self.tx_ready_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Substitutes the fallback clock for an unknown one.
    ///
    /// # Panics
    ///
    /// Panics if the clock is still zero afterwards; every later rate
    /// computation would divide by it.
    pub(crate) fn resolve_clock(&mut self) -> u32 {
        if self.rclk == 0 {
            self.rclk = self.config.default_rclk;
        }
        assert!(self.rclk != 0, "uartdm: reference clock is zero");
        self.rclk
    }
}

impl<IO, D> Driver for UartDm<IO, D> {
    fn info(&self) -> DriverInfo {
        DriverInfo {
            name: DRIVER_NAME,
            driver_type: DriverType::Serial,
            description: DESCRIPTION,
        }
    }
}

impl<IO: RegisterIo, D: Delay> LowLevelUart for UartDm<IO, D> {
    fn probe(&self) -> Result<(), DriverError> {
        Ok(())
    }

    fn init(&mut self, params: &LineParams) -> Result<(), DriverError> {
        self.initialize(params)
    }

    fn term(&mut self) {}

    fn putc(&self, byte: u8) {
        self.transmit_one(byte);
    }

    fn rxready(&self) -> bool {
        self.receive_ready()
    }

    fn getc(&self) -> u8 {
        self.receive_one()
    }
}
