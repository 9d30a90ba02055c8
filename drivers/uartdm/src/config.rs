//! Controller configuration.
//!
//! Everything here has a register-manual default; boards override individual
//! values with the `with_*` builders, which are `const` so a configuration can
//! live in a `static`.

use crate::regs;

/// Reference clock assumed when the bus attachment supplies none.
pub const DEFAULT_RCLK: u32 = 7_372_800;

/// Number of TX-ready polls before the transmit path gives up waiting.
pub const TX_READY_POLL_LIMIT: u32 = 1000;

/// Delay between TX-ready polls, in microseconds.
pub const POLL_DELAY_US: u32 = 4;

/// Tunable controller settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartDmConfig {
    /// Reference clock used when the handle was created with a zero clock.
    pub default_rclk: u32,
    /// Value written to CSR.
    pub clock_select: u32,
    /// TX FIFO watermark (TFWR).
    pub tx_watermark: u32,
    /// RX FIFO watermark (RFWR).
    pub rx_watermark: u32,
    /// Stale timeout (IPR).
    pub stale_timeout: u32,
    /// Receive transfer length armed on every buffered receive (DMRX).
    pub rx_transfer_len: u32,
    /// FIFO depth reported to the framework.
    pub fifo_size: usize,
    /// TX-ready polls before a byte is sent anyway.
    pub tx_ready_poll_limit: u32,
    /// Delay between status polls, in microseconds.
    pub poll_delay_us: u32,
}

impl UartDmConfig {
    /// Register-manual defaults.
    pub const DEFAULT: Self = Self {
        default_rclk: DEFAULT_RCLK,
        clock_select: regs::CSR_115200,
        tx_watermark: regs::TX_WATERMARK,
        rx_watermark: regs::RX_WATERMARK,
        stale_timeout: regs::STALE_TIMEOUT_LSB,
        rx_transfer_len: regs::RX_TRANSFER_LEN,
        fifo_size: regs::FIFO_SIZE,
        tx_ready_poll_limit: TX_READY_POLL_LIMIT,
        poll_delay_us: POLL_DELAY_US,
    };

    /// Overrides the fallback reference clock.
    #[must_use]
    pub const fn with_default_rclk(mut self, rclk: u32) -> Self {
        self.default_rclk = rclk;
        self
    }

    /// Overrides the CSR value.
    #[must_use]
    pub const fn with_clock_select(mut self, csr: u32) -> Self {
        self.clock_select = csr;
        self
    }

    /// Overrides both FIFO watermarks.
    #[must_use]
    pub const fn with_watermarks(mut self, tx: u32, rx: u32) -> Self {
        self.tx_watermark = tx;
        self.rx_watermark = rx;
        self
    }

    /// Overrides the stale timeout.
    #[must_use]
    pub const fn with_stale_timeout(mut self, timeout: u32) -> Self {
        self.stale_timeout = timeout;
        self
    }

    /// Overrides the receive transfer length.
    #[must_use]
    pub const fn with_rx_transfer_len(mut self, len: u32) -> Self {
        self.rx_transfer_len = len;
        self
    }

    /// Overrides the TX-ready poll budget.
    #[must_use]
    pub const fn with_tx_ready_poll_limit(mut self, limit: u32) -> Self {
        self.tx_ready_poll_limit = limit;
        self
    }

    /// Overrides the status poll delay.
    #[must_use]
    pub const fn with_poll_delay_us(mut self, us: u32) -> Self {
        self.poll_delay_us = us;
        self
    }
}

impl Default for UartDmConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
