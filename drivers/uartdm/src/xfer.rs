//! Polled single-byte transfer.
//!
//! The controller does not accept a character until it has been told how
//! many are coming (NO_CHARS_FOR_TX), and it only takes a new count once the
//! previous transmit has been acknowledged with TX_READY. Receive reads one
//! character per FIFO word.

use uartdm_core::ktrace;
use uartdm_driver_api::Delay;
use uartdm_mmio::RegisterIo;

use crate::port::UartDm;
use crate::regs::{Command, Irq, Status};

impl<IO: RegisterIo, D: Delay> UartDm<IO, D> {
    /// Transmits one byte, waiting for FIFO space.
    ///
    /// If the transmitter is not idle, first polls for TX_READY up to the
    /// configured budget. Running out of budget is not an error: the byte
    /// is sent anyway and [`tx_ready_timeouts`](Self::tx_ready_timeouts) is
    /// incremented.
    pub fn transmit_one(&self, byte: u8) {
        let regs = self.regs();

        if !regs.sr().contains(Status::TXEMT) {
            let mut remaining = self.config().tx_ready_poll_limit;
            while !regs.isr().contains(Irq::TX_READY) {
                remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.record_tx_ready_timeout();
                    ktrace!("uartdm: TX_READY poll exhausted, sending anyway");
                    break;
                }
                self.delay();
            }
        }

        regs.set_no_chars_for_tx(1);
        while !regs.sr().contains(Status::TXRDY) {
            self.delay();
        }
        regs.set_tf(0, u32::from(byte));
    }

    /// Returns `true` if the receive FIFO holds a character.
    #[must_use]
    pub fn receive_ready(&self) -> bool {
        self.regs().sr().contains(Status::RXRDY)
    }

    /// Receives one byte, polling until one is available.
    ///
    /// A latched overrun is cleared before the byte is read.
    pub fn receive_one(&self) -> u8 {
        while !self.receive_ready() {
            self.delay();
        }

        let regs = self.regs();
        if regs.sr().contains(Status::OVERRUN) {
            ktrace!("uartdm: clearing receive overrun");
            regs.set_cr(Command::RESET_ERROR_STATUS);
        }
        low_byte(regs.rf(0))
    }
}

/// The character carried in the low byte of a FIFO word.
pub(crate) fn low_byte(word: u32) -> u8 {
    word.to_le_bytes()[0]
}
