//! UART-DM register map.
//!
//! Several offsets are overlaid: the write side and the read side of one
//! address are different registers (0x08 is CSR/SR, 0x10 is CR/MISR, 0x14 is
//! IMR/ISR, 0x38 is IRDA/RX_TOTAL_SNAP). The register block names each side
//! separately so a read can never be mistaken for reading back a write.

use bitflags::bitflags;
use uartdm_mmio::register_block;

// ---------------------------------------------------------------------------
// Register block
// ---------------------------------------------------------------------------

register_block! {
    /// UART-DM register window.
    #[derive(Debug)]
    pub UartDmRegs {
        /// Mode register 1: hardware flow control (RFR/CTS).
        [0x00; rw] mr1,
        /// Mode register 2: character format.
        [0x04; rw] mr2,
        /// Clock select. Write side of 0x08.
        [0x08; wo] csr,
        /// Status. Read side of 0x08.
        [0x08; ro] sr => Status,
        /// Command. Write side of 0x10.
        [0x10; wo] cr => Command,
        /// Masked interrupt status. Read side of 0x10.
        [0x10; ro] misr => Irq,
        /// Interrupt mask. Write side of 0x14.
        [0x14; wo] imr => Irq,
        /// Raw interrupt status. Read side of 0x14.
        [0x14; ro] isr => Irq,
        /// Interrupt programming: stale timeout.
        [0x18; wo] ipr,
        /// Transmit FIFO watermark.
        [0x1C; wo] tfwr,
        /// Receive FIFO watermark.
        [0x20; wo] rfwr,
        /// Hunt character.
        [0x24; wo] hcr,
        /// Receive transfer length; arms stale detection.
        [0x34; wo] dmrx,
        /// IrDA control. Write side of 0x38.
        [0x38; wo] irda,
        /// Characters received since the last transfer. Read side of 0x38.
        [0x38; ro] rx_total_snap,
        /// Data mover (DMA) enable.
        [0x3C; wo] dmen,
        /// Number of characters the next transmit will carry.
        [0x40; wo] no_chars_for_tx,
        /// Receive FIFO base address.
        [0x44; wo] badr,
        /// Transmit FIFO status.
        [0x4C; ro] txfs,
        /// Receive FIFO status.
        [0x50; ro] rxfs,
        /// Transmit FIFO words.
        [0x70; wo; 4] tf,
        /// Receive FIFO words.
        [0x70; ro; 4] rf,
    }
}

/// Raw offsets, for code that addresses the window without the block.
pub mod offset {
    /// Mode register 1.
    pub const MR1: usize = 0x00;
    /// Mode register 2.
    pub const MR2: usize = 0x04;
    /// Clock select (write) / status (read).
    pub const CSR: usize = 0x08;
    /// Status.
    pub const SR: usize = 0x08;
    /// Command (write).
    pub const CR: usize = 0x10;
    /// Masked interrupt status (read).
    pub const MISR: usize = 0x10;
    /// Interrupt mask (write).
    pub const IMR: usize = 0x14;
    /// Raw interrupt status (read).
    pub const ISR: usize = 0x14;
    /// Interrupt programming.
    pub const IPR: usize = 0x18;
    /// Transmit watermark.
    pub const TFWR: usize = 0x1C;
    /// Receive watermark.
    pub const RFWR: usize = 0x20;
    /// Hunt character.
    pub const HCR: usize = 0x24;
    /// Receive transfer length.
    pub const DMRX: usize = 0x34;
    /// IrDA control.
    pub const IRDA: usize = 0x38;
    /// Data mover enable.
    pub const DMEN: usize = 0x3C;
    /// Transmit character count.
    pub const NO_CHARS_FOR_TX: usize = 0x40;
    /// First FIFO word (TF(0) on write, RF(0) on read).
    pub const FIFO0: usize = 0x70;
}

/// Size of the register window in 32-bit words, as claimed from the bus.
pub const WINDOW_WORDS: usize = 8;

// ---------------------------------------------------------------------------
// Status register
// ---------------------------------------------------------------------------

bitflags! {
    /// Status register (SR) bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u32 {
        /// Receive FIFO holds at least one character.
        const RXRDY         = 1 << 0;
        /// Receive FIFO is full.
        const RXFULL        = 1 << 1;
        /// Transmit FIFO has space.
        const TXRDY         = 1 << 2;
        /// Transmit FIFO and shift register are empty.
        const TXEMT         = 1 << 3;
        /// Receive overrun.
        const OVERRUN       = 1 << 4;
        /// Parity or framing error.
        const PAR_FRAME_ERR = 1 << 5;
        /// Break received.
        const RX_BREAK      = 1 << 6;
        /// Hunt character received.
        const HUNT_CHAR     = 1 << 7;
    }
}

// ---------------------------------------------------------------------------
// Interrupt sources (IMR / ISR / MISR)
// ---------------------------------------------------------------------------

bitflags! {
    /// Interrupt source bits, shared by the mask and both status registers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Irq: u32 {
        /// Transmit FIFO at or below the TX watermark.
        const TXLEV         = 1 << 0;
        /// Hunt character matched.
        const RXHUNT        = 1 << 1;
        /// Break state changed.
        const RXBRK_CHNG    = 1 << 2;
        /// Receive went idle with characters still buffered.
        const RXSTALE       = 1 << 3;
        /// Receive FIFO above the RX watermark.
        const RXLEV         = 1 << 4;
        /// CTS changed.
        const DELTA_CTS     = 1 << 5;
        /// Current CTS level.
        const CURRENT_CTS   = 1 << 6;
        /// The announced transmit has been fully written.
        const TX_READY      = 1 << 7;
        /// Transmit error.
        const TX_ERROR      = 1 << 8;
        /// Transmit done.
        const TX_DONE       = 1 << 9;
        /// Break started.
        const RXBREAK_START = 1 << 10;
        /// Break ended.
        const RXBREAK_END   = 1 << 11;
        /// Parity or framing error.
        const PAR_FRAME_ERR = 1 << 12;

        /// Sources armed when the buffered path attaches.
        const ATTACH = Self::TX_READY.bits()
            | Self::TXLEV.bits()
            | Self::RXLEV.bits()
            | Self::RXSTALE.bits();
    }
}

// ---------------------------------------------------------------------------
// Command register
// ---------------------------------------------------------------------------

/// A value for the command register (CR).
///
/// Besides the enable/disable bits, CR takes two kinds of opcodes: channel
/// commands, whose 5-bit code is split across bits 7:4 and bit 11, and
/// general commands in bits 10:8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command(u32);

impl Command {
    const fn channel(code: u32) -> Self {
        Self(((code & 0xF) << 4) | ((code >> 4) << 11))
    }

    const fn general(code: u32) -> Self {
        Self(code << 8)
    }

    /// Enable the receiver.
    pub const RX_ENABLE: Self = Self(1 << 0);
    /// Disable the receiver.
    pub const RX_DISABLE: Self = Self(1 << 1);
    /// Enable the transmitter.
    pub const TX_ENABLE: Self = Self(1 << 2);
    /// Disable the transmitter.
    pub const TX_DISABLE: Self = Self(1 << 3);

    /// Reset the receiver.
    pub const RESET_RX: Self = Self::channel(1);
    /// Reset the transmitter.
    pub const RESET_TX: Self = Self::channel(2);
    /// Clear overrun and parity/framing error status.
    pub const RESET_ERROR_STATUS: Self = Self::channel(3);
    /// Clear the break-change interrupt.
    pub const RESET_BREAK_INT: Self = Self::channel(4);
    /// Start transmitting a break.
    pub const START_BREAK: Self = Self::channel(5);
    /// Stop transmitting a break.
    pub const STOP_BREAK: Self = Self::channel(6);
    /// Clear the CTS-change interrupt.
    pub const RESET_CTS: Self = Self::channel(7);
    /// Clear the stale interrupt.
    pub const RESET_STALE_INT: Self = Self::channel(8);
    /// Drive RFR low.
    pub const RFR_LOW: Self = Self::channel(0xD);
    /// Drive RFR high.
    pub const RFR_HIGH: Self = Self::channel(0xE);
    /// Clear the TX error interrupt.
    pub const RESET_TX_ERROR: Self = Self::channel(0x10);
    /// Clear the TX done interrupt.
    pub const RESET_TX_DONE: Self = Self::channel(0x11);

    /// Enable CR protection.
    pub const CR_PROTECTION_EN: Self = Self::general(1);
    /// Clear the TX ready interrupt.
    pub const CLEAR_TX_READY: Self = Self::general(3);
    /// Force a stale event.
    pub const FORCE_STALE_EVENT: Self = Self::general(4);
    /// Enable stale event generation.
    pub const STALE_EVENT_ENABLE: Self = Self::general(5);
    /// Disable stale event generation.
    pub const STALE_EVENT_DISABLE: Self = Self::general(6);

    /// The raw register value.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Wraps a raw register value.
    #[must_use]
    pub const fn from_bits_retain(bits: u32) -> Self {
        Self(bits)
    }
}

// ---------------------------------------------------------------------------
// Fixed register values
// ---------------------------------------------------------------------------

/// MR1 with RFR/CTS flow control disabled.
pub const MR1_NO_FLOW_CONTROL: u32 = 0;

/// CSR value selecting the 115200-class rate for both directions.
pub const CSR_115200: u32 = 0xFF;

/// Stale timeout LSBs programmed into IPR.
pub const STALE_TIMEOUT_LSB: u32 = 0x0F;

/// TX watermark: interrupt when the FIFO holds this many words or fewer.
pub const TX_WATERMARK: u32 = 0;

/// RX watermark: interrupt when the FIFO holds more than this many words.
pub const RX_WATERMARK: u32 = 0;

/// DMRX value armed by the buffered receive path.
pub const RX_TRANSFER_LEN: u32 = 512;

/// DMRX value armed by the boot console; anything above the FIFO depth works.
pub const CONSOLE_RX_TRANSFER_LEN: u32 = 0x220;

/// FIFO depth in bytes, each direction.
pub const FIFO_SIZE: usize = 64;
