//! Boot console on UART0.
//!
//! Usable from the first instruction of the kernel: no lock, no allocation,
//! no driver state beyond a one-word receive buffer. The register base lives
//! in a [`RelocatableBase`] so it can be switched from the physical to the
//! virtual address once the MMU is on; every call re-reads it.
//!
//! The console never logs. It *is* the log sink during early boot.

use core::fmt;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use uartdm_driver_api::{
    ConsoleDevice, ConsoleInfo, ConsolePriority, Driver, DriverInfo, DriverType,
};
use uartdm_mmio::{IoMapper, MmioMapper};

use crate::regs::{CONSOLE_RX_TRANSFER_LEN, Command, Status, UartDmRegs};

/// Physical address of UART0's register window on APQ8064.
pub const DEFAULT_UART_BASE: usize = 0xF664_0000;

/// Console name reported by probe.
pub const CONSOLE_NAME: &str = "uart";

/// A register base that may move while in use.
#[derive(Debug)]
pub struct RelocatableBase(AtomicUsize);

impl RelocatableBase {
    /// Creates a base holding `base`.
    #[must_use]
    pub const fn new(base: usize) -> Self {
        Self(AtomicUsize::new(base))
    }

    /// The current base.
    #[must_use]
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    /// Switches to `base` for every later access.
    ///
    /// # Safety
    ///
    /// `base` must address the same controller's register window, mapped as
    /// device memory, for as long as any console using this base is alive.
    pub unsafe fn relocate(&self, base: usize) {
        self.0.store(base, Ordering::Release);
    }
}

/// Base of the boot console, starting at the physical address.
pub static UART_BASE: RelocatableBase = RelocatableBase::new(DEFAULT_UART_BASE);

/// The boot console.
// SAFETY: `UART_BASE` starts at the physical window, valid while the MMU is
// off, and `RelocatableBase::relocate` requires every later base to be a valid
// mapping of the same window.
pub static EARLY_CONSOLE: EarlyConsole<'static, MmioMapper> =
    EarlyConsole::new(&UART_BASE, unsafe { MmioMapper::new() });

/// Polled console over a relocatable register window.
#[derive(Debug)]
pub struct EarlyConsole<'a, M> {
    base: &'a RelocatableBase,
    mapper: M,
    /// Undelivered bytes of the last FIFO word, lowest first. Zero means
    /// empty, so a NUL byte ends the word early.
    word: AtomicU32,
}

impl<'a, M> EarlyConsole<'a, M> {
    /// Creates a console reading its base from `base`.
    #[must_use]
    pub const fn new(base: &'a RelocatableBase, mapper: M) -> Self {
        Self {
            base,
            mapper,
            word: AtomicU32::new(0),
        }
    }
}

impl<M: IoMapper> EarlyConsole<'_, M> {
    fn regs(&self) -> UartDmRegs<M::Io> {
        UartDmRegs::new(self.mapper.map(self.base.get()))
    }

    /// Arms the receiver for console use.
    ///
    /// Touches nothing but the command and transfer-length registers, so it
    /// can run over whatever state the boot loader left behind.
    pub fn init(&self) {
        let regs = self.regs();
        regs.set_cr(Command::STALE_EVENT_DISABLE);
        regs.set_cr(Command::RESET_STALE_INT);
        regs.set_dmrx(CONSOLE_RX_TRANSFER_LEN);
        regs.set_cr(Command::STALE_EVENT_ENABLE);
    }

    /// Writes one character; `\n` goes out as `\r\n`.
    pub fn putc(&self, c: u8) {
        if c == b'\n' {
            self.putc(b'\r');
        }

        let regs = self.regs();
        while !regs.sr().contains(Status::TXEMT) {
            core::hint::spin_loop();
        }
        while !regs.sr().contains(Status::TXRDY) {
            core::hint::spin_loop();
        }
        regs.set_no_chars_for_tx(1);
        regs.set_tf(0, u32::from(c));
    }

    /// Reads one character, spinning until one is available.
    ///
    /// FIFO words are consumed a byte at a time, low byte first; a new word
    /// is read only when the previous one is used up.
    pub fn getc(&self) -> u8 {
        let regs = self.regs();
        while !regs.sr().contains(Status::RXRDY) {
            core::hint::spin_loop();
        }
        if regs.sr().contains(Status::OVERRUN) {
            regs.set_cr(Command::RESET_ERROR_STATUS);
        }

        let mut word = self.word.load(Ordering::Relaxed);
        if word == 0 {
            word = regs.rf(0);
        }
        self.word.store(word >> 8, Ordering::Relaxed);
        word.to_le_bytes()[0]
    }

    /// A [`fmt::Write`] adapter.
    #[must_use]
    pub fn writer(&self) -> ConsoleWriter<'_, M> {
        ConsoleWriter { console: self }
    }
}

impl<M: IoMapper> ConsoleDevice for EarlyConsole<'_, M> {
    fn probe(&self) -> ConsoleInfo {
        ConsoleInfo {
            name: CONSOLE_NAME,
            priority: ConsolePriority::Normal,
        }
    }

    fn init(&self) {
        EarlyConsole::init(self);
    }

    fn putc(&self, c: u8) {
        EarlyConsole::putc(self, c);
    }

    fn getc(&self) -> u8 {
        EarlyConsole::getc(self)
    }
}

impl<M> Driver for EarlyConsole<'_, M> {
    fn info(&self) -> DriverInfo {
        DriverInfo {
            name: CONSOLE_NAME,
            driver_type: DriverType::Console,
            description: "UART-DM boot console",
        }
    }
}

/// Formatted output through an [`EarlyConsole`].
#[derive(Debug)]
pub struct ConsoleWriter<'c, M> {
    console: &'c EarlyConsole<'c, M>,
}

impl<M: IoMapper> fmt::Write for ConsoleWriter<'_, M> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            self.console.putc(byte);
        }
        Ok(())
    }
}

/// Print hook writing to [`EARLY_CONSOLE`].
///
/// Install with `uartdm_core::log::set_print_fn(early_print)` to route
/// `kprint!` and the kernel log to UART0 before any other console exists.
pub fn early_print(args: fmt::Arguments<'_>) {
    let _ = fmt::Write::write_fmt(&mut EARLY_CONSOLE.writer(), args);
}
