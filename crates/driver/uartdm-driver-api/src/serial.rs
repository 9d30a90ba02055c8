//! Serial controller interface traits.
//!
//! The serial framework drives a controller through three tables:
//!
//! - [`LowLevelUart`]: blocking, interrupt-free byte I/O. Used for the
//!   kernel debugger and before interrupts are routed.
//! - [`UartDevice`]: the buffered, interrupt-driven path. The framework owns
//!   the buffers; the driver moves bytes between them and the FIFOs and
//!   reports which interrupt classes are pending.
//! - [`ConsoleDevice`]: the boot console, independent of both.

use bitflags::bitflags;

use crate::error::DriverError;

// ---------------------------------------------------------------------------
// Line parameters
// ---------------------------------------------------------------------------

/// Parity setting requested by the framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    /// No parity bit.
    None,
    /// Odd parity.
    Odd,
    /// Even parity.
    Even,
    /// Parity bit always 1.
    Mark,
    /// Parity bit always 0.
    Space,
}

/// Logical line configuration.
///
/// Values are carried as the framework passes them; drivers validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineParams {
    /// Baud rate in bits per second.
    pub baud: u32,
    /// Data bits per character.
    pub data_bits: u8,
    /// Stop bits per character.
    pub stop_bits: u8,
    /// Parity.
    pub parity: Parity,
}

impl LineParams {
    /// 115200 baud, 8 data bits, no parity, 1 stop bit.
    pub const EIGHT_N_ONE: Self = Self::new(115_200, 8, 1, Parity::None);

    /// Creates a parameter set.
    #[must_use]
    pub const fn new(baud: u32, data_bits: u8, stop_bits: u8, parity: Parity) -> Self {
        Self {
            baud,
            data_bits,
            stop_bits,
            parity,
        }
    }
}

impl Default for LineParams {
    fn default() -> Self {
        Self::EIGHT_N_ONE
    }
}

// ---------------------------------------------------------------------------
// Flag sets
// ---------------------------------------------------------------------------

bitflags! {
    /// Interrupt classes reported back to the framework by
    /// [`UartDevice::ipend`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct IntPending: u32 {
        /// Received data is waiting; the framework should call
        /// [`UartDevice::receive`].
        const RX_READY = 1 << 0;
        /// A buffered transmit has drained.
        const TX_IDLE  = 1 << 1;
    }
}

bitflags! {
    /// Modem control and status lines.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Signals: u32 {
        /// Data Terminal Ready.
        const DTR = 1 << 0;
        /// Request To Send.
        const RTS = 1 << 1;
        /// Clear To Send.
        const CTS = 1 << 2;
        /// Data Set Ready.
        const DSR = 1 << 3;
        /// Data Carrier Detect.
        const DCD = 1 << 4;
        /// Ring Indicator.
        const RI  = 1 << 5;
    }
}

bitflags! {
    /// Which FIFOs a flush applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Flush: u32 {
        /// Receive side.
        const RX = 1 << 0;
        /// Transmit side.
        const TX = 1 << 1;
    }
}

// ---------------------------------------------------------------------------
// Probe results
// ---------------------------------------------------------------------------

/// What a controller reports when probed by the buffered framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeInfo {
    /// Transmit FIFO depth in bytes.
    pub tx_fifo_size: usize,
    /// Receive FIFO depth in bytes.
    pub rx_fifo_size: usize,
    /// Device description.
    pub description: &'static str,
}

/// Console selection priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConsolePriority {
    /// Not usable.
    Dead,
    /// Usable if nothing better exists.
    Normal,
    /// Preferred console.
    Internal,
    /// Explicitly selected by the user.
    Remote,
}

/// What a console reports when probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleInfo {
    /// Console name.
    pub name: &'static str,
    /// Selection priority.
    pub priority: ConsolePriority,
}

// ---------------------------------------------------------------------------
// Receive sink
// ---------------------------------------------------------------------------

/// Destination for bytes drained from a receive FIFO.
///
/// Owned by the buffer layer. The driver checks [`is_full`](Self::is_full)
/// before every byte and stops draining once it reports `true`.
pub trait RxSink {
    /// Returns `true` if no further byte can be accepted.
    fn is_full(&self) -> bool;

    /// Stores one received byte.
    fn put(&mut self, byte: u8);

    /// Records that received data was lost because the sink was full.
    fn mark_overrun(&mut self);
}

// ---------------------------------------------------------------------------
// Method tables
// ---------------------------------------------------------------------------

/// Blocking, interrupt-free operations.
///
/// Every method may spin indefinitely on hardware status; callers that need
/// bounded latency check [`rxready`](Self::rxready) before
/// [`getc`](Self::getc).
pub trait LowLevelUart {
    /// Checks whether the hardware is present.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::DeviceNotFound`] if it is not.
    fn probe(&self) -> Result<(), DriverError>;

    /// Brings the controller up with the given line parameters.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidArgument`] if the parameters are rejected.
    fn init(&mut self, params: &LineParams) -> Result<(), DriverError>;

    /// Releases the controller.
    fn term(&mut self);

    /// Transmits one byte.
    fn putc(&self, byte: u8);

    /// Returns `true` if a received byte is waiting.
    fn rxready(&self) -> bool;

    /// Receives one byte, waiting for it if necessary.
    fn getc(&self) -> u8;
}

/// Interrupt-driven, buffered operations.
///
/// All methods take `&self`; implementations serialize register access per
/// controller internally.
pub trait UartDevice {
    /// Reports FIFO geometry and description.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::DeviceNotFound`] if the hardware is absent.
    fn probe(&self) -> Result<ProbeInfo, DriverError>;

    /// Arms the controller's interrupt sources.
    ///
    /// # Errors
    ///
    /// Returns a [`DriverError`] if the controller cannot be attached.
    fn attach(&self) -> Result<(), DriverError>;

    /// Pushes `bytes` into the transmit FIFO and marks the transmitter busy.
    ///
    /// # Errors
    ///
    /// Returns a [`DriverError`] if the transmit could not be started.
    fn transmit(&self, bytes: &[u8]) -> Result<(), DriverError>;

    /// Drains the receive FIFO into `sink` until it is empty or the sink is
    /// full.
    ///
    /// # Errors
    ///
    /// Returns a [`DriverError`] if the receive path could not be armed.
    fn receive(&self, sink: &mut dyn RxSink) -> Result<(), DriverError>;

    /// Acknowledges pending interrupts and reports their classes.
    fn ipend(&self) -> IntPending;

    /// Reprograms line parameters.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidArgument`] for rejected parameters.
    fn param(&self, params: &LineParams) -> Result<(), DriverError>;

    /// Discards FIFO contents.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Unsupported`] where the hardware cannot flush.
    fn flush(&self, what: Flush) -> Result<(), DriverError>;

    /// Reads modem signals.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Unsupported`] where the lines are not wired.
    fn get_signals(&self) -> Result<Signals, DriverError>;

    /// Drives modem signals.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Unsupported`] where the lines are not wired.
    fn set_signals(&self, signals: Signals) -> Result<(), DriverError>;

    /// Device-specific control request.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Unsupported`] for unknown requests.
    fn ioctl(&self, request: u32, data: usize) -> Result<(), DriverError>;
}

/// Boot console hooks.
///
/// Consoles run before locking and interrupts exist; implementations must
/// be callable from any context with no prior setup beyond [`init`](Self::init).
pub trait ConsoleDevice {
    /// Reports name and priority.
    fn probe(&self) -> ConsoleInfo;

    /// Prepares the hardware for console use.
    fn init(&self);

    /// Stops console use.
    fn term(&self) {}

    /// Writes one character.
    fn putc(&self, c: u8);

    /// Reads one character, waiting for it.
    fn getc(&self) -> u8;

    /// Called when the debugger takes over the console.
    fn grab(&self) {}

    /// Called when the debugger releases the console.
    fn ungrab(&self) {}
}
