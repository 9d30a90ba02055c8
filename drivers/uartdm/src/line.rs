//! Character format encoding for MR2.
//!
//! MR2 layout: parity in bits 1:0, stop bits in 3:2, data bits in 5:4.

use uartdm_driver_api::{DriverError, LineParams, Parity};

const PARITY_NONE: u32 = 0;
const PARITY_ODD: u32 = 1;
const PARITY_EVEN: u32 = 2;
const PARITY_SPACE: u32 = 3;

const STOP_ONE: u32 = 1 << 2;
const STOP_TWO: u32 = 3 << 2;

const DATA_SHIFT: u32 = 4;

/// An encoded MR2 character format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMode(u32);

impl LineMode {
    /// 8 data bits, no parity, 1 stop bit.
    pub const EIGHT_N_ONE: Self = Self(0x34);

    /// Encodes a character format.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidArgument`] for data bits outside 5..=8,
    /// stop bits other than 1 or 2, or mark parity (the controller has no
    /// encoding for it).
    pub fn encode(data_bits: u8, stop_bits: u8, parity: Parity) -> Result<Self, DriverError> {
        let data = match data_bits {
            5..=8 => u32::from(data_bits - 5) << DATA_SHIFT,
            _ => return Err(DriverError::InvalidArgument),
        };
        let stop = match stop_bits {
            1 => STOP_ONE,
            2 => STOP_TWO,
            _ => return Err(DriverError::InvalidArgument),
        };
        let parity = match parity {
            Parity::None => PARITY_NONE,
            Parity::Odd => PARITY_ODD,
            Parity::Even => PARITY_EVEN,
            Parity::Space => PARITY_SPACE,
            Parity::Mark => return Err(DriverError::InvalidArgument),
        };
        Ok(Self(data | stop | parity))
    }

    /// Encodes the format part of `params`; the baud rate is not consulted.
    ///
    /// # Errors
    ///
    /// See [`encode`](Self::encode).
    pub fn from_params(params: &LineParams) -> Result<Self, DriverError> {
        Self::encode(params.data_bits, params.stop_bits, params.parity)
    }

    /// The raw MR2 value.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }
}
