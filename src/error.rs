//! Driver error type

use core::fmt;

use crate::frame::FrameError;
use crate::registers::InvalidMode;

/// Errors reported by the RFM69 driver.
///
/// Generic over the error type of the underlying SPI device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The SPI transport failed during a register exchange
    Bus(E),
    /// A typed register read returned bits that do not decode
    Deserialization,
    /// An opmode value that is not one of the five chip modes
    InvalidMode(u8),
    /// Frame payload exceeds [`MAX_PAYLOAD_LEN`](crate::frame::MAX_PAYLOAD_LEN)
    PayloadTooLarge(usize),
    /// A frame could not be encoded
    Frame(FrameError),
    /// Initialization failed partway; the chip is partially configured and
    /// must be initialized again
    Config(E),
    /// A bounded hardware wait expired
    Timeout,
}

impl<E> Error<E> {
    /// Re-labels a transport failure as an initialization failure.
    pub(crate) fn into_config(self) -> Self {
        match self {
            Self::Bus(e) => Self::Config(e),
            other => other,
        }
    }
}

impl<E> From<FrameError> for Error<E> {
    fn from(value: FrameError) -> Self {
        match value {
            FrameError::PayloadTooLarge(len) => Self::PayloadTooLarge(len),
            other => Self::Frame(other),
        }
    }
}

impl<E> From<InvalidMode> for Error<E> {
    fn from(value: InvalidMode) -> Self {
        Self::InvalidMode(value.0)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "SPI error: {:?}", e),
            Self::Deserialization => write!(f, "register contents could not be decoded"),
            Self::InvalidMode(bits) => write!(f, "invalid opmode value 0x{:02X}", bits),
            Self::PayloadTooLarge(len) => write!(f, "payload of {} bytes is too large", len),
            Self::Frame(e) => write!(f, "frame error: {:?}", e),
            Self::Config(e) => write!(f, "initialization failed: {:?}", e),
            Self::Timeout => write!(f, "timed out waiting for the radio"),
        }
    }
}
