//! Link-layer frame format
//!
//! Every packet on the air carries a small addressed header in front of the
//! application payload:
//!
//! | Byte | Field                                        |
//! |------|----------------------------------------------|
//! | 0    | Length of the remaining bytes (payload + 3)  |
//! | 1    | Target node address                          |
//! | 2    | Sender node address                          |
//! | 3    | Control byte, see [`Control`]                |
//! | 4..  | Payload, up to [`MAX_PAYLOAD_LEN`] bytes     |
//!
//! The whole frame must fit the 66 byte chip FIFO together with the CRC the
//! packet engine appends.

use bitflags::bitflags;

/// Largest payload a single frame can carry
pub const MAX_PAYLOAD_LEN: usize = 61;

/// Target, sender and control bytes
pub const HEADER_LEN: usize = 3;

/// Largest encoded frame, length byte included
pub const MAX_FRAME_LEN: usize = 1 + HEADER_LEN + MAX_PAYLOAD_LEN;

/// Target address accepted by every node
pub const BROADCAST_ADDRESS: u8 = 255;

bitflags! {
    /// Control byte of a frame
    ///
    /// At most one of the two flags is set by this driver; an empty control
    /// byte marks a plain data frame.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Control: u8 {
        /// The frame acknowledges a previous frame
        const ACK_REPLY = 0x80;
        /// The sender asks for an acknowledgment
        const ACK_REQUEST = 0x40;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Control {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Control {{ 0b{0=0..8:08b} }}", self.bits())
    }
}

impl Control {
    /// Control byte for an outgoing frame. An ack reply never requests an
    /// ack itself.
    pub fn outgoing(request_ack: bool, is_ack_reply: bool) -> Self {
        if is_ack_reply {
            Self::ACK_REPLY
        } else if request_ack {
            Self::ACK_REQUEST
        } else {
            Self::empty()
        }
    }
}

/// Errors from encoding or parsing a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// The payload is longer than [`MAX_PAYLOAD_LEN`]
    PayloadTooLarge(usize),
    /// The output buffer cannot hold the encoded frame
    BufferTooSmall,
    /// The length byte is shorter than the header or longer than the
    /// largest frame
    InvalidLength(u8),
    /// Fewer bytes than announced by the length byte
    Truncated,
}

/// A frame borrowing its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame<'a> {
    pub target: u8,
    pub sender: u8,
    pub control: Control,
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Builds a frame, rejecting oversized payloads.
    pub fn new(
        target: u8,
        sender: u8,
        control: Control,
        payload: &'a [u8],
    ) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(FrameError::PayloadTooLarge(payload.len()));
        }
        Ok(Self {
            target,
            sender,
            control,
            payload,
        })
    }

    /// Encoded size, length byte included
    pub fn encoded_len(&self) -> usize {
        1 + HEADER_LEN + self.payload.len()
    }

    /// Writes the frame into `buf` and returns the number of bytes used.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, FrameError> {
        if self.payload.len() > MAX_PAYLOAD_LEN {
            return Err(FrameError::PayloadTooLarge(self.payload.len()));
        }
        let len = self.encoded_len();
        if buf.len() < len {
            return Err(FrameError::BufferTooSmall);
        }

        buf[0] = (self.payload.len() + HEADER_LEN) as u8;
        buf[1] = self.target;
        buf[2] = self.sender;
        buf[3] = self.control.bits();
        buf[4..len].copy_from_slice(self.payload);
        Ok(len)
    }

    /// Parses a frame starting with its length byte.
    ///
    /// Bytes past the announced length are ignored. Unknown control bits are
    /// dropped.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, FrameError> {
        let Some(&length) = bytes.first() else {
            return Err(FrameError::Truncated);
        };
        let length = length as usize;
        if !(HEADER_LEN..=HEADER_LEN + MAX_PAYLOAD_LEN).contains(&length) {
            return Err(FrameError::InvalidLength(length as u8));
        }
        if bytes.len() < 1 + length {
            return Err(FrameError::Truncated);
        }

        Ok(Self {
            target: bytes[1],
            sender: bytes[2],
            control: Control::from_bits_truncate(bytes[3]),
            payload: &bytes[4..1 + length],
        })
    }

    /// The sender asked for an acknowledgment
    pub fn ack_requested(&self) -> bool {
        self.control.contains(Control::ACK_REQUEST)
    }

    /// The frame is an acknowledgment
    pub fn is_ack(&self) -> bool {
        self.control.contains(Control::ACK_REPLY)
    }

    /// Whether a node with `address` should accept this frame
    pub fn is_for(&self, address: u8) -> bool {
        self.target == address || self.target == BROADCAST_ADDRESS
    }
}
