//! State of the current receive attempt

use crate::frame::{Frame, BROADCAST_ADDRESS, MAX_PAYLOAD_LEN};

/// Everything known about the frame currently held by the driver.
///
/// Cleared by [`Radio::receive_begin`](crate::Radio::receive_begin) and
/// filled when [`Radio::receive_done`](crate::Radio::receive_done) reads a
/// frame out of the FIFO. Only one frame is kept at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceiveSession {
    /// Payload bytes held in the buffer
    pub data_len: usize,
    /// Sender address of the last frame
    pub sender_id: u8,
    /// Target address of the last frame
    pub target_id: u8,
    /// Length byte of the last frame; non-zero while a frame is pending
    pub payload_len: u8,
    /// The last frame asked for an acknowledgment
    pub ack_requested: bool,
    /// The last frame was an acknowledgment
    pub ack_received: bool,
    /// Signal strength of the last frame in dBm
    pub rssi: i16,
    buffer: [u8; MAX_PAYLOAD_LEN],
}

impl Default for ReceiveSession {
    fn default() -> Self {
        Self {
            data_len: 0,
            sender_id: 0,
            target_id: 0,
            payload_len: 0,
            ack_requested: false,
            ack_received: false,
            rssi: 0,
            buffer: [0; MAX_PAYLOAD_LEN],
        }
    }
}

impl ReceiveSession {
    /// Forgets the previous frame.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Payload of the last frame
    pub fn data(&self) -> &[u8] {
        &self.buffer[..self.data_len]
    }

    /// Copies a received frame into the session.
    pub(crate) fn store(&mut self, frame: &Frame<'_>) {
        let len = frame.payload.len().min(MAX_PAYLOAD_LEN);
        self.buffer[..len].copy_from_slice(&frame.payload[..len]);
        self.data_len = len;
        self.payload_len = frame.encoded_len() as u8 - 1;
        self.sender_id = frame.sender;
        self.target_id = frame.target;
        self.ack_requested = frame.ack_requested();
        self.ack_received = frame.is_ack();
    }

    /// The last frame wants an acknowledgment. Broadcasts are never
    /// acknowledged.
    pub fn wants_ack(&self) -> bool {
        self.ack_requested && self.target_id != BROADCAST_ADDRESS
    }
}
