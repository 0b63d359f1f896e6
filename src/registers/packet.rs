//! Packet engine register bits
//!
//! Only the bits the driver toggles at runtime are named here; the static
//! packet format (variable length, CRC, sync word) is set by the
//! configuration table in [`config`](crate::config).

/// Packet configuration 2 (address: 0x3D): restart the receiver, discarding
/// the current payload
pub const PACKET2_RX_RESTART: u8 = 0x04;

/// Packet configuration 2 (address: 0x3D): AES encryption enable
pub const PACKET2_AES_ON: u8 = 0x01;

/// Bits of packet configuration 2 kept when requesting an RX restart
pub const PACKET2_RX_RESTART_MASK: u8 = !PACKET2_RX_RESTART;

/// Bits of packet configuration 2 kept when changing the AES enable
pub const PACKET2_AES_MASK: u8 = !PACKET2_AES_ON;

/// Sync value 1 (address: 0x2F): first sync byte, fixed for compatibility
/// with RFM12B based nodes
pub const SYNC_WORD_PREFIX: u8 = 0x2D;
